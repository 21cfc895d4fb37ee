// intentctl - Headless CLI for the parlance intent parser
// Run: echo "weather in paris" | cargo run --bin intentctl -- --data samples match
// Or:  cargo run --bin intentctl -- --data samples match --input "hello there"

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parlance::IntentContainer;

#[derive(Parser)]
#[command(name = "intentctl", about = "Train and query parlance intent models")]
struct Cli {
    /// Directory of <name>.intent and <name>.entity sample files
    #[arg(long)]
    data: PathBuf,

    /// Cache directory for trained artifacts (defaults to the user
    /// cache dir)
    #[arg(long)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train or refresh every model from the sample files
    Train,
    /// Match a query (or stdin lines) and print JSON results
    Match {
        /// Query text; stdin lines are matched when omitted
        #[arg(long)]
        input: Option<String>,
        /// Print every intent's score instead of only the best
        #[arg(long)]
        all: bool,
    },
}

fn default_cache() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parlance")
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

fn load_samples(container: &mut IntentContainer, data: &Path) -> Result<usize> {
    let mut registered = 0;
    for entry in fs::read_dir(data).with_context(|| format!("listing {}", data.display()))? {
        let path = entry?.path();
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };
        match ext {
            "intent" => {
                container.add_intent(stem, &read_lines(&path)?);
                registered += 1;
            }
            "entity" => {
                container.add_entity(stem, &read_lines(&path)?)?;
                registered += 1;
            }
            _ => {}
        }
    }
    Ok(registered)
}

fn run_query(container: &mut IntentContainer, query: &str, all: bool) -> Result<()> {
    if all {
        let matches = container.calc_intents(query)?;
        println!("{}", serde_json::to_string(&matches)?);
    } else {
        let best = container.calc_intent(query)?;
        println!("{}", serde_json::to_string(&best)?);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cache = cli.cache.unwrap_or_else(default_cache);
    let mut container = IntentContainer::new(&cache)?;
    let registered = load_samples(&mut container, &cli.data)?;
    log::info!("registered {registered} objects from {}", cli.data.display());

    match cli.command {
        Command::Train => {
            container.train()?;
            println!("trained {} intents into {}", container.intent_names().len(), cache.display());
        }
        Command::Match { input, all } => match input {
            Some(query) => run_query(&mut container, &query, all)?,
            None => {
                for line in io::stdin().lock().lines() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    run_query(&mut container, &line, all)?;
                }
            }
        },
    }
    Ok(())
}
