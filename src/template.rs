//! Regex fast path: compiles sample templates into case-insensitive
//! regexes for exact and near-exact matching, independent of the
//! neural path.
//!
//! Templates go through a fixed, ordered sequence of textual rewrites
//! (protect literal parens, escape, unescape the special characters,
//! build alternations, wildcard `:0` and digits, make punctuation
//! optional, elasticize whitespace) and placeholders become named
//! captures. Lines that still fail to compile are logged and dropped;
//! the intent's other lines remain usable.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// A fast-path match: intent name plus extracted entity values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateMatch {
    pub name: String,
    pub entities: HashMap<String, String>,
}

impl TemplateMatch {
    fn extraction_len(&self) -> usize {
        self.entities.values().map(|v| v.len()).sum()
    }
}

#[derive(Default)]
struct State {
    intent_lines: HashMap<String, Vec<String>>,
    entity_lines: HashMap<String, Vec<String>>,
    intents: HashMap<String, Vec<regex::Regex>>,
    entities: HashMap<String, String>,
    must_compile: bool,
    counter: usize,
}

/// Template container. One lock serializes mutation, compilation and
/// matching; matching compiles on demand.
#[derive(Default)]
pub struct RegexIntentContainer {
    state: Mutex<State>,
}

fn rewrite(line: &str, pattern: &str, replacement: &str) -> String {
    if let Ok(re) = fancy_regex::Regex::new(pattern) {
        re.replace_all(line, replacement).into_owned()
    } else {
        line.to_string()
    }
}

/// The ordered rewrite pipeline turning one template line into a regex
/// fragment.
fn create_pattern(line: &str) -> String {
    // Protect literal (…) groups that hold no alternation
    let line = rewrite(line, r"\(([^|)]*)\)", "{~(${1})~}");
    // Escape everything non-word
    let line = rewrite(&line, r"(\W)", "\\${1}");
    // Wrap with sentinel spaces
    let line = format!(" {line} ");
    // Unescape the characters later steps treat specially
    let line = rewrite(&line, r"\\ ", " ");
    let line = rewrite(&line, r"\\\{", "{");
    let line = rewrite(&line, r"\\\}", "}");
    let line = rewrite(&line, r"\\#", "#");
    // Alternations become groups; protected literals are restored.
    // The protection markers lost their brace escapes in the unescape
    // step above, so they read `{\~` and `\~}` here.
    let line = rewrite(&line, r"(?<!\{\\~)\\\(", "(?:");
    let line = rewrite(&line, r"\\\)(?!\\~\})", ")");
    let line = rewrite(&line, r"\{\\~\\\(", "\\(");
    let line = rewrite(&line, r"\\\)\\~\}", "\\)");
    let line = rewrite(&line, r"\\\|", "|");
    // A standalone :0 matches any word; digits match any digit
    let line = rewrite(&line, r"(?<=\s)\\:0(?=\s)", "\\w+");
    let line = rewrite(&line, r"#", "\\d");
    let line = rewrite(&line, r"\d", "\\d");
    // Space out word/non-word boundaries so both get separated
    let line = rewrite(&line, r"(?<!\\)(\w)([^\w\s}])", "${1} ${2}");
    let line = rewrite(&line, r"([^\\\w\s{])(\w)", "${1} ${2}");
    // Any single escaped symbol is optional
    let line = rewrite(&line, r"(\\[^\w ])", "${1}?");
    // Whitespace: required between words, elastic everywhere else
    let line = rewrite(&line, r"(?<=(\w|\}))(\\\s|\s)+(?=\S)", "\\W+");
    rewrite(&line, r"\s+", "\\W*")
}

impl State {
    fn create_intent_pattern(
        entities: &HashMap<String, String>,
        counter: &mut usize,
        line: &str,
        intent_name: &str,
    ) -> String {
        let namespace = format!(
            "{}:",
            intent_name.split(':').next().unwrap_or(intent_name)
        );
        let mut line = create_pattern(line);

        // key -> (capture name, body); entity definitions override the
        // generic wildcard for the same placeholder.
        let mut keys: Vec<String> = Vec::new();
        let mut replacements: HashMap<String, (String, String)> = HashMap::new();
        if let Ok(re) = regex::Regex::new(r"\{([a-z_:]+)\}") {
            let mut seen = HashSet::new();
            for cap in re.captures_iter(&line) {
                if let Some(name) = cap.get(1) {
                    let name = name.as_str().to_string();
                    if seen.insert(name.clone()) {
                        let capture = name.replace(':', "__colon__");
                        replacements.insert(name.clone(), (capture, ".*?\\w.*?".to_string()));
                        keys.push(name);
                    }
                }
            }
        }
        for (ent_name, ent_body) in entities {
            let (key, capture) = match ent_name.strip_prefix(&namespace) {
                Some(local) => (local.to_string(), local.replace(':', "__colon__")),
                None => (ent_name.clone(), ent_name.replace(':', "__colon__")),
            };
            if replacements
                .insert(key.clone(), (capture, ent_body.clone()))
                .is_none()
            {
                keys.push(key);
            }
        }

        // Two passes so a placeholder introduced by an entity body is
        // itself resolved.
        for _ in 0..2 {
            for key in &keys {
                let target = format!("{{{key}}}");
                if let Some((capture, body)) = replacements.get(key) {
                    if line.contains(&target) {
                        let group = format!("(?P<{capture}__{counter}>{body})");
                        line = line.replacen(&target, &group, 1);
                        *counter += 1;
                    }
                }
            }
        }

        // Anything still unresolved matches like a bare placeholder but
        // captures nothing.
        if let Ok(re) = regex::Regex::new(r"\{[a-z_:]+\}") {
            line = re.replace_all(&line, "(?:.*?\\w.*?)").into_owned();
        }

        format!("^{line}$")
    }

    fn compile(&mut self) {
        let entities: HashMap<String, String> = self
            .entity_lines
            .iter()
            .map(|(name, lines)| {
                let body = lines
                    .iter()
                    .filter(|line| !line.trim().is_empty())
                    .map(|line| create_pattern(line))
                    .collect::<Vec<_>>()
                    .join("|");
                (name.clone(), format!("({body})"))
            })
            .collect();

        let mut counter = self.counter;
        let mut intents: HashMap<String, Vec<regex::Regex>> = HashMap::new();
        for (intent_name, lines) in &self.intent_lines {
            // Longest templates first, so the most specific wins ties
            let mut sorted: Vec<&String> = lines.iter().filter(|l| !l.trim().is_empty()).collect();
            sorted.sort_by_key(|l| std::cmp::Reverse(l.len()));

            let mut regexes = Vec::new();
            for line in sorted {
                let pattern =
                    Self::create_intent_pattern(&entities, &mut counter, line, intent_name);
                match regex::RegexBuilder::new(&pattern).case_insensitive(true).build() {
                    Ok(re) => regexes.push(re),
                    Err(err) => {
                        log::warn!("dropping template {line:?} for {intent_name}: {err}");
                    }
                }
            }
            intents.insert(intent_name.clone(), regexes);
        }

        self.entities = entities;
        self.intents = intents;
        self.counter = counter;
        self.must_compile = false;
    }
}

fn extract_entities(re: &regex::Regex, caps: &regex::Captures) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for cap_name in re.capture_names().flatten() {
        if let Some(found) = caps.name(cap_name) {
            if found.as_str().is_empty() {
                continue;
            }
            let base = cap_name
                .rsplit_once("__")
                .map(|(base, _)| base)
                .unwrap_or(cap_name);
            out.insert(
                base.replace("__colon__", ":"),
                found.as_str().trim().to_string(),
            );
        }
    }
    out
}

impl RegexIntentContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intent(&self, name: &str, lines: &[String]) {
        let mut state = self.state.lock();
        state.must_compile = true;
        state.intent_lines.insert(name.to_string(), lines.to_vec());
    }

    pub fn remove_intent(&self, name: &str) {
        let mut state = self.state.lock();
        state.must_compile = true;
        state.intent_lines.remove(name);
    }

    pub fn add_entity(&self, name: &str, lines: &[String]) {
        let mut state = self.state.lock();
        state.must_compile = true;
        state.entity_lines.insert(name.to_string(), lines.to_vec());
    }

    pub fn remove_entity(&self, name: &str) {
        let mut state = self.state.lock();
        state.must_compile = true;
        state.entity_lines.remove(name);
    }

    pub fn compile(&self) {
        self.state.lock().compile();
    }

    /// Every intent with at least one matching template. Per intent,
    /// the entity set with the least extracted text wins.
    pub fn calc_intents(&self, query: &str) -> Vec<TemplateMatch> {
        let mut state = self.state.lock();
        if state.must_compile {
            state.compile();
        }
        let padded = format!(" {query} ");

        let mut results = Vec::new();
        for (name, regexes) in &state.intents {
            let best = regexes
                .iter()
                .filter_map(|re| re.captures(&padded).map(|caps| extract_entities(re, &caps)))
                .min_by_key(|entities| entities.values().map(|v| v.len()).sum::<usize>());
            if let Some(entities) = best {
                results.push(TemplateMatch {
                    name: name.clone(),
                    entities,
                });
            }
        }
        results
    }

    /// The match whose extracted values sum to the least text, i.e. the
    /// one explaining the most of the query literally.
    pub fn calc_intent(&self, query: &str) -> Option<TemplateMatch> {
        self.calc_intents(query)
            .into_iter()
            .min_by_key(TemplateMatch::extraction_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    fn entities_of(container: &RegexIntentContainer, query: &str) -> HashMap<String, String> {
        container
            .calc_intent(query)
            .map(|m| m.entities)
            .unwrap_or_default()
    }

    #[test]
    fn test_literal_template_with_placeholder() {
        let container = RegexIntentContainer::new();
        container.add_intent("greet", &lines(&["hello {name}"]));
        let result = container.calc_intent("hello world").unwrap();
        assert_eq!(result.name, "greet");
        assert_eq!(result.entities["name"], "world");
    }

    #[test]
    fn test_case_insensitive_and_trailing_punctuation() {
        let container = RegexIntentContainer::new();
        container.add_intent("lights_off", &lines(&["turn off the lights"]));
        assert!(container.calc_intent("Turn OFF the lights!").is_some());
        assert!(container.calc_intent("turn off the lamp").is_none());
    }

    #[test]
    fn test_alternation_group() {
        let container = RegexIntentContainer::new();
        container.add_intent("greet", &lines(&["(hi|hello) there"]));
        assert!(container.calc_intent("hi there").is_some());
        assert!(container.calc_intent("hello there").is_some());
        assert!(container.calc_intent("hey there").is_none());
    }

    #[test]
    fn test_literal_parentheses_preserved() {
        let container = RegexIntentContainer::new();
        container.add_intent("song", &lines(&["call me (maybe)"]));
        assert!(container.calc_intent("call me (maybe)").is_some());
        // punctuation is optional, so the bare words match too
        assert!(container.calc_intent("call me maybe").is_some());
    }

    #[test]
    fn test_empty_alternative_makes_group_optional() {
        let container = RegexIntentContainer::new();
        container.add_intent("stop", &lines(&["(please |)stop the music"]));
        assert!(container.calc_intent("stop the music").is_some());
        assert!(container.calc_intent("please stop the music").is_some());
    }

    #[test]
    fn test_digit_wildcards() {
        let container = RegexIntentContainer::new();
        container.add_intent("wait", &lines(&["wait # seconds"]));
        assert!(container.calc_intent("wait 5 seconds").is_some());
        assert!(container.calc_intent("wait ten seconds").is_none());
    }

    #[test]
    fn test_word_wildcard() {
        let container = RegexIntentContainer::new();
        container.add_intent("call", &lines(&["call :0 now"]));
        assert!(container.calc_intent("call bob now").is_some());
        assert!(container.calc_intent("call now").is_none());
    }

    #[test]
    fn test_entity_restricts_values() {
        let container = RegexIntentContainer::new();
        container.add_intent("paint", &lines(&["paint it {color}"]));
        container.add_entity("color", &lines(&["red", "blue"]));
        assert_eq!(entities_of(&container, "paint it red")["color"], "red");
        assert!(container.calc_intent("paint it greenish").is_none());
    }

    #[test]
    fn test_entity_with_inner_placeholder() {
        let container = RegexIntentContainer::new();
        container.add_intent("timer", &lines(&["set timer for {duration}"]));
        container.add_entity("duration", &lines(&["{number} (minutes|seconds)"]));
        let result = container.calc_intent("set timer for 5 minutes").unwrap();
        assert_eq!(result.name, "timer");
        assert_eq!(result.entities["duration"], "5 minutes");
    }

    #[test]
    fn test_bad_line_dropped_others_survive() {
        let container = RegexIntentContainer::new();
        container.add_intent("mixed", &lines(&["hello (world", "goodbye"]));
        assert!(container.calc_intent("goodbye").is_some());
    }

    #[test]
    fn test_remove_intent() {
        let container = RegexIntentContainer::new();
        container.add_intent("greet", &lines(&["hello"]));
        container.remove_intent("greet");
        assert!(container.calc_intent("hello").is_none());
    }

    #[test]
    fn test_tightest_match_wins() {
        let container = RegexIntentContainer::new();
        container.add_intent("exact", &lines(&["play some jazz"]));
        container.add_intent("loose", &lines(&["play {query}"]));
        let result = container.calc_intent("play some jazz").unwrap();
        assert_eq!(result.name, "exact");
    }
}
