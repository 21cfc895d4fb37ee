//! Full intent: one sentence classifier plus one span extractor per
//! placeholder found in the training sentences.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::entity_manager::EntityManager;
use crate::error::{Error, Result};
use crate::match_data::Candidate;
use crate::pos_intent::PosIntent;
use crate::simple_intent::SimpleIntent;
use crate::train_data::TrainData;
use crate::trainable::{SourceHash, Trainable};

#[derive(Debug, Clone)]
pub struct Intent {
    name: String,
    hash: SourceHash,
    simple: SimpleIntent,
    pos_intents: Vec<PosIntent>,
}

impl Intent {
    /// Best extraction of this intent from `sent`.
    ///
    /// Every PosIntent expands the candidate list over the already
    /// substituted sentences of earlier ones; the unextracted prior is
    /// kept so slots may stay unfilled. The final confidence is the
    /// geometric mean of slot-extraction quality and the sentence-level
    /// classifier score.
    pub(crate) fn best_match(
        &self,
        sent: Vec<String>,
        entities: Option<&EntityManager>,
    ) -> Candidate {
        let mut possible = vec![Candidate::new(&self.name, sent)];
        for pos_intent in &self.pos_intents {
            let entity = entities.and_then(|e| e.find(&self.name, pos_intent.token()));
            let mut expanded = Vec::new();
            for candidate in &possible {
                expanded.extend(pos_intent.propose(candidate, entity));
            }
            possible.extend(expanded);
        }

        possible.retain(|c| c.conf >= 0.0);

        for candidate in &mut possible {
            let pos_score = if candidate.matches.is_empty() {
                0.5
            } else {
                candidate.conf / candidate.matches.len() as f32 + 0.5
            };
            candidate.conf = (pos_score * self.simple.eval(&candidate.sent)).sqrt();
        }

        possible
            .into_iter()
            .max_by(|a, b| a.conf.total_cmp(&b.conf))
            .unwrap_or_else(|| Candidate::new(&self.name, Vec::new()))
    }

    fn pos_file(cache: &Path, name: &str) -> String {
        format!("{}.pos", cache.join(name).to_string_lossy())
    }
}

impl Trainable for Intent {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_hash(&self) -> SourceHash {
        self.hash
    }

    fn create(name: &str, hash: SourceHash) -> Self {
        Self {
            name: name.to_string(),
            hash,
            simple: SimpleIntent::new(name),
            pos_intents: Vec::new(),
        }
    }

    fn from_file(name: &str, hash: SourceHash, cache: &Path) -> Result<Self> {
        let prefix = cache.join(name).to_string_lossy().to_string();
        let simple = SimpleIntent::from_file(name, &prefix)?;

        let pos_path = Self::pos_file(cache, name);
        let raw = fs::read_to_string(&pos_path)
            .map_err(|_| Error::MissingArtifact(pos_path.clone().into()))?;
        let tokens: Vec<String> =
            serde_json::from_str(&raw).map_err(|_| Error::MissingArtifact(pos_path.clone().into()))?;

        let pos_intents = tokens
            .iter()
            .map(|token| PosIntent::from_file(&pos_path, token, name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.to_string(),
            hash,
            simple,
            pos_intents,
        })
    }

    fn train(&mut self, data: &TrainData) {
        // One extractor per distinct placeholder, in discovery order.
        let mut seen = HashSet::new();
        let mut tokens = Vec::new();
        for sent in data.my_sents(&self.name) {
            for token in sent {
                if token.starts_with('{') && seen.insert(token.clone()) {
                    tokens.push(token.clone());
                }
            }
        }
        self.pos_intents = tokens
            .iter()
            .map(|token| PosIntent::new(token, &self.name))
            .collect();

        for pos_intent in &mut self.pos_intents {
            pos_intent.train(data);
        }
        self.simple.train(data);
    }

    fn save(&self, cache: &Path) -> Result<()> {
        let prefix = cache.join(&self.name).to_string_lossy().to_string();
        self.simple.save(&prefix)?;

        let pos_path = Self::pos_file(cache, &self.name);
        let tokens: Vec<&str> = self.pos_intents.iter().map(|p| p.token()).collect();
        fs::write(&pos_path, serde_json::to_string(&tokens)?)?;

        for pos_intent in &self.pos_intents {
            pos_intent.save(&pos_path)?;
        }
        Ok(())
    }
}
