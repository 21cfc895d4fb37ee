//! Bag-of-token sentence classifier.
//!
//! One net per intent, trained against every sibling's sentences as
//! negatives. The input vector is the intent's own token vocabulary
//! plus a handful of engineered features (unknown-token ratio, length
//! buckets).

use crate::error::{Error, Result};
use crate::id_manager::{IdManager, SENTENCE_IDS};
use crate::nn::{TinyNet, TrainSet};
use crate::train_data::TrainData;
use crate::util::resolve_conflicts;

/// Target for sentences polluted with leading/trailing filler.
const LENIENCE: f32 = 0.6;
const NULL_TOKEN: &str = ":null:";

pub(crate) const HIDDEN_UNITS: usize = 10;
pub(crate) const TRAIN_EPOCHS: usize = 1000;
pub(crate) const TRAIN_RESTARTS: usize = 10;

#[derive(Debug, Clone)]
pub struct SimpleIntent {
    name: String,
    ids: IdManager,
    net: Option<TinyNet>,
}

impl SimpleIntent {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ids: IdManager::with_reserved(&SENTENCE_IDS),
            net: None,
        }
    }

    /// Confidence in [0, 1] that `sent` belongs to this intent.
    pub fn eval(&self, sent: &[String]) -> f32 {
        match &self.net {
            Some(net) => net.run(&self.vectorize(sent))[0].max(0.0),
            None => 0.0,
        }
    }

    fn vectorize(&self, sent: &[String]) -> Vec<f32> {
        let mut vector = self.ids.vector();
        let mut unknown = 0usize;
        for token in sent {
            if self.ids.contains(token) {
                self.ids.assign(&mut vector, token, 1.0);
            } else {
                unknown += 1;
            }
        }
        if !sent.is_empty() {
            let len = sent.len() as f32;
            self.ids.assign(&mut vector, ":0", unknown as f32 / len);
            self.ids.assign(&mut vector, ":1", len);
            self.ids.assign(&mut vector, ":2", len / 2.0);
            self.ids.assign(&mut vector, ":3", len / 3.0);
            self.ids.assign(&mut vector, ":4", len / 4.0);
        }
        vector
    }

    pub fn train(&mut self, data: &TrainData) {
        // Register the vocabulary first so the input width is stable
        // before any vector is built.
        let my_sents: Vec<Vec<String>> = data.my_sents(&self.name).cloned().collect();
        for sent in &my_sents {
            self.ids.add_sent(sent);
        }

        let mut inputs: Vec<Vec<f32>> = Vec::new();
        let mut outputs: Vec<Vec<f32>> = Vec::new();
        let mut add = |this: &Self, tokens: &[String], target: f32| {
            inputs.push(this.vectorize(tokens));
            outputs.push(vec![target]);
        };

        for sent in &my_sents {
            add(self, sent, 1.0);

            // Single-word examples teach the net to credit long content
            // words; placeholders carry no weight of their own.
            let total: f32 = sent
                .iter()
                .map(|w| (w.chars().count() as f32).powi(3))
                .sum();
            for word in sent {
                let weight = if word.starts_with('{') {
                    0.0
                } else {
                    (word.chars().count() as f32).powi(3) / total
                };
                add(self, std::slice::from_ref(word), weight);
            }

            // Sentences that already use sentinel-style tokens opt out
            // of pollution.
            if !sent.iter().any(|w| w.starts_with(':') && w.as_str() != ":") {
                for position in [0, sent.len()] {
                    let mut polluted = sent.clone();
                    for _ in 0..(sent.len() + 2) / 3 {
                        polluted.insert(position, NULL_TOKEN.to_string());
                    }
                    add(self, &polluted, LENIENCE);
                }
            }
        }

        for sent in data.other_sents(&self.name) {
            add(self, sent, 0.0);
        }
        add(self, &[NULL_TOKEN.to_string()], 0.0);
        add(self, &[], 0.0);

        // The carrier sentence stripped of its slot content must not
        // fire.
        for sent in &my_sents {
            let stripped: Vec<String> = sent
                .iter()
                .map(|token| {
                    if token.starts_with('{') {
                        NULL_TOKEN.to_string()
                    } else {
                        token.clone()
                    }
                })
                .collect();
            if stripped != *sent {
                add(self, &stripped, 0.0);
            }
        }

        let (inputs, targets) = resolve_conflicts(inputs, outputs);
        let set = TrainSet { inputs, targets };
        let layers = [self.ids.len(), HIDDEN_UNITS, 1];
        self.net = Some(TinyNet::train_with_restarts(
            &layers,
            &set,
            TRAIN_RESTARTS,
            TRAIN_EPOCHS,
        ));
        log::debug!("trained intent classifier for {}", self.name);
    }

    pub(crate) fn save_as(&self, prefix: &str, kind: &str) -> Result<()> {
        let prefix = format!("{prefix}.{kind}");
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| Error::MissingArtifact(format!("{prefix}.net").into()))?;
        net.save(std::path::Path::new(&format!("{prefix}.net")))?;
        self.ids.save(&prefix)
    }

    pub(crate) fn load_as(name: &str, prefix: &str, kind: &str) -> Result<Self> {
        let prefix = format!("{prefix}.{kind}");
        let net = TinyNet::load(std::path::Path::new(&format!("{prefix}.net")))?;
        let ids = IdManager::load(&prefix)?;
        // The two artifacts must describe the same input width
        if net.input_len() != ids.len() {
            return Err(Error::MissingArtifact(format!("{prefix}.net").into()));
        }
        Ok(Self {
            name: name.to_string(),
            ids,
            net: Some(net),
        })
    }

    pub fn save(&self, prefix: &str) -> Result<()> {
        self.save_as(prefix, "intent")
    }

    pub fn from_file(name: &str, prefix: &str) -> Result<Self> {
        Self::load_as(name, prefix, "intent")
    }
}
