//! Boundary classifier for one side of a placeholder.
//!
//! Each edge scores how strongly a sentence position looks like the
//! left (-1) or right (+1) end of the placeholder's span, from a window
//! of up to four tokens on either side.

use crate::error::{Error, Result};
use crate::id_manager::IdManager;
use crate::nn::{TinyNet, TrainSet};
use crate::simple_intent::{HIDDEN_UNITS, TRAIN_EPOCHS, TRAIN_RESTARTS};
use crate::train_data::TrainData;
use crate::util::resolve_conflicts;

const WINDOW: i32 = 4;
/// Feature token for window positions that fall outside the sentence.
const BOUNDARY: &str = ":end";

#[derive(Debug, Clone)]
pub struct EntityEdge {
    direction: i32,
    token: String,
    intent_name: String,
    ids: IdManager,
    net: Option<TinyNet>,
}

/// Ids are banded by window offset, so the same word activates
/// different features at different distances from the candidate
/// position.
fn band_key(offset: i32, token: &str) -> String {
    format!("{offset}|{}", IdManager::adj_token(token))
}

impl EntityEdge {
    pub fn new(direction: i32, token: &str, intent_name: &str) -> Self {
        debug_assert!(direction == -1 || direction == 1);
        Self {
            direction,
            token: token.to_string(),
            intent_name: intent_name.to_string(),
            ids: IdManager::new(),
            net: None,
        }
    }

    fn offsets() -> impl Iterator<Item = i32> {
        (-WINDOW..=WINDOW).filter(|k| *k != 0)
    }

    fn register(&mut self, sent: &[String], pos: usize) {
        for k in Self::offsets() {
            let i = pos as i32 + k;
            if i >= 0 && (i as usize) < sent.len() {
                self.ids.add_token(&band_key(k, &sent[i as usize]));
            } else {
                self.ids.add_token(&band_key(k, BOUNDARY));
            }
        }
    }

    fn vectorize(&self, sent: &[String], pos: usize) -> Vec<f32> {
        let mut vector = self.ids.vector();
        for k in Self::offsets() {
            let i = pos as i32 + k;
            let key = if i >= 0 && (i as usize) < sent.len() {
                band_key(k, &sent[i as usize])
            } else {
                band_key(k, BOUNDARY)
            };
            self.ids.assign(&mut vector, &key, 1.0);
        }
        vector
    }

    /// Confidence in [0, 1] that `pos` is this edge of the span.
    pub fn eval(&self, sent: &[String], pos: usize) -> f32 {
        match &self.net {
            Some(net) => net.run(&self.vectorize(sent, pos))[0].max(0.0),
            None => 0.0,
        }
    }

    pub fn train(&mut self, data: &TrainData) {
        let my_sents: Vec<Vec<String>> = data.my_sents(&self.intent_name).cloned().collect();
        for sent in &my_sents {
            for pos in 0..sent.len() {
                self.register(sent, pos);
            }
        }

        let mut inputs: Vec<Vec<f32>> = Vec::new();
        let mut outputs: Vec<Vec<f32>> = Vec::new();

        for sent in &my_sents {
            for pos in 0..sent.len() {
                let target = if sent[pos] == self.token { 1.0 } else { 0.0 };
                inputs.push(self.vectorize(sent, pos));
                outputs.push(vec![target]);
            }
        }
        for sent in data.other_sents(&self.intent_name) {
            for pos in 0..sent.len() {
                inputs.push(self.vectorize(sent, pos));
                outputs.push(vec![0.0]);
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
    }

    fn prefix(&self, prefix: &str) -> String {
        let tag = if self.direction > 0 { "+1" } else { "-1" };
        format!("{prefix}.edge.{tag}")
    }

    pub fn save(&self, prefix: &str) -> Result<()> {
        let prefix = self.prefix(prefix);
        let net = self
            .net
            .as_ref()
            .ok_or_else(|| Error::MissingArtifact(format!("{prefix}.net").into()))?;
        net.save(std::path::Path::new(&format!("{prefix}.net")))?;
        self.ids.save(&prefix)
    }

    pub fn load(&mut self, prefix: &str) -> Result<()> {
        let prefix = self.prefix(prefix);
        let net = TinyNet::load(std::path::Path::new(&format!("{prefix}.net")))?;
        let ids = IdManager::load(&prefix)?;
        if net.input_len() != ids.len() {
            return Err(Error::MissingArtifact(format!("{prefix}.net").into()));
        }
        self.net = Some(net);
        self.ids = ids;
        Ok(())
    }
}
