//! Intent collection: fans a tokenized query out to every trained
//! intent and collects detokenized results.

use std::path::PathBuf;

use crate::entity_manager::EntityManager;
use crate::error::Result;
use crate::intent::Intent;
use crate::match_data::MatchData;
use crate::training_manager::TrainingManager;
use crate::util::tokenize;

#[derive(Debug)]
pub struct IntentManager {
    manager: TrainingManager<Intent>,
}

impl IntentManager {
    pub fn new(cache: PathBuf) -> Self {
        Self {
            manager: TrainingManager::new(cache),
        }
    }

    pub fn add(&mut self, name: &str, lines: &[String]) {
        self.manager.add(name, lines);
    }

    pub fn remove(&mut self, name: &str) {
        self.manager.remove(name);
    }

    pub fn calc_intents(&self, query: &str, entities: &EntityManager) -> Vec<MatchData> {
        let sent = tokenize(query);
        self.manager
            .objects()
            .iter()
            .map(|intent| intent.best_match(sent.clone(), Some(entities)).detokenize())
            .collect()
    }

    pub fn train(&mut self) -> Result<()> {
        self.manager.train()
    }

    pub fn names(&self) -> Vec<&str> {
        self.manager.names()
    }
}
