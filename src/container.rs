//! Public facade over the neural path: register intents and entities,
//! train, and match queries.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use lru::LruCache;

use crate::entity::Entity;
use crate::entity_manager::EntityManager;
use crate::error::Result;
use crate::intent_manager::IntentManager;
use crate::match_data::MatchData;
use crate::util::tokenize;

const MATCH_CACHE_SIZE: usize = 128;

/// Trains compact per-intent classifiers and returns ranked matches
/// with extracted slot values. All mutation marks the container dirty;
/// the next `train()` (or the next calc, which trains on demand)
/// brings it clean again.
pub struct IntentContainer {
    cache_dir: PathBuf,
    intents: IntentManager,
    entities: EntityManager,
    match_cache: LruCache<String, Vec<MatchData>>,
    must_train: bool,
}

impl IntentContainer {
    /// `cache_dir` receives every trained artifact; it is created if
    /// absent.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            intents: IntentManager::new(cache_dir.clone()),
            entities: EntityManager::new(cache_dir.clone()),
            cache_dir,
            match_cache: LruCache::new(
                NonZeroUsize::new(MATCH_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
            ),
            must_train: true,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn mark_dirty(&mut self) {
        self.must_train = true;
        self.match_cache.clear();
    }

    pub fn add_intent(&mut self, name: &str, samples: &[String]) {
        self.intents.add(name, samples);
        self.mark_dirty();
    }

    pub fn remove_intent(&mut self, name: &str) {
        self.intents.remove(name);
        self.mark_dirty();
    }

    /// Register entity samples under a bare name (`place`) or a
    /// skill-scoped one (`WeatherSkill:place`).
    pub fn add_entity(&mut self, name: &str, samples: &[String]) -> Result<()> {
        Entity::verify_name(name)?;
        self.entities.add(&Entity::wrap_name(name), samples);
        self.mark_dirty();
        Ok(())
    }

    pub fn remove_entity(&mut self, name: &str) {
        self.entities.remove(name);
        self.mark_dirty();
    }

    /// Retrain whatever changed since the last pass. Idempotent and
    /// cheap when nothing did.
    pub fn train(&mut self) -> Result<()> {
        self.entities.train()?;
        self.intents.train()?;
        self.match_cache.clear();
        self.must_train = false;
        Ok(())
    }

    pub fn must_train(&self) -> bool {
        self.must_train
    }

    pub fn intent_names(&self) -> Vec<&str> {
        self.intents.names()
    }

    /// Every intent's best match for `query`, sorted by confidence
    /// descending. Trains first if dirty.
    pub fn calc_intents(&mut self, query: &str) -> Result<Vec<MatchData>> {
        if self.must_train {
            self.train()?;
        }
        if let Some(hit) = self.match_cache.get(query) {
            return Ok(hit.clone());
        }
        if tokenize(query).is_empty() {
            return Ok(Vec::new());
        }
        let mut matches = self.intents.calc_intents(query, &self.entities);
        matches.sort_by(|a, b| b.conf.total_cmp(&a.conf));
        self.match_cache.put(query.to_string(), matches.clone());
        Ok(matches)
    }

    /// The single best match; confidence ties go to the candidate with
    /// the least extracted text. A query nothing matches yields a null
    /// result (`name == None`, `conf == 0`).
    pub fn calc_intent(&mut self, query: &str) -> Result<MatchData> {
        let matches = self.calc_intents(query)?;
        Ok(matches
            .into_iter()
            .max_by(|a, b| {
                a.conf
                    .total_cmp(&b.conf)
                    .then_with(|| b.total_match_len().cmp(&a.total_match_len()))
            })
            .unwrap_or_else(|| MatchData::empty(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_yields_null_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut container = IntentContainer::new(dir.path()).unwrap();
        container.add_intent("greet", &lines(&["hello"]));
        let result = container.calc_intent("").unwrap();
        assert_eq!(result.name, None);
        assert_eq!(result.conf, 0.0);
    }

    #[test]
    fn test_add_entity_rejects_braced_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut container = IntentContainer::new(dir.path()).unwrap();
        assert!(container.add_entity("{place}", &lines(&["paris"])).is_err());
    }

    #[test]
    fn test_train_clears_dirty_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut container = IntentContainer::new(dir.path()).unwrap();
        container.add_intent("greet", &lines(&["hello"]));
        assert!(container.must_train());
        container.train().unwrap();
        assert!(!container.must_train());
        container.remove_intent("greet");
        assert!(container.must_train());
    }
}
