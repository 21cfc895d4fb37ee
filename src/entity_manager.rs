//! Entity lookup with skill-scoped resolution.

use std::path::PathBuf;

use crate::entity::Entity;
use crate::error::Result;
use crate::training_manager::TrainingManager;

#[derive(Debug)]
pub struct EntityManager {
    manager: TrainingManager<Entity>,
}

impl EntityManager {
    pub fn new(cache: PathBuf) -> Self {
        Self {
            manager: TrainingManager::new(cache),
        }
    }

    /// Register an already-wrapped entity name (`{place}` or
    /// `Skill:{place}`).
    pub fn add(&mut self, wrapped_name: &str, lines: &[String]) {
        self.manager.add(wrapped_name, lines);
    }

    pub fn remove(&mut self, name: &str) {
        self.manager.remove(&Entity::wrap_name(name));
    }

    /// Resolve `token` (like `{place}`) for an intent: a skill-scoped
    /// entity wins over a global one of the same name.
    pub fn find(&self, intent_name: &str, token: &str) -> Option<&Entity> {
        if let Some((skill, _)) = intent_name.split_once(':') {
            let scoped = format!("{skill}:{token}");
            if let Some(entity) = self.manager.find(&scoped) {
                return Some(entity);
            }
        }
        self.manager.find(token)
    }

    pub fn train(&mut self) -> Result<()> {
        self.manager.train()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scoped_beats_global() {
        let dir = tempfile::tempdir().unwrap();
        let mut entities = EntityManager::new(dir.path().into());
        entities.add("{place}", &lines(&["paris", "london"]));
        entities.add("WeatherSkill:{place}", &lines(&["tokyo", "osaka"]));
        entities.train().unwrap();

        let scoped = entities.find("WeatherSkill:weather", "{place}").unwrap();
        assert!(scoped.eval(&["tokyo".to_string()]) > 0.5);

        let global = entities.find("OtherSkill:other", "{place}").unwrap();
        assert!(global.eval(&["paris".to_string()]) > 0.5);

        assert!(entities.find("anything", "{nope}").is_none());
    }

    #[test]
    fn test_remove_wraps_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut entities = EntityManager::new(dir.path().into());
        entities.add("{place}", &lines(&["paris"]));
        entities.remove("place");
        entities.train().unwrap();
        assert!(entities.find("weather", "{place}").is_none());
    }
}
