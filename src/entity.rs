//! Entity classifier: scores whether an extracted span belongs to an
//! entity class. Behaviorally a [`SimpleIntent`] with its own source
//! hash and artifact prefix.

use std::path::Path;

use crate::error::{Error, Result};
use crate::simple_intent::SimpleIntent;
use crate::train_data::TrainData;
use crate::trainable::{SourceHash, Trainable};

#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    hash: SourceHash,
    simple: SimpleIntent,
}

impl Entity {
    /// Entity names are registered bare; `{}` wrapping is internal.
    pub fn verify_name(name: &str) -> Result<()> {
        if name.starts_with('{') || name.ends_with('}') {
            return Err(Error::InvalidEntityName(name.to_string()));
        }
        Ok(())
    }

    /// `place` becomes the global `{place}`; `Skill:place` becomes the
    /// scoped `Skill:{place}`.
    pub fn wrap_name(name: &str) -> String {
        match name.split_once(':') {
            Some((skill, entity)) => format!("{skill}:{{{entity}}}"),
            None => format!("{{{name}}}"),
        }
    }

    /// Confidence in [0, 1] that `span` is a value of this entity.
    pub fn eval(&self, span: &[String]) -> f32 {
        self.simple.eval(span)
    }
}

impl Trainable for Entity {
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
        }
    }

    fn from_file(name: &str, hash: SourceHash, cache: &Path) -> Result<Self> {
        let prefix = cache.join(name).to_string_lossy().to_string();
        Ok(Self {
            name: name.to_string(),
            hash,
            simple: SimpleIntent::load_as(name, &prefix, "entity")?,
        })
    }

    fn train(&mut self, data: &TrainData) {
        self.simple.train(data);
    }

    fn save(&self, cache: &Path) -> Result<()> {
        let prefix = cache.join(&self.name).to_string_lossy().to_string();
        self.simple.save_as(&prefix, "entity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_name() {
        assert_eq!(Entity::wrap_name("place"), "{place}");
        assert_eq!(Entity::wrap_name("WeatherSkill:place"), "WeatherSkill:{place}");
    }

    #[test]
    fn test_verify_name_rejects_braces() {
        assert!(Entity::verify_name("place").is_ok());
        assert!(Entity::verify_name("{place}").is_err());
        assert!(Entity::verify_name("place}").is_err());
    }

    #[test]
    fn test_scores_known_values() {
        let mut data = TrainData::new();
        let lines: Vec<String> = ["paris", "london", "tokyo"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        data.add_lines("{place}", &lines);
        let mut entity = Entity::create("{place}", [0; 4]);
        entity.train(&data);

        assert!(entity.eval(&["london".to_string()]) > 0.8);
        assert!(entity.eval(&["qwzx".to_string()]) < 0.5);
    }
}
