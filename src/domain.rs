//! Two-level routing: pick a domain first, then match intents inside
//! it. The domain engine is itself an [`IntentContainer`] whose
//! "intents" are domain names trained on the union of their members'
//! samples.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::container::IntentContainer;
use crate::error::Result;
use crate::match_data::MatchData;

pub const DEFAULT_TOP_K_DOMAINS: usize = 2;

pub struct DomainIntentContainer {
    cache_root: PathBuf,
    domain_engine: IntentContainer,
    domains: HashMap<String, IntentContainer>,
    training_data: HashMap<String, Vec<String>>,
    must_train: bool,
}

impl DomainIntentContainer {
    pub fn new(cache_root: impl Into<PathBuf>) -> Result<Self> {
        let cache_root = cache_root.into();
        let domain_engine = IntentContainer::new(cache_root.join("__domains__"))?;
        Ok(Self {
            cache_root,
            domain_engine,
            domains: HashMap::new(),
            training_data: HashMap::new(),
            must_train: true,
        })
    }

    fn get_or_create_domain(&mut self, name: &str) -> Result<&mut IntentContainer> {
        match self.domains.entry(name.to_string()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let container = IntentContainer::new(self.cache_root.join(name))?;
                Ok(slot.insert(container))
            }
        }
    }

    pub fn register_domain_intent(
        &mut self,
        domain: &str,
        intent: &str,
        samples: &[String],
    ) -> Result<()> {
        self.get_or_create_domain(domain)?.add_intent(intent, samples);
        self.training_data
            .entry(domain.to_string())
            .or_default()
            .extend(samples.iter().cloned());
        self.must_train = true;
        Ok(())
    }

    pub fn remove_domain_intent(&mut self, domain: &str, intent: &str) {
        if let Some(container) = self.domains.get_mut(domain) {
            container.remove_intent(intent);
        }
        self.must_train = true;
    }

    pub fn register_domain_entity(
        &mut self,
        domain: &str,
        entity: &str,
        samples: &[String],
    ) -> Result<()> {
        self.get_or_create_domain(domain)?.add_entity(entity, samples)?;
        self.must_train = true;
        Ok(())
    }

    pub fn remove_domain_entity(&mut self, domain: &str, entity: &str) {
        if let Some(container) = self.domains.get_mut(domain) {
            container.remove_entity(entity);
        }
        self.must_train = true;
    }

    pub fn remove_domain(&mut self, domain: &str) {
        self.training_data.remove(domain);
        self.domains.remove(domain);
        self.domain_engine.remove_intent(domain);
        self.must_train = true;
    }

    pub fn domain_names(&self) -> Vec<&str> {
        self.domains.keys().map(String::as_str).collect()
    }

    pub fn train(&mut self) -> Result<()> {
        for (domain, samples) in &self.training_data {
            self.domain_engine.add_intent(domain, samples);
        }
        self.domain_engine.train()?;
        for container in self.domains.values_mut() {
            container.train()?;
        }
        self.must_train = false;
        Ok(())
    }

    fn ensure_trained(&mut self) -> Result<()> {
        if self.must_train {
            self.train()?;
        }
        Ok(())
    }

    /// All domains ranked against `query`.
    pub fn calc_domains(&mut self, query: &str) -> Result<Vec<MatchData>> {
        self.ensure_trained()?;
        self.domain_engine.calc_intents(query)
    }

    /// The best domain for `query`.
    pub fn calc_domain(&mut self, query: &str) -> Result<MatchData> {
        self.ensure_trained()?;
        self.domain_engine.calc_intent(query)
    }

    /// Best intent within `domain`, or within the best-scoring domain
    /// when none is given. An unknown domain yields a null result.
    pub fn calc_intent(&mut self, query: &str, domain: Option<&str>) -> Result<MatchData> {
        self.ensure_trained()?;
        let domain = match domain {
            Some(name) => Some(name.to_string()),
            None => self.domain_engine.calc_intent(query)?.name,
        };
        if let Some(container) = domain.and_then(|name| self.domains.get_mut(&name)) {
            return container.calc_intent(query);
        }
        Ok(MatchData::empty(query))
    }

    /// Ranked intents from `domain`, or from the union of the top-k
    /// domains when none is given.
    pub fn calc_intents(
        &mut self,
        query: &str,
        domain: Option<&str>,
        top_k_domains: usize,
    ) -> Result<Vec<MatchData>> {
        self.ensure_trained()?;
        if let Some(name) = domain {
            return match self.domains.get_mut(name) {
                Some(container) => container.calc_intents(query),
                None => Ok(Vec::new()),
            };
        }

        let ranked_domains = self.domain_engine.calc_intents(query)?;
        let mut matches = Vec::new();
        for domain_match in ranked_domains.into_iter().take(top_k_domains) {
            let Some(name) = domain_match.name else {
                continue;
            };
            if let Some(container) = self.domains.get_mut(&name) {
                matches.extend(container.calc_intents(query)?);
            }
        }
        matches.sort_by(|a, b| b.conf.total_cmp(&a.conf));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_domain_yields_null_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = DomainIntentContainer::new(dir.path()).unwrap();
        router
            .register_domain_intent("IOT", "lights_on", &lines(&["turn on the lights"]))
            .unwrap();
        let result = router.calc_intent("turn on the lights", Some("nope")).unwrap();
        assert_eq!(result.name, None);
        assert_eq!(result.conf, 0.0);
    }

    #[test]
    fn test_remove_domain_forgets_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = DomainIntentContainer::new(dir.path()).unwrap();
        router
            .register_domain_intent("IOT", "lights_on", &lines(&["turn on the lights"]))
            .unwrap();
        router.remove_domain("IOT");
        assert!(router.domain_names().is_empty());
        let result = router.calc_intent("turn on the lights", None).unwrap();
        assert_eq!(result.name, None);
    }
}
