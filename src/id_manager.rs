//! Token to dense-index mapping backing every classifier's input layer.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Sentinel ids registered for every sentence-level classifier.
/// `:0` carries the unknown-token ratio, `:1`..`:4` carry length buckets.
pub const SENTENCE_IDS: [&str; 5] = [":0", ":1", ":2", ":3", ":4"];

/// Assigns each distinct token a dense index, so sentences can be
/// encoded as fixed-width float vectors. Once assigned, an index is
/// never reused.
#[derive(Debug, Clone, Default)]
pub struct IdManager {
    ids: HashMap<String, usize>,
}

impl IdManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager pre-seeded with reserved tokens, in the given order.
    pub fn with_reserved(reserved: &[&str]) -> Self {
        let mut manager = Self::new();
        for token in reserved {
            manager.add_token(token);
        }
        manager
    }

    /// All-digit tokens are folded so `30` and `45` share an id.
    pub fn adj_token(token: &str) -> String {
        if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
            token.chars().map(|_| '#').collect()
        } else {
            token.to_string()
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(&Self::adj_token(token))
    }

    pub fn add_token(&mut self, token: &str) {
        let token = Self::adj_token(token);
        let next = self.ids.len();
        self.ids.entry(token).or_insert(next);
    }

    pub fn add_sent(&mut self, sent: &[String]) {
        for token in sent {
            self.add_token(token);
        }
    }

    /// Zero-filled vector sized to the current id count.
    pub fn vector(&self) -> Vec<f32> {
        vec![0.0; self.ids.len()]
    }

    /// Write `val` at the token's position. Unknown tokens are skipped;
    /// callers gate on [`contains`](Self::contains) where that matters.
    pub fn assign(&self, vector: &mut [f32], token: &str, val: f32) {
        if let Some(&index) = self.ids.get(&Self::adj_token(token)) {
            vector[index] = val;
        }
    }

    pub fn save(&self, prefix: &str) -> Result<()> {
        let encoded = serde_json::to_string(&self.ids)?;
        fs::write(ids_path(prefix), encoded)?;
        Ok(())
    }

    pub fn load(prefix: &str) -> Result<Self> {
        let path = ids_path(prefix);
        let raw = fs::read_to_string(&path).map_err(|_| Error::MissingArtifact(path.clone()))?;
        let ids: HashMap<String, usize> =
            serde_json::from_str(&raw).map_err(|_| Error::MissingArtifact(path))?;
        Ok(Self { ids })
    }
}

fn ids_path(prefix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}.ids"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_width_tracks_ids() {
        let mut ids = IdManager::new();
        assert_eq!(ids.vector().len(), 0);
        ids.add_token("hello");
        ids.add_token("there");
        assert_eq!(ids.vector().len(), 2);
        ids.add_token("hello");
        assert_eq!(ids.vector().len(), 2);
    }

    #[test]
    fn test_assign_touches_one_position() {
        let mut ids = IdManager::new();
        ids.add_token("a");
        ids.add_token("b");
        ids.add_token("c");
        let mut v = ids.vector();
        ids.assign(&mut v, "b", 1.0);
        assert_eq!(v.iter().filter(|x| **x != 0.0).count(), 1);
    }

    #[test]
    fn test_digit_folding() {
        let mut ids = IdManager::new();
        ids.add_token("30");
        assert!(ids.contains("45"));
        assert!(!ids.contains("450"));
        // mixed alphanumerics are not folded
        ids.add_token("4pm");
        assert!(!ids.contains("5pm"));
    }

    #[test]
    fn test_reserved_ids_present() {
        let ids = IdManager::with_reserved(&SENTENCE_IDS);
        assert_eq!(ids.len(), 5);
        for token in SENTENCE_IDS {
            assert!(ids.contains(token));
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("test").to_string_lossy().to_string();

        let mut ids = IdManager::with_reserved(&SENTENCE_IDS);
        ids.add_sent(&["what".into(), "is".into(), "up".into()]);
        ids.save(&prefix).unwrap();

        let loaded = IdManager::load(&prefix).unwrap();
        assert_eq!(loaded.len(), ids.len());
        let mut a = ids.vector();
        let mut b = loaded.vector();
        ids.assign(&mut a, "what", 1.0);
        loaded.assign(&mut b, "what", 1.0);
        assert_eq!(a, b);
    }
}
