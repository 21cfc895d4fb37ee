//! Tokenized training sentences grouped by intent or entity name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::util::{expand_parentheses, remove_comments, tokenize};

/// Holds every registered object's sample sentences, already comment-
/// stripped, tokenized and bracket-expanded. Training code reads it;
/// nothing in here refers back to the objects being trained.
#[derive(Debug, Clone, Default)]
pub struct TrainData {
    sent_lists: HashMap<String, Vec<Vec<String>>>,
}

impl TrainData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_lines(&mut self, name: &str, lines: &[String]) {
        let sents: Vec<Vec<String>> = remove_comments(lines)
            .iter()
            .flat_map(|line| expand_parentheses(&tokenize(line)))
            .filter(|sent| !sent.is_empty())
            .collect();
        self.sent_lists.insert(name.to_string(), sents);
    }

    /// Register samples straight from a file, one template per line.
    pub fn add_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        self.add_lines(name, &lines);
        Ok(())
    }

    pub fn remove_lines(&mut self, name: &str) {
        self.sent_lists.remove(name);
    }

    pub fn my_sents<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Vec<String>> {
        self.sent_lists.get(name).into_iter().flatten()
    }

    pub fn other_sents<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Vec<String>> {
        self.sent_lists
            .iter()
            .filter(move |(key, _)| key.as_str() != name)
            .flat_map(|(_, sents)| sents)
    }

    pub fn all_sents(&self) -> impl Iterator<Item = &Vec<String>> {
        self.sent_lists.values().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_lines_expands_and_filters() {
        let mut data = TrainData::new();
        data.add_lines("greet", &lines(&["(hi|hello)", "// ignored", ""]));
        let sents: Vec<_> = data.my_sents("greet").cloned().collect();
        assert_eq!(sents, vec![vec!["hi".to_string()], vec!["hello".to_string()]]);
    }

    #[test]
    fn test_my_and_other_sents() {
        let mut data = TrainData::new();
        data.add_lines("greet", &lines(&["hi"]));
        data.add_lines("bye", &lines(&["goodbye"]));
        assert_eq!(data.my_sents("greet").count(), 1);
        let other: Vec<_> = data.other_sents("greet").cloned().collect();
        assert_eq!(other, vec![vec!["goodbye".to_string()]]);
        assert_eq!(data.all_sents().count(), 2);
    }

    #[test]
    fn test_add_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greet.intent");
        fs::write(&path, "hi\n// comment\n(hey|hello) there\n").unwrap();

        let mut data = TrainData::new();
        data.add_file("greet", &path).unwrap();
        assert_eq!(data.my_sents("greet").count(), 3);
    }

    #[test]
    fn test_remove_lines() {
        let mut data = TrainData::new();
        data.add_lines("greet", &lines(&["hi"]));
        data.remove_lines("greet");
        assert_eq!(data.my_sents("greet").count(), 0);
    }
}
