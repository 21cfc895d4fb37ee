//! Match results: the token-level candidate used during extraction and
//! the detokenized record handed back to callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How a query fits an intent. `conf` is a local score in [0, 1];
/// `name == None` means no match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchData {
    pub name: Option<String>,
    pub sent: String,
    pub matches: HashMap<String, String>,
    pub conf: f32,
}

impl MatchData {
    /// Null result for a query nothing matched.
    pub fn empty(query: &str) -> Self {
        Self {
            name: None,
            sent: query.to_string(),
            matches: HashMap::new(),
            conf: 0.0,
        }
    }

    /// Total length of extracted slot values, used to prefer tighter
    /// matches when confidences tie.
    pub fn total_match_len(&self) -> usize {
        self.matches.values().map(|v| v.len()).sum()
    }
}

/// Mutable candidate flowing through extraction. `sent` is still a
/// token list and slot values are token lists; [`detokenize`]
/// (Candidate::detokenize) freezes it into a [`MatchData`].
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub name: String,
    pub sent: Vec<String>,
    pub matches: HashMap<String, Vec<String>>,
    pub conf: f32,
}

impl Candidate {
    pub fn new(name: &str, sent: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            sent,
            matches: HashMap::new(),
            conf: 0.0,
        }
    }

    pub fn detokenize(self) -> MatchData {
        let matches = self
            .matches
            .into_iter()
            .map(|(token, value)| {
                let name = token.replace(['{', '}'], "");
                (name, join_tokens(&value))
            })
            .collect();
        MatchData {
            name: Some(self.name),
            sent: join_tokens(&self.sent),
            matches,
            conf: self.conf,
        }
    }
}

/// Rejoin tokens into a human string. An apostrophe glues to the
/// previous word; a single-character token after it glues too (as in
/// "what's"), while a longer token starts a new word.
fn join_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut after_apostrophe = false;
    for token in tokens {
        if token == "'" {
            after_apostrophe = true;
            out.push('\'');
        } else if after_apostrophe {
            if token.chars().count() > 1 {
                out.push(' ');
            }
            out.push_str(token);
            after_apostrophe = false;
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(token);
        }
    }
    out
}
