//! Lexical utilities shared by the neural and regex paths.
//!
//! Tokenization is a small state machine over character classes; sample
//! lines additionally go through comment stripping and `(a|b)` bracket
//! expansion before they become training sentences.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use xxhash_rust::xxh32::Xxh32;

#[derive(Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Alpha,
    Digit,
    Space,
    Other,
}

fn classify(c: char) -> CharClass {
    if c.is_alphabetic() || matches!(c, '-' | '{' | '}') {
        CharClass::Alpha
    } else if c.is_ascii_digit() || c == '#' {
        CharClass::Digit
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Other
    }
}

/// Split a sentence into lowercased tokens.
///
/// A token ends at every character-class change; "other" characters
/// always form single-character tokens. Sentence-final punctuation
/// (`.`, `!`, `?`) is dropped. Idempotent on already-tokenized text.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut last = CharClass::Other;

    let mut flush = |tokens: &mut Vec<String>, from: usize, to: usize| {
        let token = sentence[from..to].to_lowercase();
        if !matches!(token.as_str(), "." | "!" | "?") {
            tokens.push(token);
        }
    };

    for (i, c) in sentence.char_indices() {
        let class = classify(c);
        if class != last || class == CharClass::Other {
            if let Some(from) = start {
                flush(&mut tokens, from, i);
            }
            start = if class == CharClass::Space { None } else { Some(i) };
        }
        last = class;
    }
    if let Some(from) = start {
        flush(&mut tokens, from, sentence.len());
    }
    tokens
}

/// Drop sample lines that are `//` comments.
pub fn remove_comments(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| !line.starts_with("//"))
        .cloned()
        .collect()
}

/// Expand `( a | b )` alternation groups into the cartesian product of
/// all choices. Nested groups are allowed; an empty alternative
/// (`(foo|)`) yields a sentence with the group absent. A bare `|`
/// outside any group splits the whole line into alternatives.
pub fn expand_parentheses(tokens: &[String]) -> Vec<Vec<String>> {
    let mut pos = 0;
    parse_alternatives(tokens, &mut pos, true)
}

fn parse_alternatives(tokens: &[String], pos: &mut usize, top: bool) -> Vec<Vec<String>> {
    let mut done: Vec<Vec<Vec<String>>> = Vec::new();
    let mut current: Vec<Vec<String>> = vec![Vec::new()];

    while *pos < tokens.len() {
        match tokens[*pos].as_str() {
            "(" => {
                *pos += 1;
                let inner = parse_alternatives(tokens, pos, false);
                current = cross(&current, &inner);
            }
            ")" => {
                *pos += 1;
                if !top {
                    break;
                }
            }
            "|" => {
                *pos += 1;
                done.push(std::mem::replace(&mut current, vec![Vec::new()]));
            }
            word => {
                for sent in &mut current {
                    sent.push(word.to_string());
                }
                *pos += 1;
            }
        }
    }
    done.push(current);
    done.into_iter().flatten().collect()
}

fn cross(prefixes: &[Vec<String>], choices: &[Vec<String>]) -> Vec<Vec<String>> {
    let mut out = Vec::with_capacity(prefixes.len() * choices.len());
    for prefix in prefixes {
        for choice in choices {
            let mut sent = prefix.clone();
            sent.extend(choice.iter().cloned());
            out.push(sent);
        }
    }
    out
}

/// 4-byte xxh32 digest over the UTF-8 concatenation of `lines`, in
/// order. Used to decide whether a trained artifact is still current.
pub fn lines_hash(lines: &[String]) -> [u8; 4] {
    let mut hasher = Xxh32::new(0);
    for line in lines {
        hasher.update(line.as_bytes());
    }
    hasher.digest().to_be_bytes()
}

/// Merge training examples with identical input vectors, keeping the
/// per-position maximum of their targets so a positive example always
/// wins over a negative duplicate.
pub fn resolve_conflicts(
    inputs: Vec<Vec<f32>>,
    outputs: Vec<Vec<f32>>,
) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let mut index: HashMap<Vec<u32>, usize> = HashMap::new();
    let mut merged_inputs = Vec::new();
    let mut merged_outputs: Vec<Vec<f32>> = Vec::new();

    for (input, output) in inputs.into_iter().zip(outputs) {
        let key: Vec<u32> = input.iter().map(|v| v.to_bits()).collect();
        match index.entry(key) {
            Entry::Occupied(slot) => {
                let merged = &mut merged_outputs[*slot.get()];
                for (have, new) in merged.iter_mut().zip(&output) {
                    *have = have.max(*new);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(merged_inputs.len());
                merged_inputs.push(input);
                merged_outputs.push(output);
            }
        }
    }
    (merged_inputs, merged_outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_tokenize_words() {
        assert_eq!(toks("Hello there"), vec!["hello", "there"]);
        assert_eq!(toks("what is the weather"), vec!["what", "is", "the", "weather"]);
    }

    #[test]
    fn test_tokenize_drops_final_punctuation() {
        assert_eq!(toks("hello!"), vec!["hello"]);
        assert_eq!(toks("what time is it?"), vec!["what", "time", "is", "it"]);
        assert_eq!(toks("done."), vec!["done"]);
        // Other punctuation stays as its own token
        assert_eq!(toks("a,b"), vec!["a", ",", "b"]);
    }

    #[test]
    fn test_tokenize_placeholders() {
        assert_eq!(toks("weather in {place}"), vec!["weather", "in", "{place}"]);
        assert_eq!(toks("set timer for {duration}"), vec!["set", "timer", "for", "{duration}"]);
    }

    #[test]
    fn test_tokenize_digits() {
        assert_eq!(toks("wait 10 minutes"), vec!["wait", "10", "minutes"]);
        // digits and letters split at the class change
        assert_eq!(toks("4pm"), vec!["4", "pm"]);
    }

    #[test]
    fn test_tokenize_idempotent() {
        let first = toks("hey, what's the weather in {place}?");
        let second = tokenize(&first.join(" "));
        assert_eq!(first, second);
    }

    #[test]
    fn test_remove_comments() {
        let lines = vec![
            "hello".to_string(),
            "// a comment".to_string(),
            "hi there".to_string(),
        ];
        assert_eq!(remove_comments(&lines), vec!["hello", "hi there"]);
    }

    #[test]
    fn test_expand_parentheses() {
        let expanded = expand_parentheses(&toks("a (b|c) (|d)"));
        let as_set: std::collections::HashSet<Vec<String>> = expanded.into_iter().collect();
        let expected: std::collections::HashSet<Vec<String>> = [
            vec!["a", "b"],
            vec!["a", "b", "d"],
            vec!["a", "c"],
            vec!["a", "c", "d"],
        ]
        .into_iter()
        .map(|s| s.into_iter().map(String::from).collect())
        .collect();
        assert_eq!(as_set, expected);
    }

    #[test]
    fn test_expand_nested() {
        let expanded = expand_parentheses(&toks("x (a (b|c)|d)"));
        let as_set: std::collections::HashSet<Vec<String>> = expanded.into_iter().collect();
        assert_eq!(as_set.len(), 3);
        assert!(as_set.contains(&vec!["x".to_string(), "a".to_string(), "b".to_string()]));
        assert!(as_set.contains(&vec!["x".to_string(), "a".to_string(), "c".to_string()]));
        assert!(as_set.contains(&vec!["x".to_string(), "d".to_string()]));
    }

    #[test]
    fn test_expand_plain_line() {
        assert_eq!(expand_parentheses(&toks("just words")), vec![vec!["just", "words"]]);
    }

    #[test]
    fn test_lines_hash_stable() {
        let a = vec!["hello".to_string(), "hi".to_string()];
        let b = vec!["hello".to_string(), "hi".to_string()];
        let c = vec!["hello".to_string(), "hey".to_string()];
        assert_eq!(lines_hash(&a), lines_hash(&b));
        assert_ne!(lines_hash(&a), lines_hash(&c));
    }

    #[test]
    fn test_resolve_conflicts_merges_duplicates() {
        let inputs = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let outputs = vec![vec![0.0], vec![1.0], vec![0.5]];
        let (inputs, outputs) = resolve_conflicts(inputs, outputs);
        assert_eq!(inputs.len(), 2);
        assert_eq!(outputs[0], vec![1.0]);
        assert_eq!(outputs[1], vec![0.5]);
    }
}
