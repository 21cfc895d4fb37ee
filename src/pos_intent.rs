//! Span proposal for one placeholder: two boundary classifiers vote on
//! every (left, right) position pair.

use crate::entity::Entity;
use crate::entity_edge::EntityEdge;
use crate::error::Result;
use crate::match_data::Candidate;
use crate::train_data::TrainData;

/// Edge confidences below this never anchor a span.
const EDGE_CUTOFF: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct PosIntent {
    token: String,
    left: EntityEdge,
    right: EntityEdge,
}

impl PosIntent {
    pub fn new(token: &str, intent_name: &str) -> Self {
        Self {
            token: token.to_string(),
            left: EntityEdge::new(-1, token, intent_name),
            right: EntityEdge::new(1, token, intent_name),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Propose every plausible extraction of this placeholder from the
    /// candidate's sentence. The caller keeps the unextracted candidate
    /// too, so a slot may stay unfilled.
    pub(crate) fn propose(&self, orig: &Candidate, entity: Option<&Entity>) -> Vec<Candidate> {
        let sent = &orig.sent;
        let l_confs: Vec<f32> = (0..sent.len()).map(|p| self.left.eval(sent, p)).collect();
        let r_confs: Vec<f32> = (0..sent.len()).map(|p| self.right.eval(sent, p)).collect();

        let mut proposals = Vec::new();
        for (lp, &l_conf) in l_confs.iter().enumerate() {
            if l_conf < EDGE_CUTOFF {
                continue;
            }
            for (rp, &r_conf) in r_confs.iter().enumerate() {
                if r_conf < EDGE_CUTOFF || rp < lp {
                    continue;
                }
                // A span never swallows an already-extracted placeholder.
                if sent[lp..=rp].iter().any(|t| t.starts_with('{')) {
                    continue;
                }

                let extracted = sent[lp..=rp].to_vec();
                let pos_conf = ((l_conf - 0.5) + (r_conf - 0.5)) / 2.0 + 0.5;
                let ent_conf = entity.map(|e| e.eval(&extracted)).unwrap_or(1.0);

                let mut new_sent = sent[..lp].to_vec();
                new_sent.push(self.token.clone());
                new_sent.extend_from_slice(&sent[rp + 1..]);

                let mut matches = orig.matches.clone();
                matches.insert(self.token.clone(), extracted);

                proposals.push(Candidate {
                    name: orig.name.clone(),
                    sent: new_sent,
                    matches,
                    conf: orig.conf + (pos_conf * ent_conf).sqrt() - 0.5,
                });
            }
        }
        proposals
    }

    pub fn train(&mut self, data: &TrainData) {
        self.left.train(data);
        self.right.train(data);
    }

    pub fn save(&self, prefix: &str) -> Result<()> {
        let prefix = format!("{prefix}.{}", self.token);
        self.left.save(&prefix)?;
        self.right.save(&prefix)
    }

    pub fn from_file(prefix: &str, token: &str, intent_name: &str) -> Result<Self> {
        let mut instance = Self::new(token, intent_name);
        let prefix = format!("{prefix}.{token}");
        instance.left.load(&prefix)?;
        instance.right.load(&prefix)?;
        Ok(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(samples: &[&str]) -> Vec<String> {
        samples.iter().map(|s| s.to_string()).collect()
    }

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_proposes_trained_slot() {
        let mut data = TrainData::new();
        data.add_lines(
            "weather",
            &lines(&["weather in {place}", "what is the weather in {place}"]),
        );
        let mut pos = PosIntent::new("{place}", "weather");
        pos.train(&data);

        let seed = Candidate::new("weather", toks(&["weather", "in", "london"]));
        let proposals = pos.propose(&seed, None);
        assert!(!proposals.is_empty());
        let best = proposals
            .iter()
            .max_by(|a, b| a.conf.total_cmp(&b.conf))
            .unwrap();
        assert_eq!(best.matches["{place}"], toks(&["london"]));
        assert_eq!(best.sent, toks(&["weather", "in", "{place}"]));
    }

    #[test]
    fn test_never_spans_placeholders() {
        let mut data = TrainData::new();
        data.add_lines("weather", &lines(&["weather in {place}"]));
        let mut pos = PosIntent::new("{place}", "weather");
        pos.train(&data);

        let mut seed = Candidate::new("weather", toks(&["weather", "in", "{place}"]));
        seed.conf = 0.4;
        for proposal in pos.propose(&seed, None) {
            assert!(!proposal.matches["{place}"].iter().any(|t| t.starts_with('{')));
        }
    }
}
