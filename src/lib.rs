//! parlance - neural intent parser for short natural-language
//! utterances.
//!
//! Register intents (sample sentences, optionally with `{placeholder}`
//! slots) and entities, train, then match queries to get ranked
//! [`MatchData`] results with extracted slot values. A regex
//! [`RegexIntentContainer`] fast path handles exact and near-exact
//! template matching without any training.

mod container;
mod domain;
mod entity;
mod entity_edge;
mod entity_manager;
mod error;
mod id_manager;
mod intent;
mod intent_manager;
mod match_data;
mod nn;
mod pos_intent;
mod simple_intent;
mod template;
mod train_data;
mod trainable;
mod training_manager;
mod util;

pub use container::IntentContainer;
pub use domain::{DomainIntentContainer, DEFAULT_TOP_K_DOMAINS};
pub use entity::Entity;
pub use error::{Error, Result};
pub use match_data::MatchData;
pub use template::{RegexIntentContainer, TemplateMatch};
pub use train_data::TrainData;
pub use util::{expand_parentheses, lines_hash, remove_comments, tokenize};
