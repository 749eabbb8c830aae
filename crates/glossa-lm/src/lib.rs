//! Glossa LM - trie-backed m-gram language model.
//!
//! The model maps m-grams (up to [`LM_MAX_LEVEL`] words) onto
//! `{log-probability, back-off weight}` payloads. Queries stream over a
//! word-id sequence with a sliding window, reusing incrementally-built
//! m-gram hashes so no sub-hash is ever computed twice.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod builder;
mod error;
mod level;
mod loader;
mod payload;
mod query;
mod trie;
mod word_index;

pub use builder::LmBuilder;
pub use error::LmError;
pub use loader::load_lm;
pub use payload::{LM_MAX_LEVEL, MAX_QUERY_WORDS, MGramPayload, ZERO_LOG_PROB_WEIGHT};
pub use query::{LmQueryProxy, MGramQuery};
pub use trie::{HashMapTrie, LmModel};
pub use word_index::WordIndex;
