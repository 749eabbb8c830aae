//! Glossa Decoder - stack-based beam search for one sentence.
//!
//! The decoder walks four phases: bootstrap (triangular span map plus
//! translation-model lookups), reordering-model priming, the multi-stack
//! search with recombination and pruning, and extraction of the best
//! target sentence. A shared stop flag is honoured at every phase boundary
//! and once per stack expansion; a stopped decode yields the source
//! sentence verbatim rather than an error.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod coverage;
mod decoder;
mod error;
mod future;
mod hypothesis;
mod params;
mod sent_data;
mod stack;

pub use coverage::Coverage;
pub use decoder::{SentenceDecoder, SentenceResult};
pub use error::DecoderError;
pub use params::{DecoderParams, MAX_WORDS_PER_SENTENCE};
