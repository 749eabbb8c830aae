//! Glossa Test - shared fixtures.
//!
//! A deterministic English→German toy model set, small enough to reason
//! about by hand yet rich enough to exercise phrasal translation,
//! reordering weights and unknown-word handling.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod fixtures;

pub use fixtures::{toy_lm, toy_rm, toy_tm};
