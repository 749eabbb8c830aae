//! Glossa Core - Foundation types for the glossa distributed translation service.
//!
//! This crate provides:
//! - Typed identifiers (sessions, jobs, servers, words, phrases)
//! - The monotone [`IdManager`] used to issue them
//! - Content-addressed phrase uids with incremental combination
//! - Wire status codes shared by every response message

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod ids;
pub mod phrase;
pub mod status;

pub use ids::{IdManager, JobId, ServerUid, SessionId, TypedId, WordUid};
pub use phrase::{PhraseUid, combine_uids};
pub use status::{InvalidStatusCode, StatusCode};
