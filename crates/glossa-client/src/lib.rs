//! Glossa Client - batching translation client.
//!
//! Splits an input text into per-job sentence batches, sends them with a
//! chosen priority, tracks every job until its response (or the
//! connection's demise), and reassembles the output in input order.
//! Optional pre- and post-processing runs against external processor
//! endpoints using the chunked `proc` protocol.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod manager;
mod proc;

pub use error::ClientError;
pub use manager::{ClientParams, ClientManager, SentenceOutcome, batch_ranges};
pub use proc::process_text;
