//! Glossa Messaging - wire protocol and WebSocket plumbing.
//!
//! This crate provides:
//! - The typed JSON message set exchanged between clients, the balancer and
//!   translation servers ([`WireMsg`] and the per-type structs)
//! - TLS mode selection and URI agreement checks
//! - A retrying WebSocket connector for outbound links
//! - A WebSocket endpoint (accept loop) for inbound links
//! - The [`SessionRegistry`] mapping connections to session ids
//!
//! # Locking Design
//!
//! The registry is a single `std::sync::Mutex` held only for map access.
//! Session-close hooks run after the mapping is removed and the lock is
//! released, so hook work may re-enter the registry (e.g. to drop replies
//! for the closed session) without deadlocking.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod client;
mod error;
mod msg;
mod proc;
pub mod server;
pub mod session;
mod supp_lang;
mod tls;
mod trans_job;

pub use client::{ConnectParams, WsConnection};
pub use error::MessagingError;
pub use msg::{MsgType, PROTOCOL_VERSION, WireMsg};
pub use proc::{ProcKind, ProcReq, ProcResp};
pub use server::{MessageSink, WsEndpoint};
pub use session::{ConnKey, SessionEventSink, SessionRegistry};
pub use supp_lang::{SuppLangReq, SuppLangResp};
pub use tls::TlsMode;
pub use trans_job::{TransJobReq, TransJobResp, TransSentData};
