//! The message envelope and the typed wire-message set.
//!
//! Every message is a JSON document carrying `prot_ver` and `msg_type`.
//! Parsing peeks the envelope first, then decodes the full message for the
//! tagged type; serialising a parsed message reproduces the original
//! document byte for byte (fields are emitted in declaration order).

use serde::Deserialize;

use crate::error::MessagingError;
use crate::proc::{ProcReq, ProcResp};
use crate::supp_lang::{SuppLangReq, SuppLangResp};
use crate::trans_job::{TransJobReq, TransJobResp};

/// Version of the wire protocol spoken by this build.
pub const PROTOCOL_VERSION: u32 = 1;

/// Message-type tags carried in the `msg_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MsgType {
    /// Supported-languages request.
    SuppLangReq = 1,
    /// Supported-languages response.
    SuppLangResp = 2,
    /// Translation job request.
    TransJobReq = 3,
    /// Translation job response.
    TransJobResp = 4,
    /// Pre-processor request.
    PreProcReq = 5,
    /// Pre-processor response.
    PreProcResp = 6,
    /// Post-processor request.
    PostProcReq = 7,
    /// Post-processor response.
    PostProcResp = 8,
}

impl MsgType {
    /// Wire value of the tag.
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::SuppLangReq),
            2 => Some(Self::SuppLangResp),
            3 => Some(Self::TransJobReq),
            4 => Some(Self::TransJobResp),
            5 => Some(Self::PreProcReq),
            6 => Some(Self::PreProcResp),
            7 => Some(Self::PostProcReq),
            8 => Some(Self::PostProcResp),
            _ => None,
        }
    }
}

/// The envelope fields common to every message, used for peeking.
#[derive(Debug, Deserialize)]
struct Envelope {
    prot_ver: u32,
    msg_type: u32,
}

/// One fully-decoded wire message.
#[derive(Debug, Clone, PartialEq)]
pub enum WireMsg {
    /// Supported-languages request.
    SuppLangReq(SuppLangReq),
    /// Supported-languages response.
    SuppLangResp(SuppLangResp),
    /// Translation job request.
    TransJobReq(TransJobReq),
    /// Translation job response.
    TransJobResp(TransJobResp),
    /// Pre- or post-processor request.
    ProcReq(ProcReq),
    /// Pre- or post-processor response.
    ProcResp(ProcResp),
}

impl WireMsg {
    /// Decode a message from its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Protocol`] for an unsupported protocol
    /// version or an unknown `msg_type`, and [`MessagingError::Json`] when
    /// the document does not match the tagged type.
    pub fn parse(text: &str) -> Result<Self, MessagingError> {
        let envelope: Envelope = serde_json::from_str(text)?;

        if envelope.prot_ver > PROTOCOL_VERSION {
            return Err(MessagingError::Protocol(format!(
                "unsupported protocol version {} (max {PROTOCOL_VERSION})",
                envelope.prot_ver
            )));
        }

        let Some(msg_type) = MsgType::from_u32(envelope.msg_type) else {
            return Err(MessagingError::Protocol(format!(
                "unknown message type {}",
                envelope.msg_type
            )));
        };

        Ok(match msg_type {
            MsgType::SuppLangReq => Self::SuppLangReq(serde_json::from_str(text)?),
            MsgType::SuppLangResp => Self::SuppLangResp(serde_json::from_str(text)?),
            MsgType::TransJobReq => Self::TransJobReq(serde_json::from_str(text)?),
            MsgType::TransJobResp => Self::TransJobResp(serde_json::from_str(text)?),
            MsgType::PreProcReq | MsgType::PostProcReq => {
                Self::ProcReq(serde_json::from_str(text)?)
            }
            MsgType::PreProcResp | MsgType::PostProcResp => {
                Self::ProcResp(serde_json::from_str(text)?)
            }
        })
    }

    /// Encode the message to its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Json`] when serialization fails.
    pub fn to_json(&self) -> Result<String, MessagingError> {
        let text = match self {
            Self::SuppLangReq(msg) => serde_json::to_string(msg)?,
            Self::SuppLangResp(msg) => serde_json::to_string(msg)?,
            Self::TransJobReq(msg) => serde_json::to_string(msg)?,
            Self::TransJobResp(msg) => serde_json::to_string(msg)?,
            Self::ProcReq(msg) => serde_json::to_string(msg)?,
            Self::ProcResp(msg) => serde_json::to_string(msg)?,
        };
        Ok(text)
    }

    /// The `msg_type` tag of this message.
    #[must_use]
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::SuppLangReq(_) => MsgType::SuppLangReq,
            Self::SuppLangResp(_) => MsgType::SuppLangResp,
            Self::TransJobReq(_) => MsgType::TransJobReq,
            Self::TransJobResp(_) => MsgType::TransJobResp,
            Self::ProcReq(msg) => msg.msg_type_tag(),
            Self::ProcResp(msg) => msg.msg_type_tag(),
        }
    }
}
