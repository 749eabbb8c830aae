//! Pre- and post-processor messages.
//!
//! Text pre/post-processing runs on external endpoints; large inputs are
//! shipped in numbered chunks under an opaque job token issued by the
//! client.

use glossa_core::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::MessagingError;
use crate::msg::{MsgType, PROTOCOL_VERSION};

/// Which side of the pipeline a processor message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcKind {
    /// Pre-processing, before translation.
    Pre,
    /// Post-processing, after translation.
    Post,
}

/// A processor request chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcReq {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; pre- or post-processor request.
    pub msg_type: u32,
    /// Opaque job token chosen by the client.
    pub job_id: String,
    /// Language the chunk is in (or `auto` for detection upstream).
    pub lang: String,
    /// Zero-based index of this chunk.
    pub chunk_idx: u32,
    /// Total number of chunks in the job.
    pub num_chunks: u32,
    /// The chunk payload.
    pub chunk: String,
}

impl ProcReq {
    /// Build one chunk of a processor request.
    #[must_use]
    pub fn new(
        kind: ProcKind,
        job_id: impl Into<String>,
        lang: impl Into<String>,
        chunk_idx: u32,
        num_chunks: u32,
        chunk: impl Into<String>,
    ) -> Self {
        let msg_type = match kind {
            ProcKind::Pre => MsgType::PreProcReq,
            ProcKind::Post => MsgType::PostProcReq,
        };
        Self {
            prot_ver: PROTOCOL_VERSION,
            msg_type: msg_type.as_u32(),
            job_id: job_id.into(),
            lang: lang.into(),
            chunk_idx,
            num_chunks,
            chunk: chunk.into(),
        }
    }

    pub(crate) fn msg_type_tag(&self) -> MsgType {
        if self.msg_type == MsgType::PostProcReq.as_u32() {
            MsgType::PostProcReq
        } else {
            MsgType::PreProcReq
        }
    }

    /// Which pipeline side this request addresses.
    #[must_use]
    pub fn kind(&self) -> ProcKind {
        match self.msg_type_tag() {
            MsgType::PostProcReq => ProcKind::Post,
            _ => ProcKind::Pre,
        }
    }
}

/// A processor response chunk; mirrors the request with processed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcResp {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; pre- or post-processor response.
    pub msg_type: u32,
    /// Response status.
    pub stat_code: StatusCode,
    /// Human-readable status detail.
    pub stat_msg: String,
    /// Job token echoed from the request.
    pub job_id: String,
    /// Language of the processed chunk.
    pub lang: String,
    /// Zero-based index of this chunk.
    pub chunk_idx: u32,
    /// Total number of chunks in the job.
    pub num_chunks: u32,
    /// The processed payload.
    pub chunk: String,
}

impl ProcResp {
    pub(crate) fn msg_type_tag(&self) -> MsgType {
        if self.msg_type == MsgType::PostProcResp.as_u32() {
            MsgType::PostProcResp
        } else {
            MsgType::PreProcResp
        }
    }

    /// Fail fast unless the response chunk is usable.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Protocol`] when the processor reported an
    /// error status or the chunk indices are inconsistent.
    pub fn ensure_usable(&self) -> Result<(), MessagingError> {
        if self.stat_code != StatusCode::Ok {
            return Err(MessagingError::Protocol(format!(
                "processor job {} failed: {}",
                self.job_id, self.stat_msg
            )));
        }
        if self.chunk_idx >= self.num_chunks {
            return Err(MessagingError::Protocol(format!(
                "processor chunk {}/{} out of range",
                self.chunk_idx, self.num_chunks
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_the_tag() {
        let pre = ProcReq::new(ProcKind::Pre, "t", "en", 0, 1, "text");
        assert_eq!(pre.kind(), ProcKind::Pre);
        let post = ProcReq::new(ProcKind::Post, "t", "en", 0, 1, "text");
        assert_eq!(post.kind(), ProcKind::Post);
    }

    #[test]
    fn out_of_range_chunk_is_rejected() {
        let resp = ProcResp {
            prot_ver: PROTOCOL_VERSION,
            msg_type: MsgType::PreProcResp.as_u32(),
            stat_code: StatusCode::Ok,
            stat_msg: String::new(),
            job_id: "t".to_owned(),
            lang: "en".to_owned(),
            chunk_idx: 2,
            num_chunks: 2,
            chunk: String::new(),
        };
        assert!(resp.ensure_usable().is_err());
    }
}
