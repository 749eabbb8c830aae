//! Translation job request and response messages.

use glossa_core::{JobId, StatusCode};
use serde::{Deserialize, Serialize};

use crate::msg::{MsgType, PROTOCOL_VERSION};

/// A translation job request: one or more source sentences to translate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransJobReq {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; always [`MsgType::TransJobReq`].
    pub msg_type: u32,
    /// Job id. Client-assigned; rewritten by the balancer before forwarding.
    pub job_id: JobId,
    /// Source language name or ISO code.
    pub source_lang: String,
    /// Target language name or ISO code.
    pub target_lang: String,
    /// Whether per-stack search-space statistics are requested.
    pub is_trans_info: bool,
    /// Scheduling priority; larger is more urgent.
    pub priority: i32,
    /// The sentences to translate, tokenised and lower-cased.
    pub source_sent: Vec<String>,
}

impl TransJobReq {
    /// Build a request for the given sentences.
    #[must_use]
    pub fn new(
        job_id: JobId,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        is_trans_info: bool,
        priority: i32,
        source_sent: Vec<String>,
    ) -> Self {
        Self {
            prot_ver: PROTOCOL_VERSION,
            msg_type: MsgType::TransJobReq.as_u32(),
            job_id,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            is_trans_info,
            priority,
            source_sent,
        }
    }
}

/// Per-sentence slice of a translation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransSentData {
    /// The translated sentence, or the echoed source on failure.
    pub trans_text: String,
    /// Outcome for this sentence.
    pub stat_code: StatusCode,
    /// Human-readable detail for this sentence.
    pub stat_msg: String,
    /// Search-space utilisation per decoding stack, percent of capacity.
    /// Present only when the request asked for translation info.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_load: Option<Vec<u32>>,
}

impl TransSentData {
    /// A successfully translated sentence.
    #[must_use]
    pub fn ok(trans_text: impl Into<String>) -> Self {
        Self {
            trans_text: trans_text.into(),
            stat_code: StatusCode::Ok,
            stat_msg: String::new(),
            stack_load: None,
        }
    }

    /// A failed sentence carrying the echoed source text.
    #[must_use]
    pub fn failed(source_text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            trans_text: source_text.into(),
            stat_code: StatusCode::ResultError,
            stat_msg: reason.into(),
            stack_load: None,
        }
    }

    /// Attach the per-stack load vector.
    #[must_use]
    pub fn with_stack_load(mut self, loads: Vec<u32>) -> Self {
        self.stack_load = Some(loads);
        self
    }
}

/// A translation job response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransJobResp {
    /// Protocol version.
    pub prot_ver: u32,
    /// Message-type tag; always [`MsgType::TransJobResp`].
    pub msg_type: u32,
    /// Job id; restored to the client's value by the balancer.
    pub job_id: JobId,
    /// Overall job outcome.
    pub stat_code: StatusCode,
    /// Human-readable overall detail.
    pub stat_msg: String,
    /// One entry per source sentence, in input order.
    pub target_data: Vec<TransSentData>,
}

impl TransJobResp {
    /// Build a response shell; sentence entries are pushed afterwards.
    #[must_use]
    pub fn new(job_id: JobId, stat_code: StatusCode, stat_msg: impl Into<String>) -> Self {
        Self {
            prot_ver: PROTOCOL_VERSION,
            msg_type: MsgType::TransJobResp.as_u32(),
            job_id,
            stat_code,
            stat_msg: stat_msg.into(),
            target_data: Vec::new(),
        }
    }

    /// Derive the job status from the per-sentence outcomes already pushed.
    ///
    /// All ok yields `Ok`, a mix yields `Partial`, none ok yields
    /// `ResultError`. An empty response stays `Ok`.
    pub fn derive_status(&mut self) {
        let ok = self
            .target_data
            .iter()
            .filter(|s| s.stat_code == StatusCode::Ok)
            .count();
        self.stat_code = if ok == self.target_data.len() {
            StatusCode::Ok
        } else if ok > 0 {
            StatusCode::Partial
        } else {
            StatusCode::ResultError
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_status_all_ok() {
        let mut resp = TransJobResp::new(JobId(1), StatusCode::Undefined, "");
        resp.target_data.push(TransSentData::ok("a"));
        resp.target_data.push(TransSentData::ok("b"));
        resp.derive_status();
        assert_eq!(resp.stat_code, StatusCode::Ok);
    }

    #[test]
    fn derive_status_partial() {
        let mut resp = TransJobResp::new(JobId(1), StatusCode::Undefined, "");
        resp.target_data.push(TransSentData::ok("a"));
        resp.target_data.push(TransSentData::failed("b", "boom"));
        resp.derive_status();
        assert_eq!(resp.stat_code, StatusCode::Partial);
    }

    #[test]
    fn derive_status_all_failed() {
        let mut resp = TransJobResp::new(JobId(1), StatusCode::Undefined, "");
        resp.target_data.push(TransSentData::failed("a", "boom"));
        resp.derive_status();
        assert_eq!(resp.stat_code, StatusCode::ResultError);
    }

    #[test]
    fn stack_load_is_omitted_when_absent() {
        let json = serde_json::to_string(&TransSentData::ok("x")).unwrap();
        assert!(!json.contains("stack_load"));

        let json =
            serde_json::to_string(&TransSentData::ok("x").with_stack_load(vec![10, 20])).unwrap();
        assert!(json.contains("\"stack_load\":[10,20]"));
    }
}
