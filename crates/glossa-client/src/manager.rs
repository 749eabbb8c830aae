//! The client manager: batching, job tracking, result assembly.

use std::collections::HashMap;
use std::ops::Range;
use std::time::Duration;

use glossa_core::{IdManager, JobId, StatusCode};
use glossa_messaging::{
    ConnectParams, TlsMode, TransJobReq, TransJobResp, WireMsg, WsConnection,
};
use tracing::{debug, info, warn};

use crate::error::ClientError;

/// Poll interval while waiting for outstanding responses.
const WAIT_POLL: Duration = Duration::from_secs(1);

/// What one run needs to know.
#[derive(Debug, Clone)]
pub struct ClientParams {
    /// Translation endpoint (balancer or server).
    pub trans_uri: String,
    /// TLS mode of the translation endpoint.
    pub trans_tls: TlsMode,
    /// Source language.
    pub source_lang: String,
    /// Target language.
    pub target_lang: String,
    /// Smallest batch the client will send.
    pub min_sentences: usize,
    /// Largest batch the client will send.
    pub max_sentences: usize,
    /// Job priority.
    pub priority: i32,
    /// Request per-stack search statistics.
    pub is_trans_info: bool,
}

/// Outcome for one input sentence.
#[derive(Debug, Clone)]
pub struct SentenceOutcome {
    /// Target text (or echoed source on failure).
    pub text: String,
    /// Sentence status.
    pub status: StatusCode,
    /// Status detail.
    pub detail: String,
    /// Stack loads when translation info was requested.
    pub stack_load: Option<Vec<u32>>,
}

/// Split `len` sentences into batches of `min..=max`.
///
/// Batches are `max` long; a final fragment shorter than `min` is merged
/// into the previous batch rather than sent alone.
#[must_use]
pub fn batch_ranges(len: usize, min: usize, max: usize) -> Vec<Range<usize>> {
    let max = max.max(1);
    let min = min.clamp(1, max);
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut start = 0;
    while start < len {
        let end = (start + max).min(len);
        ranges.push(start..end);
        start = end;
    }
    if ranges.len() >= 2 {
        let last = ranges.last().expect("non-empty").clone();
        if last.len() < min {
            let prev = ranges.len() - 2;
            ranges[prev].end = last.end;
            ranges.pop();
        }
    }
    ranges
}

/// Drives one batch-translate run over a single connection.
pub struct ClientManager {
    params: ClientParams,
    id_mgr: IdManager<JobId>,
}

impl ClientManager {
    /// Create a manager for the given run parameters.
    #[must_use]
    pub fn new(params: ClientParams) -> Self {
        Self {
            params,
            id_mgr: IdManager::new(JobId::MINIMUM),
        }
    }

    /// Translate all sentences, returning one outcome per input sentence
    /// in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when the endpoint is unreachable. A closed
    /// connection mid-run is not an error: unanswered jobs surface as
    /// failed sentence outcomes.
    pub async fn translate(
        &self,
        sentences: &[String],
    ) -> Result<Vec<SentenceOutcome>, ClientError> {
        if sentences.is_empty() {
            return Ok(Vec::new());
        }

        let connect = ConnectParams::plain(self.params.trans_uri.as_str())
            .with_tls(self.params.trans_tls);
        let mut conn = WsConnection::connect(&connect).await?;

        // Send every batch; jobs are answered out of order.
        let ranges = batch_ranges(
            sentences.len(),
            self.params.min_sentences,
            self.params.max_sentences,
        );
        let mut jobs: Vec<(JobId, Range<usize>)> = Vec::with_capacity(ranges.len());
        for range in ranges {
            let job_id = self.id_mgr.next_id();
            let req = TransJobReq::new(
                job_id,
                self.params.source_lang.clone(),
                self.params.target_lang.clone(),
                self.params.is_trans_info,
                self.params.priority,
                sentences[range.clone()]
                    .iter()
                    .map(|s| s.to_lowercase())
                    .collect(),
            );
            conn.send(&WireMsg::TransJobReq(req)).await?;
            jobs.push((job_id, range));
        }
        info!(jobs = jobs.len(), sentences = sentences.len(), "all jobs sent");

        // Wait for every response with a coarse poll so progress (and the
        // death of the connection) is noticed within a second.
        let mut responses: HashMap<JobId, TransJobResp> = HashMap::new();
        let mut closed = false;
        while responses.len() < jobs.len() && !closed {
            match tokio::time::timeout(WAIT_POLL, conn.recv()).await {
                Err(_) => {
                    debug!(
                        outstanding = jobs.len() - responses.len(),
                        "still waiting for responses"
                    );
                }
                Ok(Ok(Some(WireMsg::TransJobResp(resp)))) => {
                    debug!(job_id = %resp.job_id, status = %resp.stat_code, "job answered");
                    responses.insert(resp.job_id, resp);
                }
                Ok(Ok(Some(other))) => {
                    warn!(msg_type = ?other.msg_type(), "unexpected message ignored");
                }
                Ok(Ok(None)) => {
                    warn!("connection closed by the server");
                    closed = true;
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "connection failed");
                    closed = true;
                }
            }
        }
        let _ = conn.close().await;

        Ok(assemble(sentences, &jobs, &mut responses))
    }
}

/// Stitch job responses back into input order.
fn assemble(
    sentences: &[String],
    jobs: &[(JobId, Range<usize>)],
    responses: &mut HashMap<JobId, TransJobResp>,
) -> Vec<SentenceOutcome> {
    let mut out = Vec::with_capacity(sentences.len());
    for (job_id, range) in jobs {
        match responses.remove(job_id) {
            Some(resp) if resp.target_data.len() == range.len() => {
                for entry in resp.target_data {
                    out.push(SentenceOutcome {
                        text: entry.trans_text,
                        status: entry.stat_code,
                        detail: entry.stat_msg,
                        stack_load: entry.stack_load,
                    });
                }
            }
            Some(resp) => {
                warn!(
                    %job_id,
                    got = resp.target_data.len(),
                    want = range.len(),
                    "sentence arity mismatch, echoing sources"
                );
                push_failed(&mut out, &sentences[range.clone()], "Malformed response");
            }
            None => {
                push_failed(&mut out, &sentences[range.clone()], "No response received");
            }
        }
    }
    out
}

fn push_failed(out: &mut Vec<SentenceOutcome>, sources: &[String], detail: &str) {
    for source in sources {
        out.push(SentenceOutcome {
            text: source.clone(),
            status: StatusCode::ResultError,
            detail: detail.to_owned(),
            stack_load: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_cover_everything_once() {
        for (len, min, max) in [(10, 2, 4), (1, 1, 8), (9, 3, 3), (7, 2, 10)] {
            let ranges = batch_ranges(len, min, max);
            let total: usize = ranges.iter().map(Range::len).sum();
            assert_eq!(total, len, "len={len} min={min} max={max}");
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
    }

    #[test]
    fn short_tail_is_merged_into_the_previous_batch() {
        let ranges = batch_ranges(9, 3, 4);
        // 4 + 4 + 1 would leave a lone sentence below min; the tail joins
        // the second batch instead.
        assert_eq!(ranges, vec![0..4, 4..9]);
    }

    #[test]
    fn single_short_input_is_one_batch() {
        assert_eq!(batch_ranges(2, 5, 10), vec![0..2]);
    }
}
