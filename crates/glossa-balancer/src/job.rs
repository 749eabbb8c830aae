//! The per-job state machine.
//!
//! A balancer job tracks one client request across the two network edges.
//! Its phase advances strictly `Request → Response → Reply → Done`; its
//! state can leave `Active` for `Canceled` (client went away) or `Failed`
//! (translator went away) but never returns. All mutation happens through
//! methods that take the interior lock once, so the original's recursive
//! locking discipline reduces to single-entry sections.

use std::sync::Mutex;

use glossa_core::{JobId, ServerUid, SessionId, StatusCode};
use glossa_messaging::{TransJobReq, TransJobResp, TransSentData};
use tracing::debug;

/// Where the job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobPhase {
    /// Created; the request still has to reach a translator.
    Request,
    /// Forwarded; waiting for the translator's response.
    Response,
    /// A reply (forwarded or synthesised) is ready for the client.
    Reply,
    /// The reply was sent or dropped; the job only awaits reaping.
    Done,
}

/// Health of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Proceeding normally.
    Active,
    /// The client session closed; no reply must be sent.
    Canceled,
    /// Dispatch or the translator failed; an error reply is owed.
    Failed,
}

/// What the reply executor must do for a job that reached `Reply`.
#[derive(Debug)]
pub enum ReplyAction {
    /// Forward the translator's response (job id already restored).
    Forward(Box<TransJobResp>),
    /// Send a synthesised error response.
    Synthesize(Box<TransJobResp>),
    /// Say nothing; the client is gone.
    Drop,
}

struct JobInner {
    phase: JobPhase,
    state: JobState,
    err_msg: String,
    adapter_uid: ServerUid,
    request: TransJobReq,
    response: Option<TransJobResp>,
}

/// One client request as tracked by the balancer.
pub struct BalancerJob {
    session_id: SessionId,
    client_job_id: JobId,
    bal_job_id: JobId,
    inner: Mutex<JobInner>,
}

impl BalancerJob {
    /// Track a fresh request. The balancer job id is assigned here, once.
    #[must_use]
    pub fn new(session_id: SessionId, request: TransJobReq, bal_job_id: JobId) -> Self {
        let client_job_id = request.job_id;
        Self {
            session_id,
            client_job_id,
            bal_job_id,
            inner: Mutex::new(JobInner {
                phase: JobPhase::Request,
                state: JobState::Active,
                err_msg: String::new(),
                request,
                response: None,
                adapter_uid: ServerUid::UNDEFINED,
            }),
        }
    }

    /// The client session this job belongs to.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The job id as assigned by the client.
    #[must_use]
    pub fn client_job_id(&self) -> JobId {
        self.client_job_id
    }

    /// The balancer-issued job id the translator sees.
    #[must_use]
    pub fn bal_job_id(&self) -> JobId {
        self.bal_job_id
    }

    /// The adapter the request went to; undefined before dispatch.
    #[must_use]
    pub fn server_uid(&self) -> ServerUid {
        self.inner.lock().expect("job lock poisoned").adapter_uid
    }

    /// Current phase; primarily for tests and diagnostics.
    #[must_use]
    pub fn phase(&self) -> JobPhase {
        self.inner.lock().expect("job lock poisoned").phase
    }

    /// Current state; primarily for tests and diagnostics.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.inner.lock().expect("job lock poisoned").state
    }

    /// Whether the job is still worth forwarding, and if so, the request
    /// re-issued under the balancer job id.
    ///
    /// Returns `None` when the job was canceled before dispatch; the
    /// caller must then run the reply phase (which will say nothing).
    #[must_use]
    pub fn request_for_dispatch(&self) -> Option<TransJobReq> {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        debug_assert_eq!(inner.phase, JobPhase::Request);
        match inner.state {
            JobState::Active => {
                inner.request.job_id = self.bal_job_id;
                Some(inner.request.clone())
            }
            _ => {
                // Canceled before dispatch; skip the translator entirely.
                inner.phase = JobPhase::Reply;
                None
            }
        }
    }

    /// The request was forwarded through the adapter.
    pub fn mark_sent(&self, adapter_uid: ServerUid) {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        debug_assert_eq!(inner.phase, JobPhase::Request);
        inner.adapter_uid = adapter_uid;
        inner.phase = JobPhase::Response;
    }

    /// Dispatch failed (no adapter, or the send itself failed).
    ///
    /// Marks the job failed and ready for an error reply. Returns `false`
    /// when another path already moved the job to `Reply` or `Done` (e.g.
    /// an adapter-drop notification racing the send); the caller must
    /// then leave the reply execution to that path.
    pub fn fail_dispatch(&self, adapter_uid: ServerUid, err_msg: impl Into<String>) -> bool {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        match inner.phase {
            JobPhase::Request | JobPhase::Response => {
                inner.adapter_uid = adapter_uid;
                if inner.state == JobState::Active {
                    inner.state = JobState::Failed;
                    inner.err_msg = err_msg.into();
                }
                inner.phase = JobPhase::Reply;
                true
            }
            JobPhase::Reply | JobPhase::Done => false,
        }
    }

    /// The translator's response arrived.
    ///
    /// Returns `false` when the job is not awaiting a response (stale or
    /// duplicate delivery); the response is dropped then.
    pub fn set_response(&self, response: TransJobResp) -> bool {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        if inner.phase != JobPhase::Response {
            debug!(bal_job_id = %self.bal_job_id, phase = ?inner.phase, "stale response dropped");
            return false;
        }
        inner.response = Some(response);
        inner.phase = JobPhase::Reply;
        true
    }

    /// The client session closed.
    ///
    /// Only the state flips; whatever executor eventually reaches the
    /// reply phase will observe it and stay silent.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        match inner.phase {
            JobPhase::Request | JobPhase::Response | JobPhase::Reply => {
                inner.state = JobState::Canceled;
            }
            JobPhase::Done => {}
        }
    }

    /// The adapter carrying this job disconnected.
    ///
    /// Returns `true` when the job moved to the reply phase and the caller
    /// must execute it. A job already canceled keeps its state (the client
    /// is gone anyway); a job already in `Reply` or `Done` is left alone.
    pub fn fail(&self) -> bool {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        match inner.phase {
            JobPhase::Response => {
                if inner.state == JobState::Active {
                    inner.state = JobState::Failed;
                    inner.err_msg = "The translation server has dropped connection!".to_owned();
                }
                inner.phase = JobPhase::Reply;
                true
            }
            JobPhase::Request | JobPhase::Reply | JobPhase::Done => false,
        }
    }

    /// Resolve the reply phase and advance to `Done`.
    ///
    /// The forwarded response leaves this method carrying the client's
    /// original job id; a synthesised response echoes the request's
    /// sentences with per-sentence failure entries.
    #[must_use]
    pub fn take_reply(&self) -> ReplyAction {
        let mut inner = self.inner.lock().expect("job lock poisoned");
        debug_assert_eq!(inner.phase, JobPhase::Reply);
        let action = match inner.state {
            JobState::Active => match inner.response.take() {
                Some(mut resp) => {
                    resp.job_id = self.client_job_id;
                    ReplyAction::Forward(Box::new(resp))
                }
                None => {
                    // Reply phase with neither response nor failure is a
                    // bug; synthesise rather than go silent.
                    ReplyAction::Synthesize(Box::new(self.error_response(
                        &inner.request,
                        "Internal balancer error",
                    )))
                }
            },
            JobState::Canceled => ReplyAction::Drop,
            JobState::Failed => ReplyAction::Synthesize(Box::new(
                self.error_response(&inner.request, &inner.err_msg.clone()),
            )),
        };
        inner.phase = JobPhase::Done;
        action
    }

    /// Build the synthesised error reply: the client's job id, the overall
    /// error text, and one failed entry per source sentence.
    fn error_response(&self, request: &TransJobReq, err_msg: &str) -> TransJobResp {
        let mut resp = TransJobResp::new(self.client_job_id, StatusCode::ResultError, err_msg);
        for source in &request.source_sent {
            resp.target_data
                .push(TransSentData::failed(source.as_str(), "Failed to translate"));
        }
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(job_id: u64, sentences: &[&str]) -> TransJobReq {
        TransJobReq::new(
            JobId(job_id),
            "en",
            "de",
            false,
            0,
            sentences.iter().map(|s| (*s).to_owned()).collect(),
        )
    }

    fn job() -> BalancerJob {
        BalancerJob::new(SessionId(1), req(7, &["a", "b"]), JobId(100))
    }

    #[test]
    fn happy_path_phases_are_monotone() {
        let job = job();
        assert_eq!(job.phase(), JobPhase::Request);

        let dispatched = job.request_for_dispatch().unwrap();
        assert_eq!(dispatched.job_id, JobId(100));

        job.mark_sent(ServerUid(9));
        assert_eq!(job.phase(), JobPhase::Response);
        assert_eq!(job.server_uid(), ServerUid(9));

        let mut resp = TransJobResp::new(JobId(100), StatusCode::Ok, "");
        resp.target_data.push(TransSentData::ok("x"));
        resp.target_data.push(TransSentData::ok("y"));
        assert!(job.set_response(resp));
        assert_eq!(job.phase(), JobPhase::Reply);

        match job.take_reply() {
            ReplyAction::Forward(resp) => {
                // Only the job id differs from the translator's message.
                assert_eq!(resp.job_id, JobId(7));
                assert_eq!(resp.target_data.len(), 2);
            }
            other => panic!("unexpected action: {other:?}"),
        }
        assert_eq!(job.phase(), JobPhase::Done);
    }

    #[test]
    fn no_adapter_synthesises_equal_arity() {
        let job = job();
        let _ = job.request_for_dispatch().unwrap();
        job.fail_dispatch(
            ServerUid::UNDEFINED,
            "There are no online servers to perform your translation request!",
        );
        assert_eq!(job.state(), JobState::Failed);

        match job.take_reply() {
            ReplyAction::Synthesize(resp) => {
                assert_eq!(resp.job_id, JobId(7));
                assert_eq!(resp.stat_code, StatusCode::ResultError);
                assert_eq!(resp.target_data.len(), 2);
                assert_eq!(resp.target_data[0].trans_text, "a");
                assert_eq!(resp.target_data[0].stat_msg, "Failed to translate");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn translator_drop_fails_the_awaiting_job() {
        let job = job();
        let _ = job.request_for_dispatch().unwrap();
        job.mark_sent(ServerUid(9));

        assert!(job.fail());
        assert_eq!(job.state(), JobState::Failed);
        match job.take_reply() {
            ReplyAction::Synthesize(resp) => {
                assert_eq!(
                    resp.stat_msg,
                    "The translation server has dropped connection!"
                );
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn cancel_keeps_the_phase_and_silences_the_reply() {
        let job = job();
        let _ = job.request_for_dispatch().unwrap();
        job.mark_sent(ServerUid(9));
        job.cancel();
        assert_eq!(job.phase(), JobPhase::Response);
        assert_eq!(job.state(), JobState::Canceled);

        // Translator drop after the cancel keeps the canceled state.
        assert!(job.fail());
        assert_eq!(job.state(), JobState::Canceled);
        assert!(matches!(job.take_reply(), ReplyAction::Drop));
    }

    #[test]
    fn cancel_before_dispatch_skips_the_translator() {
        let job = job();
        job.cancel();
        assert!(job.request_for_dispatch().is_none());
        assert_eq!(job.phase(), JobPhase::Reply);
        assert!(matches!(job.take_reply(), ReplyAction::Drop));
    }

    #[test]
    fn stale_responses_are_dropped() {
        let job = job();
        let _ = job.request_for_dispatch().unwrap();
        job.mark_sent(ServerUid(9));
        assert!(job.set_response(TransJobResp::new(JobId(100), StatusCode::Ok, "")));
        // A duplicate delivery must not regress the phase.
        assert!(!job.set_response(TransJobResp::new(JobId(100), StatusCode::Ok, "")));
        assert_eq!(job.phase(), JobPhase::Reply);
    }

    #[test]
    fn fail_after_reply_is_a_no_op() {
        let job = job();
        let _ = job.request_for_dispatch().unwrap();
        job.fail_dispatch(ServerUid::UNDEFINED, "no servers");
        assert!(!job.fail());
        assert_eq!(job.state(), JobState::Failed);
    }
}
