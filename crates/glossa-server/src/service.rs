//! Job orchestration: one `trans_job_req` in, one `trans_job_resp` out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use glossa_core::{JobId, SessionId, StatusCode};
use glossa_messaging::{
    MessageSink, SessionEventSink, SessionRegistry, SuppLangResp, TransJobReq, TransJobResp,
    TransSentData, WireMsg,
};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::models::LoadedModels;
use crate::worker::{SentenceTask, WorkerPool};

/// One outstanding job's cancellation handle.
struct JobEntry {
    stop: Arc<AtomicBool>,
}

/// The server's message handler and job tracker.
///
/// Cloning shares all interior state; per-job tasks run on owned clones.
#[derive(Clone)]
pub struct TranslationService {
    registry: Arc<SessionRegistry>,
    models: Arc<LoadedModels>,
    pool: Arc<WorkerPool>,
    /// Outstanding jobs keyed by `(session, client job id)`.
    jobs: Arc<DashMap<(SessionId, JobId), JobEntry>>,
}

impl TranslationService {
    /// Wire the service over its collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        models: Arc<LoadedModels>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            registry,
            models,
            pool,
            jobs: Arc::new(DashMap::new()),
        }
    }

    /// Number of jobs currently tracked; used by tests and diagnostics.
    #[must_use]
    pub fn outstanding_jobs(&self) -> usize {
        self.jobs.len()
    }

    fn supported_languages(&self) -> SuppLangResp {
        let mut langs = std::collections::BTreeMap::new();
        langs.insert(
            self.models.source_lang.clone(),
            vec![self.models.target_lang.clone()],
        );
        SuppLangResp::new(langs)
    }

    async fn handle_trans_job(self, session_id: SessionId, req: TransJobReq) {
        let job_id = req.job_id;
        let key = (session_id, job_id);
        let stop = Arc::new(AtomicBool::new(false));
        self.jobs.insert(
            key,
            JobEntry {
                stop: Arc::clone(&stop),
            },
        );
        debug!(%session_id, %job_id, sentences = req.source_sent.len(), "job accepted");

        let mut resp = TransJobResp::new(job_id, StatusCode::Undefined, "");

        if self.models.supports(&req.source_lang, &req.target_lang) {
            resp.target_data = self.decode_sentences(&req, &stop).await;
            resp.derive_status();
        } else {
            for source in &req.source_sent {
                resp.target_data
                    .push(TransSentData::failed(source.as_str(), "Unsupported language pair"));
            }
            resp.stat_code = StatusCode::ResultError;
            resp.stat_msg = format!(
                "This server translates {} to {} only",
                self.models.source_lang, self.models.target_lang
            );
        }

        self.jobs.remove(&key);

        if stop.load(Ordering::Acquire) {
            // The session went away mid-job; nothing to reply to.
            debug!(%session_id, %job_id, "job canceled, response dropped");
            return;
        }

        if !self
            .registry
            .send_response(session_id, &WireMsg::TransJobResp(resp))
        {
            debug!(%session_id, %job_id, "session closed before the response was sent");
        }
    }

    /// Fan the job's sentences over the pool; results keep input order.
    async fn decode_sentences(
        &self,
        req: &TransJobReq,
        stop: &Arc<AtomicBool>,
    ) -> Vec<TransSentData> {
        let mut pending = Vec::with_capacity(req.source_sent.len());
        for source in &req.source_sent {
            let (reply, rx) = oneshot::channel();
            let submitted = self.pool.submit(SentenceTask {
                source: source.clone(),
                want_info: req.is_trans_info,
                stop: Arc::clone(stop),
                reply,
            });
            pending.push((source.as_str(), submitted.then_some(rx)));
        }

        let mut out = Vec::with_capacity(pending.len());
        for (source, rx) in pending {
            let entry = match rx {
                None => TransSentData::failed(source, "Decoder pool is shut down"),
                Some(rx) => match rx.await {
                    Err(_) => TransSentData::failed(source, "Decoder worker died"),
                    Ok(Err(err)) => TransSentData::failed(source, err.to_string()),
                    Ok(Ok(result)) => {
                        let mut entry = TransSentData::ok(result.text);
                        if let Some(loads) = result.stack_loads {
                            entry = entry.with_stack_load(loads);
                        }
                        entry
                    }
                },
            };
            out.push(entry);
        }
        out
    }
}

#[async_trait::async_trait]
impl MessageSink for TranslationService {
    async fn on_message(&self, session_id: SessionId, msg: WireMsg) {
        match msg {
            WireMsg::SuppLangReq(_) => {
                let resp = WireMsg::SuppLangResp(self.supported_languages());
                if !self.registry.send_response(session_id, &resp) {
                    debug!(%session_id, "language listing dropped, session closed");
                }
            }
            WireMsg::TransJobReq(req) => {
                // One task per job; sentences fan out inside it.
                tokio::spawn(self.clone().handle_trans_job(session_id, req));
            }
            other => {
                warn!(%session_id, msg_type = ?other.msg_type(), "unexpected message ignored");
            }
        }
    }
}

impl SessionEventSink for TranslationService {
    fn session_closed(&self, session_id: SessionId) {
        let mut canceled = 0usize;
        for entry in self.jobs.iter() {
            if entry.key().0 == session_id {
                entry.value().stop.store(true, Ordering::Release);
                canceled += 1;
            }
        }
        if canceled > 0 {
            debug!(%session_id, canceled, "outstanding jobs canceled by session close");
        }
    }
}
