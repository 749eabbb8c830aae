//! The balancer job pool and dispatcher.
//!
//! Owns every [`BalancerJob`], chooses adapters, correlates translator
//! responses by balancer job id, and cascades session closes and adapter
//! drops onto the affected jobs. Adapters and jobs never reference each
//! other directly: a job remembers only the adapter's uid, and in-flight
//! associations live in the awaiting table here.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use glossa_core::{IdManager, JobId, ServerUid, SessionId};
use glossa_messaging::{
    SessionRegistry, SuppLangResp, TransJobReq, TransJobResp, WireMsg,
};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterEvents, TranslatorAdapter};
use crate::job::{BalancerJob, ReplyAction};

/// Error text when the chooser comes up empty.
const NO_SERVERS_MSG: &str = "There are no online servers to perform your translation request!";

/// One job waiting for a request-phase worker.
///
/// Ordered by priority (urgent first), then by arrival (oldest first).
struct PendingJob {
    priority: i32,
    seq: u64,
    job: Arc<BalancerJob>,
}

impl PartialEq for PendingJob {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for PendingJob {}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap: higher priority wins, then lower seq.
        self.priority
            .cmp(&other.priority)
            .then(other.seq.cmp(&self.seq))
    }
}

/// The dispatch fabric of one balancer process.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    /// Every live job, keyed by balancer job id.
    jobs: DashMap<JobId, Arc<BalancerJob>>,
    /// Jobs in the response phase, keyed by balancer job id.
    awaiting: DashMap<JobId, Arc<BalancerJob>>,
    /// Balancer job ids per client session, for cascade cancel.
    session_index: DashMap<SessionId, Vec<JobId>>,
    /// The configured adapters.
    adapters: RwLock<Vec<Arc<TranslatorAdapter>>>,
    /// Issues balancer job ids, process-wide monotone.
    id_mgr: IdManager<JobId>,
    /// Round-robin cursor of the chooser.
    cursor: AtomicUsize,
    /// Jobs waiting for a request-phase worker, urgent first.
    queue: Mutex<BinaryHeap<PendingJob>>,
    /// Wakes the request-phase workers.
    queue_notify: Notify,
    /// Arrival stamps for FIFO order within one priority.
    seq: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher over the client-session registry.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>) -> Arc<Self> {
        Arc::new(Self {
            registry,
            jobs: DashMap::new(),
            awaiting: DashMap::new(),
            session_index: DashMap::new(),
            adapters: RwLock::new(Vec::new()),
            id_mgr: IdManager::new(JobId::MINIMUM),
            cursor: AtomicUsize::new(0),
            queue: Mutex::new(BinaryHeap::new()),
            queue_notify: Notify::new(),
            seq: AtomicU64::new(0),
        })
    }

    /// Spawn the request-phase workers.
    pub fn start_workers(self: Arc<Self>, num_workers: usize, shutdown: CancellationToken) {
        for worker in 0..num_workers.max(1) {
            let dispatcher = Arc::clone(&self);
            let token = shutdown.child_token();
            tokio::spawn(async move {
                debug!(worker, "dispatch worker up");
                dispatcher.worker_loop(token).await;
                debug!(worker, "dispatch worker down");
            });
        }
    }

    async fn worker_loop(&self, shutdown: CancellationToken) {
        loop {
            let next = self.queue.lock().expect("dispatch queue poisoned").pop();
            match next {
                Some(pending) => self.run_request_phase(&pending.job),
                None => {
                    tokio::select! {
                        () = shutdown.cancelled() => return,
                        () = self.queue_notify.notified() => {}
                    }
                }
            }
        }
    }

    /// Register an adapter with the chooser.
    pub fn add_adapter(&self, adapter: Arc<TranslatorAdapter>) {
        self.adapters
            .write()
            .expect("adapter list poisoned")
            .push(adapter);
    }

    /// Jobs currently tracked; used by tests and diagnostics.
    #[must_use]
    pub fn outstanding_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Jobs awaiting a translator response.
    #[must_use]
    pub fn awaiting_responses(&self) -> usize {
        self.awaiting.len()
    }

    /// Union of the languages served by the connected translators.
    #[must_use]
    pub fn supported_languages(&self) -> SuppLangResp {
        let mut merged: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for adapter in self.adapters.read().expect("adapter list poisoned").iter() {
            if let Some(langs) = adapter.languages() {
                for (source, targets) in langs.langs {
                    merged.entry(source).or_default().extend(targets);
                }
            }
        }
        SuppLangResp::new(
            merged
                .into_iter()
                .map(|(source, targets)| (source, targets.into_iter().collect()))
                .collect(),
        )
    }

    /// Round-robin over the adapters currently able to serve the pair.
    fn choose_adapter(&self, req: &TransJobReq) -> Option<Arc<TranslatorAdapter>> {
        let adapters = self.adapters.read().expect("adapter list poisoned");
        let eligible: Vec<_> = adapters
            .iter()
            .filter(|a| a.is_connected() && a.supports(&req.source_lang, &req.target_lang))
            .collect();
        if eligible.is_empty() {
            return None;
        }
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % eligible.len();
        Some(Arc::clone(eligible[slot]))
    }

    /// Accept one client request: create the job and queue its request
    /// phase, urgent priorities first.
    pub fn dispatch(&self, session_id: SessionId, request: TransJobReq) {
        let bal_job_id = self.id_mgr.next_id();
        let priority = request.priority;
        let job = Arc::new(BalancerJob::new(session_id, request, bal_job_id));

        self.jobs.insert(bal_job_id, Arc::clone(&job));
        self.session_index
            .entry(session_id)
            .or_default()
            .push(bal_job_id);
        debug!(%session_id, client_job_id = %job.client_job_id(), %bal_job_id, priority, "job queued");

        self.queue
            .lock()
            .expect("dispatch queue poisoned")
            .push(PendingJob {
                priority,
                seq: self.seq.fetch_add(1, Ordering::Relaxed),
                job,
            });
        self.queue_notify.notify_one();
    }

    /// The request-phase executor.
    fn run_request_phase(&self, job: &Arc<BalancerJob>) {
        let Some(request) = job.request_for_dispatch() else {
            // Canceled before dispatch.
            self.execute_reply(job);
            return;
        };

        match self.choose_adapter(&request) {
            None => {
                if job.fail_dispatch(ServerUid::UNDEFINED, NO_SERVERS_MSG) {
                    self.execute_reply(job);
                }
            }
            Some(adapter) => {
                // Register before sending: a disconnect landing between
                // the two must still find the job in the awaiting table.
                job.mark_sent(adapter.uid());
                self.awaiting.insert(job.bal_job_id(), Arc::clone(job));
                if let Err(e) = adapter.send(WireMsg::TransJobReq(request)) {
                    self.awaiting.remove(&job.bal_job_id());
                    if job.fail_dispatch(adapter.uid(), e.to_string()) {
                        self.execute_reply(job);
                    }
                }
            }
        }
    }

    /// The reply-phase executor: send (or drop) and reap.
    fn execute_reply(&self, job: &Arc<BalancerJob>) {
        match job.take_reply() {
            ReplyAction::Forward(resp) | ReplyAction::Synthesize(resp) => {
                if !self
                    .registry
                    .send_response(job.session_id(), &WireMsg::TransJobResp(*resp))
                {
                    debug!(
                        session_id = %job.session_id(),
                        client_job_id = %job.client_job_id(),
                        "client session closed, reply dropped"
                    );
                }
            }
            ReplyAction::Drop => {
                debug!(
                    session_id = %job.session_id(),
                    client_job_id = %job.client_job_id(),
                    "canceled job reaped without a reply"
                );
            }
        }
        self.reap(job);
    }

    /// Remove a done job from every table.
    fn reap(&self, job: &Arc<BalancerJob>) {
        let bal_job_id = job.bal_job_id();
        self.jobs.remove(&bal_job_id);
        self.awaiting.remove(&bal_job_id);
        if let Some(mut ids) = self.session_index.get_mut(&job.session_id()) {
            ids.retain(|id| *id != bal_job_id);
        }
    }

    /// Cascade a client session close onto its jobs.
    pub fn cancel_session(&self, session_id: SessionId) {
        let Some((_, ids)) = self.session_index.remove(&session_id) else {
            return;
        };
        let mut canceled = 0usize;
        for id in ids {
            if let Some(job) = self.jobs.get(&id).map(|j| Arc::clone(j.value())) {
                job.cancel();
                canceled += 1;
            }
        }
        if canceled > 0 {
            info!(%session_id, canceled, "session close canceled outstanding jobs");
        }
    }
}

#[async_trait::async_trait]
impl AdapterEvents for Dispatcher {
    async fn on_response(&self, response: TransJobResp) {
        let bal_job_id = response.job_id;
        let Some((_, job)) = self.awaiting.remove(&bal_job_id) else {
            warn!(%bal_job_id, "unsolicited translator response dropped");
            return;
        };
        if job.set_response(response) {
            self.execute_reply(&job);
        }
    }

    fn on_languages(&self, uid: ServerUid, languages: &SuppLangResp) {
        debug!(%uid, pairs = languages.langs.len(), "translator languages updated");
    }

    async fn on_disconnect(&self, uid: ServerUid) {
        // Collect first: failing a job mutates the awaiting table.
        let affected: Vec<Arc<BalancerJob>> = self
            .awaiting
            .iter()
            .filter(|entry| entry.value().server_uid() == uid)
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        if affected.is_empty() {
            return;
        }
        warn!(%uid, failed = affected.len(), "adapter drop fails in-flight jobs");

        for job in affected {
            self.awaiting.remove(&job.bal_job_id());
            if job.fail() {
                self.execute_reply(&job);
            }
        }
    }
}
