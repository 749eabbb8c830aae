//! The session registry.
//!
//! A shared bidirectional mapping between connection handles and session
//! ids, serialised by a single mutex. Close notifications run outside the
//! lock so that the hook may schedule work that re-enters the registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use glossa_core::{IdManager, SessionId};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::msg::WireMsg;

/// Opaque handle for one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnKey(u64);

impl ConnKey {
    /// Issue a fresh key; process-wide unique.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Observer of session lifecycle events.
///
/// `session_closed` is invoked after the registry mappings are gone and
/// outside the registry lock; outstanding work for the session must be
/// cancelled before the call returns.
pub trait SessionEventSink: Send + Sync {
    /// The session has been closed; no response can reach it any more.
    fn session_closed(&self, session_id: SessionId);
}

struct RegistryInner {
    /// Connection handle → session id.
    sessions: HashMap<ConnKey, SessionId>,
    /// Session id → (handle, outbound frame sender).
    handles: HashMap<SessionId, (ConnKey, mpsc::UnboundedSender<Message>)>,
}

/// Bidirectional `connection ↔ session` map with outbound send support.
pub struct SessionRegistry {
    inner: Mutex<RegistryInner>,
    id_mgr: IdManager<SessionId>,
    sink: OnceLock<Arc<dyn SessionEventSink>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                handles: HashMap::new(),
            }),
            id_mgr: IdManager::new(SessionId::MINIMUM),
            sink: OnceLock::new(),
        }
    }

    /// Install the close-notification sink. Later calls are ignored.
    pub fn set_event_sink(&self, sink: Arc<dyn SessionEventSink>) {
        if self.sink.set(sink).is_err() {
            warn!("session event sink is already installed");
        }
    }

    /// Register a connection and allocate its session id.
    ///
    /// A duplicate open for the same handle is ignored with a warning and
    /// returns the already-assigned id.
    pub fn open_session(
        &self,
        key: ConnKey,
        sender: mpsc::UnboundedSender<Message>,
    ) -> SessionId {
        let mut inner = self.inner.lock().expect("session registry poisoned");
        if let Some(&existing) = inner.sessions.get(&key) {
            warn!(%key, session_id = %existing, "connection already has a session");
            return existing;
        }

        let session_id = self.id_mgr.next_id();
        inner.sessions.insert(key, session_id);
        inner.handles.insert(session_id, (key, sender));
        debug!(%key, %session_id, "session opened");
        session_id
    }

    /// Remove a connection's mappings and fire the close hook.
    ///
    /// The hook runs after both map directions are gone and the lock is
    /// released, so responses enqueued concurrently can only fail softly
    /// via [`SessionRegistry::send_response`] returning `false`.
    pub fn close_session(&self, key: ConnKey) {
        let session_id = {
            let mut inner = self.inner.lock().expect("session registry poisoned");
            let session_id = inner.sessions.remove(&key);
            if let Some(id) = session_id {
                inner.handles.remove(&id);
            }
            session_id
        };

        let Some(session_id) = session_id else {
            debug!(%key, "close for an unknown connection");
            return;
        };

        debug!(%key, %session_id, "session closed");
        if let Some(sink) = self.sink.get() {
            sink.session_closed(session_id);
        }
    }

    /// Look up the session id of a connection.
    #[must_use]
    pub fn session_id(&self, key: ConnKey) -> Option<SessionId> {
        let inner = self.inner.lock().expect("session registry poisoned");
        inner.sessions.get(&key).copied()
    }

    /// Serialise `msg` once and enqueue it to the session's connection.
    ///
    /// Returns `false` when the session is gone or its connection writer
    /// has shut down; the caller decides whether to requeue or drop.
    pub fn send_response(&self, session_id: SessionId, msg: &WireMsg) -> bool {
        let Ok(json) = msg.to_json() else {
            warn!(%session_id, "response failed to serialize");
            return false;
        };

        let sender = {
            let inner = self.inner.lock().expect("session registry poisoned");
            inner.handles.get(&session_id).map(|(_, tx)| tx.clone())
        };

        match sender {
            Some(tx) => tx.send(Message::Text(json)).is_ok(),
            None => {
                debug!(%session_id, "no live connection for response");
                false
            }
        }
    }

    /// Number of currently open sessions.
    #[must_use]
    pub fn open_count(&self) -> usize {
        let inner = self.inner.lock().expect("session registry poisoned");
        inner.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use glossa_core::{JobId, StatusCode};

    use super::*;
    use crate::trans_job::TransJobResp;

    struct CountingSink {
        closed: Arc<AtomicU64>,
    }

    impl SessionEventSink for CountingSink {
        fn session_closed(&self, _session_id: SessionId) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn resp_msg() -> WireMsg {
        WireMsg::TransJobResp(TransJobResp::new(JobId(1), StatusCode::Ok, ""))
    }

    #[test]
    fn open_close_round_trip() {
        let registry = SessionRegistry::new();
        let closed = Arc::new(AtomicU64::new(0));
        registry.set_event_sink(Arc::new(CountingSink {
            closed: Arc::clone(&closed),
        }));

        let (tx, _rx) = mpsc::unbounded_channel();
        let key = ConnKey::next();
        let id = registry.open_session(key, tx);
        assert_eq!(registry.session_id(key), Some(id));
        assert_eq!(registry.open_count(), 1);

        registry.close_session(key);
        assert_eq!(registry.session_id(key), None);
        assert_eq!(registry.open_count(), 0);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_open_keeps_the_first_id() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let key = ConnKey::next();
        let first = registry.open_session(key, tx.clone());
        let second = registry.open_session(key, tx);
        assert_eq!(first, second);
        assert_eq!(registry.open_count(), 1);
    }

    #[test]
    fn send_to_a_closed_session_returns_false() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let key = ConnKey::next();
        let id = registry.open_session(key, tx);

        assert!(registry.send_response(id, &resp_msg()));
        assert!(rx.try_recv().is_ok());

        registry.close_session(key);
        assert!(!registry.send_response(id, &resp_msg()));
    }

    #[test]
    fn send_fails_when_the_writer_is_gone() {
        let registry = SessionRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let key = ConnKey::next();
        let id = registry.open_session(key, tx);
        drop(rx);
        assert!(!registry.send_response(id, &resp_msg()));
    }
}
