//! One outbound connection to a translation server.
//!
//! The adapter owns the link lifecycle: connect, language discovery,
//! response delivery, and reconnection with full-jitter backoff after a
//! drop. It holds no job references; the dispatcher correlates responses
//! through its own tables, keyed by the balancer job id.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use glossa_config::ReconnectConfig;
use glossa_core::ServerUid;
use glossa_messaging::{ConnectParams, SuppLangReq, SuppLangResp, TransJobResp, WireMsg, WsConnection};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::BalancerError;

/// Reconnect pacing for one translator link.
///
/// Every failed connect cycle doubles a delay ceiling up to the
/// configured cap; the pause actually slept is drawn uniformly below the
/// ceiling, so balancers sharing a recovering translator do not retry in
/// lockstep. A successful connection drops the ceiling back to the base.
struct ReconnectSchedule {
    base: Duration,
    cap: Duration,
    ceiling: Duration,
}

impl ReconnectSchedule {
    fn new(config: &ReconnectConfig) -> Self {
        let base = Duration::from_millis(config.base_ms.max(1));
        let cap = Duration::from_millis(config.max_ms).max(base);
        Self {
            base,
            cap,
            ceiling: base,
        }
    }

    /// The pause before the next connect cycle.
    fn pause(&mut self) -> Duration {
        let ceiling_ms = u64::try_from(self.ceiling.as_millis()).unwrap_or(u64::MAX);
        let pause = Duration::from_millis(fastrand::u64(0..=ceiling_ms));
        self.ceiling = self.ceiling.saturating_mul(2).min(self.cap);
        pause
    }

    /// The translator answered; start the next outage gently again.
    fn connected(&mut self) {
        self.ceiling = self.base;
    }
}

/// Dispatcher-side callbacks of an adapter.
#[async_trait::async_trait]
pub trait AdapterEvents: Send + Sync {
    /// A translator response arrived on this adapter.
    async fn on_response(&self, response: TransJobResp);

    /// The adapter learned (or re-learned) its translator's languages.
    fn on_languages(&self, uid: ServerUid, languages: &SuppLangResp);

    /// The adapter lost its connection; every in-flight job bound to the
    /// uid must be failed.
    async fn on_disconnect(&self, uid: ServerUid);
}

/// A balancer-side wrapper around one translator connection.
pub struct TranslatorAdapter {
    uid: ServerUid,
    params: ConnectParams,
    /// Sender into the live connection's write loop; `None` while down.
    link: Mutex<Option<mpsc::UnboundedSender<WireMsg>>>,
    /// Languages reported by the translator; `None` while down.
    languages: RwLock<Option<SuppLangResp>>,
}

impl TranslatorAdapter {
    /// Create an adapter for the given connection parameters.
    #[must_use]
    pub fn new(uid: ServerUid, mut params: ConnectParams) -> Arc<Self> {
        // The run loop's backoff owns retry pacing; a connect cycle makes
        // a single attempt.
        params.max_retries = 1;
        Arc::new(Self {
            uid,
            params,
            link: Mutex::new(None),
            languages: RwLock::new(None),
        })
    }

    /// The stable uid of this adapter.
    #[must_use]
    pub fn uid(&self) -> ServerUid {
        self.uid
    }

    /// Whether a connection is currently up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.link.lock().expect("adapter link poisoned").is_some()
    }

    /// Whether the connected translator serves the pair.
    #[must_use]
    pub fn supports(&self, source: &str, target: &str) -> bool {
        self.languages
            .read()
            .expect("adapter languages poisoned")
            .as_ref()
            .is_some_and(|langs| langs.supports(source, target))
    }

    /// The last reported language listing, while connected.
    #[must_use]
    pub fn languages(&self) -> Option<SuppLangResp> {
        self.languages
            .read()
            .expect("adapter languages poisoned")
            .clone()
    }

    /// Enqueue a message to the translator.
    ///
    /// # Errors
    ///
    /// Returns [`BalancerError::Disconnected`] when no connection is up.
    pub fn send(&self, msg: WireMsg) -> Result<(), BalancerError> {
        let sender = self
            .link
            .lock()
            .expect("adapter link poisoned")
            .clone()
            .ok_or(BalancerError::Disconnected(self.uid))?;
        sender
            .send(msg)
            .map_err(|_| BalancerError::Disconnected(self.uid))
    }

    /// Drive the adapter until shutdown: connect, serve, back off, repeat.
    pub async fn run(
        self: Arc<Self>,
        events: Arc<dyn AdapterEvents>,
        reconnect: ReconnectConfig,
        shutdown: CancellationToken,
    ) {
        let mut schedule = ReconnectSchedule::new(&reconnect);

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            match WsConnection::connect(&self.params).await {
                Err(e) => {
                    debug!(uid = %self.uid, uri = %self.params.uri, error = %e, "connect failed");
                }
                Ok(conn) => {
                    schedule.connected();
                    info!(uid = %self.uid, uri = %self.params.uri, "translator connected");
                    self.serve_connection(conn, &events, &shutdown).await;
                    if shutdown.is_cancelled() {
                        return;
                    }
                    warn!(uid = %self.uid, uri = %self.params.uri, "translator disconnected");
                    events.on_disconnect(self.uid).await;
                }
            }

            let pause = schedule.pause();
            tokio::select! {
                () = shutdown.cancelled() => return,
                () = tokio::time::sleep(pause) => {}
            }
        }
    }

    /// Pump one live connection until it drops or shutdown fires.
    async fn serve_connection(
        &self,
        mut conn: WsConnection,
        events: &Arc<dyn AdapterEvents>,
        shutdown: &CancellationToken,
    ) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WireMsg>();
        *self.link.lock().expect("adapter link poisoned") = Some(tx);

        // Discover the translator's languages right away.
        if let Err(e) = conn.send(&WireMsg::SuppLangReq(SuppLangReq::new())).await {
            debug!(uid = %self.uid, error = %e, "language discovery send failed");
        }

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    let _ = conn.close().await;
                    break;
                }
                outbound = rx.recv() => match outbound {
                    Some(msg) => {
                        if conn.send(&msg).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                inbound = conn.recv() => match inbound {
                    Ok(Some(WireMsg::TransJobResp(resp))) => events.on_response(resp).await,
                    Ok(Some(WireMsg::SuppLangResp(langs))) => {
                        events.on_languages(self.uid, &langs);
                        *self.languages.write().expect("adapter languages poisoned") =
                            Some(langs);
                    }
                    Ok(Some(other)) => {
                        warn!(uid = %self.uid, msg_type = ?other.msg_type(), "unexpected message from translator");
                    }
                    Ok(None) => break,
                    Err(e) => {
                        debug!(uid = %self.uid, error = %e, "translator link error");
                        break;
                    }
                }
            }
        }

        *self.link.lock().expect("adapter link poisoned") = None;
        *self.languages.write().expect("adapter languages poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(base_ms: u64, max_ms: u64) -> ReconnectSchedule {
        ReconnectSchedule::new(&ReconnectConfig { base_ms, max_ms })
    }

    #[test]
    fn first_pause_stays_under_the_base() {
        for _ in 0..100 {
            let mut s = schedule(500, 60_000);
            assert!(s.pause() <= Duration::from_millis(500));
        }
    }

    #[test]
    fn pauses_never_exceed_the_cap() {
        let mut s = schedule(1_000, 4_000);
        for _ in 0..20 {
            assert!(s.pause() <= Duration::from_millis(4_000));
        }
    }

    #[test]
    fn a_connection_resets_the_ceiling() {
        let mut s = schedule(1_000, 60_000);
        let _ = s.pause();
        let _ = s.pause();
        s.connected();
        assert!(s.pause() <= Duration::from_millis(1_000));
    }

    #[test]
    fn degenerate_config_is_clamped_sane() {
        // A zero base or an inverted cap must not underflow the schedule.
        let mut s = schedule(0, 0);
        assert!(s.pause() <= Duration::from_millis(1));
    }

    #[test]
    fn send_without_a_link_is_disconnected() {
        let adapter = TranslatorAdapter::new(
            ServerUid(1),
            ConnectParams::plain("ws://127.0.0.1:9"),
        );
        assert!(!adapter.is_connected());
        let err = adapter
            .send(WireMsg::SuppLangReq(SuppLangReq::new()))
            .unwrap_err();
        assert!(matches!(err, BalancerError::Disconnected(ServerUid(1))));
    }

    #[test]
    fn supports_requires_a_language_listing() {
        let adapter = TranslatorAdapter::new(
            ServerUid(2),
            ConnectParams::plain("ws://127.0.0.1:9"),
        );
        assert!(!adapter.supports("en", "de"));
    }
}
