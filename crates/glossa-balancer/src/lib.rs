//! Glossa Balancer - the load balancer between clients and translators.
//!
//! Clients connect over WebSocket exactly as they would to a translation
//! server; the balancer re-issues each job under its own id, forwards it
//! to a chosen translator adapter, and restores the client's id on the
//! way back. Adapter drops fail the affected jobs with a synthesised
//! error reply; client disconnects cancel theirs silently.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod adapter;
mod dispatcher;
mod error;
mod job;
mod service;

pub use adapter::{AdapterEvents, TranslatorAdapter};
pub use dispatcher::Dispatcher;
pub use error::BalancerError;
pub use job::{BalancerJob, JobPhase, JobState, ReplyAction};
pub use service::BalancerService;

use std::str::FromStr;
use std::sync::Arc;

use glossa_config::BalancerConfig;
use glossa_core::{IdManager, ServerUid};
use glossa_messaging::{ConnectParams, SessionRegistry, TlsMode, WsEndpoint};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A running balancer.
pub struct RunningBalancer {
    /// The address actually bound (relevant with a `:0` port).
    pub local_addr: std::net::SocketAddr,
    /// The dispatch fabric; exposed for diagnostics and tests.
    pub dispatcher: Arc<Dispatcher>,
    /// Cancel to stop the accept loop and the adapters.
    pub shutdown: CancellationToken,
    /// The accept-loop task.
    pub task: tokio::task::JoinHandle<Result<(), glossa_messaging::MessagingError>>,
}

/// Start the balancer: adapters first, then the client endpoint.
///
/// # Errors
///
/// Returns [`BalancerError`] for invalid translator parameters or a bind
/// failure; adapters that cannot connect yet are not an error, they keep
/// retrying in the background.
pub async fn start(config: BalancerConfig) -> Result<RunningBalancer, BalancerError> {
    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry));
    let shutdown = CancellationToken::new();
    Arc::clone(&dispatcher).start_workers(config.num_workers, shutdown.child_token());

    let uid_mgr = IdManager::new(ServerUid::MINIMUM);
    for translator in &config.translators {
        let tls_mode = match &translator.tls_mode {
            None => TlsMode::Undefined,
            Some(name) => TlsMode::from_str(name)?,
        };
        let mut params = ConnectParams::plain(translator.uri.as_str()).with_tls(tls_mode);
        params.ciphers = translator.ciphers.clone();

        let adapter = TranslatorAdapter::new(uid_mgr.next_id(), params);
        dispatcher.add_adapter(Arc::clone(&adapter));
        tokio::spawn(adapter.run(
            Arc::clone(&dispatcher) as Arc<dyn AdapterEvents>,
            config.reconnect.clone(),
            shutdown.child_token(),
        ));
    }
    info!(translators = config.translators.len(), "adapters starting");

    let service = Arc::new(BalancerService::new(
        Arc::clone(&registry),
        Arc::clone(&dispatcher),
    ));
    registry.set_event_sink(Arc::clone(&service) as Arc<dyn glossa_messaging::SessionEventSink>);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    let local_addr = listener.local_addr()?;

    let endpoint = WsEndpoint::new(registry, service);
    let token = shutdown.clone();
    let task = tokio::spawn(async move { endpoint.serve(listener, token).await });

    Ok(RunningBalancer {
        local_addr,
        dispatcher,
        shutdown,
        task,
    })
}
