//! Glossa Server - the translation server.
//!
//! One process serves one language pair: it loads the language,
//! translation and reordering models, listens for `trans_job_req`
//! messages, fans the sentences of each job out to a bounded worker pool
//! of sentence decoders, and streams back `trans_job_resp` messages with
//! per-sentence outcomes in input order. A closing session raises the
//! stop flag of its outstanding jobs; their responses are dropped.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod models;
mod service;
mod worker;

pub use error::ServerError;
pub use models::LoadedModels;
pub use service::TranslationService;
pub use worker::{SentenceTask, WorkerPool};

use std::sync::Arc;

use glossa_config::ServerConfig;
use glossa_messaging::{SessionRegistry, WsEndpoint};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A running translation server.
pub struct RunningServer {
    /// The address actually bound (relevant with a `:0` port).
    pub local_addr: std::net::SocketAddr,
    /// Cancel to stop the accept loop.
    pub shutdown: CancellationToken,
    /// The accept-loop task.
    pub task: tokio::task::JoinHandle<Result<(), glossa_messaging::MessagingError>>,
}

/// Load the models and start serving.
///
/// # Errors
///
/// Model and bind failures are fatal and reported before any traffic is
/// accepted.
pub async fn start(config: ServerConfig) -> Result<RunningServer, ServerError> {
    let models = Arc::new(LoadedModels::load(&config)?);
    info!(
        source = %models.source_lang,
        target = %models.target_lang,
        "models loaded"
    );

    let pool = Arc::new(WorkerPool::new(
        config.num_workers,
        Arc::clone(&models),
        config.decoder.to_params(),
    ));

    let registry = Arc::new(SessionRegistry::new());
    let service = Arc::new(TranslationService::new(
        Arc::clone(&registry),
        Arc::clone(&models),
        pool,
    ));
    registry.set_event_sink(Arc::clone(&service) as Arc<dyn glossa_messaging::SessionEventSink>);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    let local_addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();

    let endpoint = WsEndpoint::new(registry, service);
    let token = shutdown.clone();
    let task = tokio::spawn(async move { endpoint.serve(listener, token).await });

    Ok(RunningServer {
        local_addr,
        shutdown,
        task,
    })
}
