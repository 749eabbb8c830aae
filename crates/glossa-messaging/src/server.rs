//! Inbound `WebSocket` endpoint.
//!
//! Accept loop shared by the translation server and the balancer: each
//! accepted connection gets a session in the [`SessionRegistry`], a writer
//! task draining the session's outbound queue, and a read loop that decodes
//! frames into [`WireMsg`] values for the installed [`MessageSink`].

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use glossa_core::SessionId;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::MessagingError;
use crate::msg::WireMsg;
use crate::session::{ConnKey, SessionRegistry};

/// Consumer of decoded inbound messages.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    /// Handle one message from the given session.
    async fn on_message(&self, session_id: SessionId, msg: WireMsg);
}

/// A listening `WebSocket` endpoint.
pub struct WsEndpoint {
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn MessageSink>,
}

impl WsEndpoint {
    /// Create an endpoint over the given registry and message sink.
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, sink: Arc<dyn MessageSink>) -> Self {
        Self { registry, sink }
    }

    /// Run the accept loop until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of a failed `accept`; per-connection errors
    /// only terminate that connection.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), MessagingError> {
        let local = listener.local_addr()?;
        info!(%local, "endpoint listening");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!(%local, "endpoint shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!(%peer, "inbound connection");
                    let registry = Arc::clone(&self.registry);
                    let sink = Arc::clone(&self.sink);
                    let shutdown = shutdown.child_token();
                    tokio::spawn(async move {
                        handle_connection(registry, sink, stream, shutdown).await;
                    });
                }
            }
        }
    }
}

/// Drive one accepted connection until it closes.
async fn handle_connection(
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn MessageSink>,
    stream: TcpStream,
    shutdown: CancellationToken,
) {
    let ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake failed");
            return;
        }
    };
    let (mut writer, mut reader) = ws.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let key = ConnKey::next();
    let session_id = registry.open_session(key, tx);

    // Writer task: drain the session's outbound queue onto the socket.
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if writer.send(frame).await.is_err() {
                break;
            }
        }
        let _ = writer.close().await;
    });

    // Read loop: decode frames and hand them to the sink.
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            frame = reader.next() => match frame {
                Some(Ok(Message::Text(text))) => match WireMsg::parse(&text) {
                    Ok(msg) => sink.on_message(session_id, msg).await,
                    Err(e) => {
                        warn!(%session_id, error = %e, "undecodable message dropped");
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
                Some(Err(e)) => {
                    debug!(%session_id, error = %e, "connection error");
                    break;
                }
            }
        }
    }

    // Mapping removal runs before the close hook; the hook itself runs
    // outside the registry lock.
    registry.close_session(key);
    writer_task.abort();
}
