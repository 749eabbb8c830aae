//! Outbound `WebSocket` connections.
//!
//! Wraps the split read/write halves of a `tokio-tungstenite` stream and
//! provides typed send/receive for [`WireMsg`]. Connection attempts are
//! retried a bounded number of times with a fixed delay.

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::error::MessagingError;
use crate::msg::WireMsg;
use crate::tls::TlsMode;

/// Type alias for the `WebSocket` stream used throughout the crate.
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default bound on connection attempts.
pub const MAX_CONNECT_RETRIES: u32 = 5;

/// Default pause between connection attempts.
pub const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// Target `ws://` or `wss://` URI.
    pub uri: String,
    /// TLS profile; must agree with the URI scheme.
    pub tls_mode: TlsMode,
    /// Optional free-form cipher list for TLS links.
    pub ciphers: Option<String>,
    /// Bound on connection attempts.
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl ConnectParams {
    /// Parameters for a plain connection with default retry bounds.
    #[must_use]
    pub fn plain(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            tls_mode: TlsMode::Undefined,
            ciphers: None,
            max_retries: MAX_CONNECT_RETRIES,
            retry_delay: CONNECT_RETRY_DELAY,
        }
    }

    /// Set the TLS mode.
    #[must_use]
    pub fn with_tls(mut self, mode: TlsMode) -> Self {
        self.tls_mode = mode;
        self
    }
}

/// A live `WebSocket` connection to a glossa peer.
#[derive(Debug)]
pub struct WsConnection {
    /// Write half of the `WebSocket`.
    writer: SplitSink<WsStream, Message>,
    /// Read half of the `WebSocket`.
    reader: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to the peer, retrying up to the configured bound.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::ConfigMismatch`] or
    /// [`MessagingError::InvalidUri`] before any network traffic when the
    /// parameters are inconsistent, and [`MessagingError::Unreachable`]
    /// once the retry budget is spent.
    pub async fn connect(params: &ConnectParams) -> Result<Self, MessagingError> {
        params.tls_mode.check_uri(&params.uri)?;

        let attempts = params.max_retries.max(1);
        let mut last_err = None;
        for attempt in 1..=attempts {
            match connect_async(params.uri.as_str()).await {
                Ok((ws, _response)) => {
                    debug!(uri = %params.uri, attempt, "connected");
                    let (writer, reader) = ws.split();
                    return Ok(Self { writer, reader });
                }
                Err(e) => {
                    warn!(uri = %params.uri, attempt, error = %e, "connection attempt failed");
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(params.retry_delay).await;
                    }
                }
            }
        }

        Err(MessagingError::Unreachable {
            uri: params.uri.clone(),
            attempts,
            source: Box::new(last_err.expect("at least one attempt was made")),
        })
    }

    /// Send a wire message as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::Closed`] when the link has shut down.
    pub async fn send(&mut self, msg: &WireMsg) -> Result<(), MessagingError> {
        let json = msg.to_json()?;
        self.writer
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| MessagingError::Closed)
    }

    /// Receive the next wire message.
    ///
    /// Returns `Ok(None)` when the peer closed the connection (close frame
    /// or end of stream). Ping/pong and binary frames are skipped.
    ///
    /// # Errors
    ///
    /// Returns the transport error for a broken link and a protocol error
    /// for undecodable text frames.
    pub async fn recv(&mut self) -> Result<Option<WireMsg>, MessagingError> {
        loop {
            match self.reader.next().await {
                Some(Ok(Message::Text(text))) => {
                    return WireMsg::parse(&text).map(Some);
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Ok(None);
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {
                    // Ping/pong handled by tungstenite; binary skipped.
                }
                Some(Err(e)) => {
                    return Err(e.into());
                }
            }
        }
    }

    /// Send a close frame and shut down the connection.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the close frame cannot be sent.
    pub async fn close(&mut self) -> Result<(), MessagingError> {
        self.writer.send(Message::Close(None)).await?;
        Ok(())
    }

    /// Take the split halves for use with `tokio::select!`.
    ///
    /// After calling this, `send`/`recv`/`close` can no longer be used;
    /// the returned halves are driven directly by the caller.
    #[must_use]
    pub fn into_parts(self) -> (SplitSink<WsStream, Message>, SplitStream<WsStream>) {
        (self.writer, self.reader)
    }
}
