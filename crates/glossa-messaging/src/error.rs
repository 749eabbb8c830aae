//! Error types for the messaging layer.

/// Errors produced by the wire protocol and the WebSocket plumbing.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    /// The peer could not be reached within the bounded retry budget.
    #[error("could not reach {uri} after {attempts} attempts")]
    Unreachable {
        /// Target URI.
        uri: String,
        /// Number of connection attempts made.
        attempts: u32,
        /// Last transport error observed.
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    /// A send was attempted on a channel that is no longer open.
    #[error("the connection is closed")]
    Closed,

    /// `WebSocket` transport error.
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    /// Socket-level I/O error (bind/accept).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed or unknown message on the wire.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The URI scheme and the TLS configuration disagree.
    #[error("configuration mismatch: {0}")]
    ConfigMismatch(String),

    /// The URI could not be parsed.
    #[error("invalid URI {uri}: {reason}")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Parser diagnostic.
        reason: String,
    },
}

impl From<tokio_tungstenite::tungstenite::Error> for MessagingError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
