//! Error types of the client.

/// Errors aborting a client run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport or protocol failure.
    #[error(transparent)]
    Messaging(#[from] glossa_messaging::MessagingError),

    /// The connection closed before every job was answered.
    #[error("connection closed with {missing} job(s) unanswered")]
    Incomplete {
        /// Jobs that never received a response.
        missing: usize,
    },

    /// A processor returned inconsistent or failed chunks.
    #[error("processor error: {0}")]
    Processor(String),

    /// File I/O around the run.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
