//! Error types of the balancer.

/// Errors produced by the balancer's dispatch fabric.
#[derive(Debug, thiserror::Error)]
pub enum BalancerError {
    /// The chosen adapter has no live connection.
    #[error("translator adapter {0} is disconnected")]
    Disconnected(glossa_core::ServerUid),

    /// Transport or protocol failure on a balancer edge.
    #[error(transparent)]
    Messaging(#[from] glossa_messaging::MessagingError),

    /// The client listen socket could not be bound.
    #[error("cannot bind listen socket: {0}")]
    Io(#[from] std::io::Error),
}
