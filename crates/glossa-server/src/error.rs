//! Error types of the translation server.

/// Fatal startup errors of the translation server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The language model failed to load.
    #[error(transparent)]
    Lm(#[from] glossa_lm::LmError),

    /// The translation or reordering model failed to load.
    #[error(transparent)]
    Models(#[from] glossa_models::ModelsError),

    /// The listen socket could not be bound.
    #[error("cannot bind listen socket: {0}")]
    Io(#[from] std::io::Error),
}
