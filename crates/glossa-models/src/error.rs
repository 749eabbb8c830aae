//! Error types for model loading.

use std::path::PathBuf;

/// Errors produced while loading the translation or reordering model.
///
/// All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelsError {
    /// The model file could not be read.
    #[error("cannot read model file {path}: {source}")]
    Io {
        /// Path of the model file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A model line did not parse.
    #[error("bad model entry at {path}:{line}: {reason}")]
    Parse {
        /// Path of the model file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Parser diagnostic.
        reason: String,
    },
}
