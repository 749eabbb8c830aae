//! Error types for language-model loading.

use std::path::PathBuf;

/// Errors produced while loading a language model.
///
/// All of these are fatal at startup; there are no query-time errors.
#[derive(Debug, thiserror::Error)]
pub enum LmError {
    /// The model file could not be read.
    #[error("cannot read LM file {path}: {source}")]
    Io {
        /// Path of the model file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A model line did not parse.
    #[error("bad LM entry at {path}:{line}: {reason}")]
    Parse {
        /// Path of the model file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Parser diagnostic.
        reason: String,
    },

    /// The model contained no unigrams.
    #[error("LM file {path} holds no unigram entries")]
    EmptyModel {
        /// Path of the model file.
        path: PathBuf,
    },
}
