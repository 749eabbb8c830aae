//! Error types of the sentence decoder.

/// Errors failing one sentence; other sentences of the job are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    /// The sentence exceeds the word bound.
    #[error("sentence has {words} words, the maximum is {max}")]
    TooLong {
        /// Token count of the offending sentence.
        words: usize,
        /// The configured bound.
        max: usize,
    },

    /// An internal invariant was violated during decoding.
    #[error("internal decoder error: {0}")]
    Internal(String),
}
