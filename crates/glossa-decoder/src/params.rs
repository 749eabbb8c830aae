//! Decoder tuning parameters.

/// Hard bound on the number of tokens in one sentence.
///
/// Sentences above the bound fail with `too_long` before any model work;
/// the coverage bitset is sized for this bound.
pub const MAX_WORDS_PER_SENTENCE: usize = 100;

/// Beam-search and feature-weight parameters of the sentence decoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderParams {
    /// Longest source span submitted to the translation model.
    pub max_source_phrase_len: usize,
    /// Reordering distortion limit: how far a new span's start may jump
    /// from the frontier of the covered prefix. `0` disables reordering.
    pub distortion_limit: usize,
    /// Histogram pruning bound: hypotheses kept per stack.
    pub stack_capacity: usize,
    /// Threshold pruning bound: hypotheses scoring more than this much
    /// below the stack best (score + future cost) are dropped.
    pub pruning_threshold: f32,
    /// Weight applied to language-model log-probabilities.
    pub lm_weight: f32,
    /// Weight applied to reordering-model orientation weights.
    pub rm_weight: f32,
    /// Per-emitted-word penalty (log-domain, usually negative).
    pub word_penalty: f32,
    /// Score of the identity translation of an unknown token.
    pub unknown_penalty: f32,
}

impl Default for DecoderParams {
    fn default() -> Self {
        Self {
            max_source_phrase_len: 7,
            distortion_limit: 5,
            stack_capacity: 100,
            pruning_threshold: 8.0,
            lm_weight: 1.0,
            rm_weight: 1.0,
            word_penalty: -0.3,
            unknown_penalty: -10.0,
        }
    }
}

impl DecoderParams {
    /// Check the parameters for values the search cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_source_phrase_len == 0 {
            return Err("max_source_phrase_len must be at least 1".to_owned());
        }
        if self.stack_capacity == 0 {
            return Err("stack_capacity must be at least 1".to_owned());
        }
        if !self.pruning_threshold.is_finite() || self.pruning_threshold <= 0.0 {
            return Err("pruning_threshold must be a positive finite value".to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DecoderParams::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let params = DecoderParams {
            stack_capacity: 0,
            ..DecoderParams::default()
        };
        assert!(params.validate().is_err());
    }
}
