//! The m-gram query object and the sliding query proxy.
//!
//! A [`MGramQuery`] holds one word-id sequence plus the per-row incremental
//! hash state; a [`LmQueryProxy`] drives it over a model with the sliding
//! m-gram window, summing the emitted log-probabilities into a joint score.

use glossa_core::{WordUid, combine_uids};

use crate::level::{LEVEL, LEVEL_M1, LEVEL_M2};
use crate::payload::{LM_MAX_LEVEL, MAX_QUERY_WORDS};
use crate::trie::LmModel;

/// One language-model query over a word-id sequence.
///
/// The hash of the sub-m-gram `[begin, end]` is built incrementally from
/// the hash of `[begin, end-1]` and the word id at `end`; per row (fixed
/// `begin`) the highest computed level is tracked so no element is ever
/// recomputed. The `hash_ops` counter observes exactly the incremental
/// combinations performed.
pub struct MGramQuery {
    word_ids: Vec<WordUid>,
    probs: [f32; MAX_QUERY_WORDS],
    hash_rows: [[u64; MAX_QUERY_WORDS]; MAX_QUERY_WORDS],
    computed_level: [usize; MAX_QUERY_WORDS],
    begin: usize,
    first_end: usize,
    last_end: usize,
    hash_ops: u64,
}

impl Default for MGramQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl MGramQuery {
    /// Create an empty query object; reusable across sentences.
    #[must_use]
    pub fn new() -> Self {
        Self {
            word_ids: Vec::with_capacity(MAX_QUERY_WORDS),
            probs: [0.0; MAX_QUERY_WORDS],
            hash_rows: [[0; MAX_QUERY_WORDS]; MAX_QUERY_WORDS],
            computed_level: [0; MAX_QUERY_WORDS],
            begin: 0,
            first_end: 0,
            last_end: 0,
            hash_ops: 0,
        }
    }

    /// Load a new word-id sequence, resetting per-query state.
    ///
    /// The sequence must be non-empty and at most [`MAX_QUERY_WORDS`] long.
    pub fn set_words(&mut self, word_ids: &[WordUid]) {
        debug_assert!(!word_ids.is_empty());
        debug_assert!(word_ids.len() <= MAX_QUERY_WORDS);

        self.word_ids.clear();
        self.word_ids.extend_from_slice(word_ids);
        self.probs = [0.0; MAX_QUERY_WORDS];
        self.computed_level = [0; MAX_QUERY_WORDS];
    }

    /// Fix the window: probabilities are wanted for the m-grams
    /// `[begin, first_end] ..= [begin, last_end]`.
    pub fn set_window(&mut self, begin: usize, first_end: usize, last_end: usize) {
        debug_assert!(begin <= first_end && first_end <= last_end);
        debug_assert!(last_end < self.word_ids.len());
        self.begin = begin;
        self.first_end = first_end;
        self.last_end = last_end;
    }

    /// Number of words in the loaded sequence.
    #[must_use]
    pub fn num_words(&self) -> usize {
        self.word_ids.len()
    }

    /// The word id at `idx`.
    #[must_use]
    pub fn word(&self, idx: usize) -> WordUid {
        self.word_ids[idx]
    }

    /// Current window begin index.
    #[must_use]
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// First end index of the current window.
    #[must_use]
    pub fn first_end(&self) -> usize {
        self.first_end
    }

    /// Last end index of the current window.
    #[must_use]
    pub fn last_end(&self) -> usize {
        self.last_end
    }

    /// Level of the m-gram `[begin, end]`.
    #[must_use]
    pub fn level(&self, begin: usize, end: usize) -> usize {
        LEVEL[begin][end]
    }

    /// `level - 1` of the m-gram `[begin, end]`.
    #[must_use]
    pub fn level_m1(&self, begin: usize, end: usize) -> usize {
        LEVEL_M1[begin][end]
    }

    /// `level - 2` of the m-gram `[begin, end]`, saturating at zero.
    #[must_use]
    pub fn level_m2(&self, begin: usize, end: usize) -> usize {
        LEVEL_M2[begin][end]
    }

    /// Store the probability of the m-gram ending at `end`.
    pub fn set_prob(&mut self, end: usize, prob: f32) {
        self.probs[end] = prob;
    }

    /// The stored probability of the m-gram ending at `end`.
    #[must_use]
    pub fn prob(&self, end: usize) -> f32 {
        self.probs[end]
    }

    /// Hash of the sub-m-gram `[begin, end]`, computed incrementally.
    ///
    /// The row for `begin` records the highest level already hashed; only
    /// the missing suffix is combined in, and a repeated request performs
    /// no work at all.
    pub fn hash(&mut self, begin: usize, end: usize) -> u64 {
        let curr_level = LEVEL[begin][end];
        let prev_level = self.computed_level[begin];

        if curr_level > prev_level {
            let mut idx = if prev_level == 0 {
                // Nothing computed in this row yet: seed with the raw
                // word id of the begin word.
                self.hash_rows[begin][begin] = self.word_ids[begin].0;
                begin + 1
            } else {
                begin + prev_level
            };

            while idx <= end {
                self.hash_rows[begin][idx] =
                    combine_uids(self.hash_rows[begin][idx - 1], self.word_ids[idx].0);
                self.hash_ops += 1;
                idx += 1;
            }
            self.computed_level[begin] = curr_level;
        }

        self.hash_rows[begin][end]
    }

    /// Total incremental hash combinations performed by this query object.
    #[must_use]
    pub fn hash_ops(&self) -> u64 {
        self.hash_ops
    }
}

/// Streaming query driver bound to one model.
pub struct LmQueryProxy<'a> {
    model: &'a dyn LmModel,
    query: MGramQuery,
}

impl<'a> LmQueryProxy<'a> {
    /// Create a proxy over the given model.
    #[must_use]
    pub fn new(model: &'a dyn LmModel) -> Self {
        Self {
            model,
            query: MGramQuery::new(),
        }
    }

    /// The model's fixed unknown-word log-probability.
    #[must_use]
    pub fn unknown_prob(&self) -> f32 {
        self.model.unknown_prob()
    }

    /// Map a whitespace-separated phrase onto word ids.
    #[must_use]
    pub fn word_ids(&self, phrase: &str) -> Vec<WordUid> {
        phrase
            .split_whitespace()
            .map(|token| self.model.word_id(token))
            .collect()
    }

    /// Joint log-probability of the whole sequence (all m-gram levels).
    #[must_use]
    pub fn joint(&mut self, word_ids: &[WordUid]) -> f32 {
        self.execute(word_ids, 1).0
    }

    /// Execute the sliding m-gram query.
    ///
    /// For the fixed begin index the probabilities of all m-grams ending at
    /// `min_level - 1 ..` the window's last index are computed first; then
    /// the window slides one word at a time, emitting one more m-gram of
    /// the maximum level per step. All emitted log-probabilities are summed.
    ///
    /// Returns `(joint log-probability, highest level considered)`; passing
    /// the returned level as `min_level` of a follow-up query over an
    /// extended sequence skips the already-scored prefix m-grams.
    pub fn execute(&mut self, word_ids: &[WordUid], min_level: usize) -> (f32, usize) {
        let num_words = word_ids.len();
        if num_words == 0 {
            return (0.0, min_level.max(1));
        }
        debug_assert!(num_words <= MAX_QUERY_WORDS);

        let max_level = num_words.min(LM_MAX_LEVEL);
        let min_level = min_level.clamp(1, max_level);

        self.query.set_words(word_ids);

        let mut joint = 0.0;

        // First window: all m-grams starting at 0 from min_level up.
        let mut begin = 0;
        let mut end = max_level - 1;
        self.query.set_window(begin, min_level - 1, end);
        self.model.execute(&mut self.query);
        for e in (min_level - 1)..=end {
            joint += self.query.prob(e);
        }

        // Slide: one full-level m-gram per step.
        while end + 1 < num_words {
            begin += 1;
            end += 1;
            self.query.set_window(begin, end, end);
            self.model.execute(&mut self.query);
            joint += self.query.prob(end);
        }

        (joint, max_level)
    }

    /// Total incremental hash combinations performed so far.
    #[must_use]
    pub fn hash_ops(&self) -> u64 {
        self.query.hash_ops()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<WordUid> {
        raw.iter().map(|&r| WordUid(r)).collect()
    }

    #[test]
    fn hash_extension_does_not_recompute() {
        let mut q = MGramQuery::new();
        q.set_words(&ids(&[10, 11, 12, 13, 14]));

        let _ = q.hash(0, 2);
        assert_eq!(q.hash_ops(), 2);

        // Extending the same row only combines the new suffix.
        let _ = q.hash(0, 4);
        assert_eq!(q.hash_ops(), 4);

        // Repeats are free, including lower levels of the same row.
        let _ = q.hash(0, 4);
        let _ = q.hash(0, 2);
        let _ = q.hash(0, 0);
        assert_eq!(q.hash_ops(), 4);
    }

    #[test]
    fn hash_matches_from_scratch_combination() {
        let words = ids(&[10, 11, 12]);
        let mut q = MGramQuery::new();
        q.set_words(&words);

        let mut expected = words[0].0;
        expected = combine_uids(expected, words[1].0);
        expected = combine_uids(expected, words[2].0);
        assert_eq!(q.hash(0, 2), expected);
    }

    #[test]
    fn rows_are_independent() {
        let mut q = MGramQuery::new();
        q.set_words(&ids(&[10, 11, 12]));

        let h02 = q.hash(0, 2);
        let h12 = q.hash(1, 2);
        assert_ne!(h02, h12);
        assert_eq!(q.hash(1, 1), 11);
    }

    #[test]
    fn set_words_resets_row_state() {
        let mut q = MGramQuery::new();
        q.set_words(&ids(&[10, 11]));
        let first = q.hash(0, 1);

        q.set_words(&ids(&[20, 21]));
        let second = q.hash(0, 1);
        assert_ne!(first, second);
    }
}
