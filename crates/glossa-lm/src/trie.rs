//! The hash-map trie and the model capability trait.

use std::collections::HashMap;

use glossa_core::WordUid;

use crate::payload::{LM_MAX_LEVEL, MGramPayload};
use crate::query::MGramQuery;
use crate::word_index::WordIndex;

/// Capability set of one language-model variant.
///
/// A single strategy object per trie implementation; the decoder talks to
/// the model exclusively through this seam.
pub trait LmModel: Send + Sync {
    /// Fixed log-probability of the unknown word.
    fn unknown_prob(&self) -> f32;

    /// Map a token onto its word uid ([`WordUid::UNKNOWN`] for OOV).
    fn word_id(&self, token: &str) -> WordUid;

    /// Fill the query's probabilities for its current window.
    fn execute(&self, query: &mut MGramQuery);
}

/// Hash-map backed m-gram trie.
///
/// Level `k` m-grams are stored in the `k`-th map, keyed by the incremental
/// hash of their word-uid sequence (a unigram's key is its raw word uid,
/// matching the seed of the incremental hash rows). Missing m-grams back
/// off: `p(w_b..w_e) = bo(w_b..w_{e-1}) + p(w_{b+1}..w_e)`.
pub struct HashMapTrie {
    levels: Vec<HashMap<u64, MGramPayload>>,
    unknown: MGramPayload,
    word_index: WordIndex,
}

impl HashMapTrie {
    /// Create an empty trie with the given unknown-word payload.
    #[must_use]
    pub fn new(word_index: WordIndex, unknown: MGramPayload) -> Self {
        Self {
            levels: vec![HashMap::new(); LM_MAX_LEVEL],
            unknown,
            word_index,
        }
    }

    /// Insert an m-gram payload keyed by its word-uid sequence.
    ///
    /// Sequences longer than [`LM_MAX_LEVEL`] are ignored.
    pub fn insert(&mut self, word_ids: &[WordUid], payload: MGramPayload) {
        let level = word_ids.len();
        if level == 0 || level > LM_MAX_LEVEL {
            return;
        }
        let mut hash = word_ids[0].0;
        for word in &word_ids[1..] {
            hash = glossa_core::combine_uids(hash, word.0);
        }
        self.levels[level - 1].insert(hash, payload);
    }

    /// Mutable access to the vocabulary while the model is being built.
    pub fn word_index_mut(&mut self) -> &mut WordIndex {
        &mut self.word_index
    }

    /// Number of stored m-grams of the given level.
    #[must_use]
    pub fn level_len(&self, level: usize) -> usize {
        self.levels.get(level.wrapping_sub(1)).map_or(0, HashMap::len)
    }

    /// Probability of the m-gram `[begin, end]` with back-off.
    fn lookup(&self, query: &mut MGramQuery, begin: usize, end: usize) -> f32 {
        let level = query.level(begin, end);

        if level == 1 {
            let word = query.word(begin);
            if word == WordUid::UNKNOWN {
                return self.unknown.prob;
            }
            return self.levels[0]
                .get(&word.0)
                .map_or(self.unknown.prob, |p| p.prob);
        }

        let hash = query.hash(begin, end);
        if let Some(payload) = self.levels[level - 1].get(&hash) {
            return payload.prob;
        }

        // Back off: weight of the shortened history plus the probability
        // of the lower-order m-gram.
        self.back_off_weight(query, begin, end - 1) + self.lookup(query, begin + 1, end)
    }

    /// Back-off weight of the m-gram `[begin, end]`; absent entries carry
    /// no back-off mass.
    fn back_off_weight(&self, query: &mut MGramQuery, begin: usize, end: usize) -> f32 {
        let level = query.level(begin, end);
        let hash = if level == 1 {
            let word = query.word(begin);
            if word == WordUid::UNKNOWN {
                return self.unknown.back_off;
            }
            word.0
        } else {
            query.hash(begin, end)
        };
        self.levels[level - 1].get(&hash).map_or(0.0, |p| p.back_off)
    }
}

impl LmModel for HashMapTrie {
    fn unknown_prob(&self) -> f32 {
        self.unknown.prob
    }

    fn word_id(&self, token: &str) -> WordUid {
        self.word_index.word_id(token)
    }

    fn execute(&self, query: &mut MGramQuery) {
        let begin = query.begin();
        for end in query.first_end()..=query.last_end() {
            let prob = self.lookup(query, begin, end);
            query.set_prob(end, prob);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LmBuilder;
    use crate::query::LmQueryProxy;

    fn toy_model() -> HashMapTrie {
        LmBuilder::new()
            .unknown(-5.0)
            .unigram("hello", -1.0, -0.4)
            .unigram("world", -1.2, -0.3)
            .unigram(".", -0.5, -0.1)
            .bigram("hello", "world", -0.2, -0.05)
            .build()
    }

    #[test]
    fn known_unigram_payload_is_returned() {
        let model = toy_model();
        let mut proxy = LmQueryProxy::new(&model);
        let ids = proxy.word_ids("hello");
        let (prob, level) = proxy.execute(&ids, 1);
        assert_eq!(level, 1);
        assert!((prob - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn unknown_word_gets_the_fixed_payload() {
        let model = toy_model();
        let mut proxy = LmQueryProxy::new(&model);
        let ids = proxy.word_ids("martian");
        let (prob, _) = proxy.execute(&ids, 1);
        assert!((prob - (-5.0)).abs() < 1e-6);
    }

    #[test]
    fn stored_bigram_is_preferred_over_back_off() {
        let model = toy_model();
        let mut proxy = LmQueryProxy::new(&model);
        let ids = proxy.word_ids("hello world");
        // Joint = p(hello) + p(world | hello) = -1.0 + -0.2
        let (prob, level) = proxy.execute(&ids, 1);
        assert_eq!(level, 2);
        assert!((prob - (-1.2)).abs() < 1e-6);
    }

    #[test]
    fn missing_bigram_backs_off() {
        let model = toy_model();
        let mut proxy = LmQueryProxy::new(&model);
        let ids = proxy.word_ids("world hello");
        // p(world) + bo(world) + p(hello) = -1.2 + -0.3 + -1.0
        let (prob, _) = proxy.execute(&ids, 1);
        assert!((prob - (-2.5)).abs() < 1e-6);
    }

    #[test]
    fn min_level_skips_already_scored_prefix() {
        let model = toy_model();
        let mut proxy = LmQueryProxy::new(&model);
        let ids = proxy.word_ids("hello world");
        // With min_level = 2 only the bigram is emitted.
        let (prob, _) = proxy.execute(&ids, 2);
        assert!((prob - (-0.2)).abs() < 1e-6);
    }

    #[test]
    fn sliding_emits_one_mgram_per_step() {
        let model = LmBuilder::new()
            .unknown(-5.0)
            .unigram("a", -1.0, 0.0)
            .unigram("b", -1.0, 0.0)
            .build();
        let mut proxy = LmQueryProxy::new(&model);
        // Seven alternating words: far beyond LM_MAX_LEVEL, forcing slides.
        let ids = proxy.word_ids("a b a b a b a");
        let (prob, level) = proxy.execute(&ids, 1);
        assert_eq!(level, LM_MAX_LEVEL);
        // Every m-gram above the unigram level backs off to unigrams with
        // zero back-off mass, so the joint is the sum of 7 unigram scores
        // plus nothing else.
        assert!((prob - (-7.0)).abs() < 1e-5);
    }
}
