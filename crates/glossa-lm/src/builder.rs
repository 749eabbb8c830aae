//! Programmatic construction of [`HashMapTrie`] models.

use glossa_core::WordUid;

use crate::payload::MGramPayload;
use crate::trie::HashMapTrie;
use crate::word_index::WordIndex;

/// Builder for in-memory language models; used by the loader and by tests.
pub struct LmBuilder {
    unknown: MGramPayload,
    entries: Vec<(Vec<String>, MGramPayload)>,
}

impl Default for LmBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LmBuilder {
    /// Start an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unknown: MGramPayload::default(),
            entries: Vec::new(),
        }
    }

    /// Set the unknown-word log-probability.
    #[must_use]
    pub fn unknown(mut self, prob: f32) -> Self {
        self.unknown = MGramPayload::prob_only(prob);
        self
    }

    /// Add a unigram entry.
    #[must_use]
    pub fn unigram(self, word: &str, prob: f32, back_off: f32) -> Self {
        self.ngram(&[word], prob, back_off)
    }

    /// Add a bigram entry.
    #[must_use]
    pub fn bigram(self, first: &str, second: &str, prob: f32, back_off: f32) -> Self {
        self.ngram(&[first, second], prob, back_off)
    }

    /// Add an m-gram entry of any stored level.
    #[must_use]
    pub fn ngram(mut self, words: &[&str], prob: f32, back_off: f32) -> Self {
        self.entries.push((
            words.iter().map(|w| (*w).to_owned()).collect(),
            MGramPayload { prob, back_off },
        ));
        self
    }

    /// Materialise the trie.
    ///
    /// Vocabulary ids are assigned in entry order; words first seen in
    /// higher-order entries are registered too, so their ids are stable
    /// for hashing even without a unigram payload.
    #[must_use]
    pub fn build(self) -> HashMapTrie {
        let mut index = WordIndex::new();
        let mut resolved: Vec<(Vec<WordUid>, MGramPayload)> =
            Vec::with_capacity(self.entries.len());
        for (words, payload) in &self.entries {
            let ids = words.iter().map(|w| index.insert(w)).collect();
            resolved.push((ids, *payload));
        }

        let mut trie = HashMapTrie::new(index, self.unknown);
        for (ids, payload) in resolved {
            trie.insert(&ids, payload);
        }
        trie
    }
}
