//! The `string → word uid` vocabulary index.

use std::collections::HashMap;

use glossa_core::WordUid;

/// Vocabulary of the language model.
///
/// Read-only after load; out-of-vocabulary tokens map to
/// [`WordUid::UNKNOWN`].
#[derive(Debug, Default)]
pub struct WordIndex {
    words: HashMap<String, WordUid>,
    next_raw: u64,
}

impl WordIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
            next_raw: WordUid::MIN_VALID.0,
        }
    }

    /// Register `token`, returning its (possibly pre-existing) uid.
    pub fn insert(&mut self, token: &str) -> WordUid {
        if let Some(&uid) = self.words.get(token) {
            return uid;
        }
        let uid = WordUid(self.next_raw);
        self.next_raw += 1;
        self.words.insert(token.to_owned(), uid);
        uid
    }

    /// Look up `token`; unknown tokens yield [`WordUid::UNKNOWN`].
    #[must_use]
    pub fn word_id(&self, token: &str) -> WordUid {
        self.words
            .get(token)
            .copied()
            .unwrap_or(WordUid::UNKNOWN)
    }

    /// Number of registered words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent() {
        let mut idx = WordIndex::new();
        let a = idx.insert("hello");
        let b = idx.insert("hello");
        assert_eq!(a, b);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn uids_start_past_the_sentinels() {
        let mut idx = WordIndex::new();
        let uid = idx.insert("first");
        assert_eq!(uid, WordUid::MIN_VALID);
    }

    #[test]
    fn oov_maps_to_unknown() {
        let idx = WordIndex::new();
        assert_eq!(idx.word_id("martian"), WordUid::UNKNOWN);
    }
}
