//! The triangular per-sentence span map.

use std::sync::Arc;

use glossa_core::PhraseUid;
use glossa_models::TmSourceEntry;

/// Data of one source span `[begin_word, end_word]`.
#[derive(Debug, Clone, Default)]
pub(crate) struct SentDataEntry {
    /// Byte offset of the span's first character in the source sentence.
    pub(crate) begin_ch: usize,
    /// Byte offset one past the span's last character.
    pub(crate) end_ch: usize,
    /// Content uid of the span.
    pub(crate) phrase_uid: PhraseUid,
    /// Translation-model entry, when the span is in the phrase table.
    pub(crate) tm_entry: Option<Arc<TmSourceEntry>>,
}

/// Triangular map over all spans `[i][j]`, `i ≤ j < dim`.
pub(crate) struct SentenceDataMap {
    dim: usize,
    cells: Vec<SentDataEntry>,
}

impl SentenceDataMap {
    /// Allocate the map for a sentence of `dim` words.
    pub(crate) fn new(dim: usize) -> Self {
        Self {
            dim,
            cells: vec![SentDataEntry::default(); dim * dim],
        }
    }

    /// The number of words of the sentence.
    pub(crate) fn dim(&self) -> usize {
        self.dim
    }

    pub(crate) fn get(&self, begin: usize, end: usize) -> &SentDataEntry {
        debug_assert!(begin <= end && end < self.dim);
        &self.cells[begin * self.dim + end]
    }

    pub(crate) fn get_mut(&mut self, begin: usize, end: usize) -> &mut SentDataEntry {
        debug_assert!(begin <= end && end < self.dim);
        &mut self.cells[begin * self.dim + end]
    }
}
