//! Search hypotheses and their arena.

use glossa_core::{PhraseUid, WordUid};
use glossa_lm::LM_MAX_LEVEL;

use crate::coverage::Coverage;

/// Length of the trailing target-word window kept for LM scoring and
/// recombination.
pub(crate) const WINDOW_LEN: usize = LM_MAX_LEVEL - 1;

/// One partial translation.
#[derive(Debug, Clone)]
pub(crate) struct Hypothesis {
    /// Source positions translated so far.
    pub(crate) coverage: Coverage,
    /// Trailing target words, at most [`WINDOW_LEN`] of them.
    pub(crate) window: Vec<WordUid>,
    /// Accumulated model score (log domain).
    pub(crate) score: f32,
    /// Estimated best-case score of the uncovered remainder.
    pub(crate) future: f32,
    /// Arena index of the predecessor; `None` for the root.
    pub(crate) parent: Option<usize>,
    /// Target text emitted by the last expansion step.
    pub(crate) emitted: String,
    /// Begin/end of the last covered source span; `None` for the root.
    pub(crate) last_span: Option<(usize, usize)>,
    /// Source-target uid of the last applied translation option.
    pub(crate) last_st_uid: Option<PhraseUid>,
    /// Insertion serial; ties on score break towards the older hypothesis.
    pub(crate) serial: u64,
    /// Recombined-away hypotheses kept as lattice alternatives.
    pub(crate) alternatives: Vec<usize>,
}

impl Hypothesis {
    /// The root hypothesis: nothing covered, empty window.
    pub(crate) fn root(future: f32) -> Self {
        Self {
            coverage: Coverage::new(),
            window: Vec::new(),
            score: 0.0,
            future,
            parent: None,
            emitted: String::new(),
            last_span: None,
            last_st_uid: None,
            serial: 0,
            alternatives: Vec::new(),
        }
    }

    /// Score plus future-cost estimate; the pruning and ranking key.
    pub(crate) fn total(&self) -> f32 {
        self.score + self.future
    }

    /// The window a successor inherits after emitting `words`.
    pub(crate) fn extended_window(&self, words: &[WordUid]) -> Vec<WordUid> {
        let mut window = self.window.clone();
        window.extend_from_slice(words);
        if window.len() > WINDOW_LEN {
            window.drain(..window.len() - WINDOW_LEN);
        }
        window
    }
}

/// Arena holding every hypothesis of one sentence decode.
///
/// Stacks and back-pointers address hypotheses by arena index; nothing is
/// ever removed, recombined losers simply stop being reachable from the
/// stacks.
#[derive(Default)]
pub(crate) struct HypoArena {
    items: Vec<Hypothesis>,
}

impl HypoArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, mut hyp: Hypothesis) -> usize {
        let idx = self.items.len();
        hyp.serial = idx as u64;
        self.items.push(hyp);
        idx
    }

    pub(crate) fn get(&self, idx: usize) -> &Hypothesis {
        &self.items[idx]
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> &mut Hypothesis {
        &mut self.items[idx]
    }

    /// Follow back-pointers from `idx` and join the emitted segments.
    pub(crate) fn backtrace(&self, idx: usize) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            let hyp = self.get(i);
            if !hyp.emitted.is_empty() {
                segments.push(hyp.emitted.as_str());
            }
            cursor = hyp.parent;
        }
        segments.reverse();
        segments.join(" ")
    }
}
