//! The reordering model and its per-sentence query proxy.

use std::collections::HashMap;

use glossa_core::PhraseUid;

/// Reordering orientation of a newly covered span relative to the
/// previously translated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The new span starts right after the previous one.
    Monotone,
    /// The new span ends right before the previous one.
    Swap,
    /// Any other jump.
    Discontinuous,
}

/// Orientation weights of one source-target pair.
///
/// Six log10 weights: `{monotone, swap, discontinuous}` in forward
/// (previous → current) and backward (current → previous) direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmEntry(pub [f32; 6]);

impl RmEntry {
    /// The weight for `orientation` in the given direction.
    #[must_use]
    pub fn weight(&self, orientation: Orientation, forward: bool) -> f32 {
        let base = match orientation {
            Orientation::Monotone => 0,
            Orientation::Swap => 1,
            Orientation::Discontinuous => 2,
        };
        let idx = if forward { base } else { base + 3 };
        self.0[idx]
    }
}

impl Default for RmEntry {
    fn default() -> Self {
        Self([0.0; 6])
    }
}

/// The process-global reordering model.
#[derive(Default)]
pub struct ReorderingModel {
    entries: HashMap<PhraseUid, RmEntry>,
    fallback: RmEntry,
}

impl ReorderingModel {
    /// Create an empty model; pairs without entries use `fallback`.
    #[must_use]
    pub fn new(fallback: RmEntry) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    /// Register the weights of one source-target pair.
    pub fn add(&mut self, st_uid: PhraseUid, entry: RmEntry) {
        self.entries.insert(st_uid, entry);
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the model holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, st_uid: PhraseUid) -> RmEntry {
        self.entries.get(&st_uid).copied().unwrap_or(self.fallback)
    }
}

/// Per-sentence reordering query.
///
/// [`RmQueryProxy::execute`] must run before the search consumes
/// orientation weights: it pins down the entries of every source-target
/// pair of the sentence, so lookup during expansion is one local probe.
pub struct RmQueryProxy<'a> {
    model: &'a ReorderingModel,
    resolved: HashMap<PhraseUid, RmEntry>,
}

impl<'a> RmQueryProxy<'a> {
    /// Create a proxy over the model.
    #[must_use]
    pub fn new(model: &'a ReorderingModel) -> Self {
        Self {
            model,
            resolved: HashMap::new(),
        }
    }

    /// Pre-resolve the entries of the sentence's source-target pairs.
    pub fn execute(&mut self, st_uids: &[PhraseUid]) {
        self.resolved.reserve(st_uids.len());
        for &uid in st_uids {
            self.resolved.insert(uid, self.model.entry(uid));
        }
    }

    /// The pre-resolved entry of one pair; pairs that were not part of
    /// [`RmQueryProxy::execute`] fall back to the model default.
    #[must_use]
    pub fn entry(&self, st_uid: PhraseUid) -> RmEntry {
        self.resolved
            .get(&st_uid)
            .copied()
            .unwrap_or_else(|| self.model.entry(st_uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(pair: (&str, &str)) -> PhraseUid {
        PhraseUid::from_phrase(pair.0).combine(PhraseUid::from_phrase(pair.1))
    }

    #[test]
    fn weights_index_by_orientation_and_direction() {
        let entry = RmEntry([-0.1, -0.2, -0.3, -0.4, -0.5, -0.6]);
        assert_eq!(entry.weight(Orientation::Monotone, true), -0.1);
        assert_eq!(entry.weight(Orientation::Swap, true), -0.2);
        assert_eq!(entry.weight(Orientation::Discontinuous, true), -0.3);
        assert_eq!(entry.weight(Orientation::Monotone, false), -0.4);
        assert_eq!(entry.weight(Orientation::Discontinuous, false), -0.6);
    }

    #[test]
    fn unresolved_pairs_fall_back() {
        let fallback = RmEntry([-1.0; 6]);
        let mut model = ReorderingModel::new(fallback);
        model.add(uid(("a", "x")), RmEntry([-0.5; 6]));

        let mut proxy = RmQueryProxy::new(&model);
        proxy.execute(&[uid(("a", "x"))]);

        assert_eq!(proxy.entry(uid(("a", "x"))), RmEntry([-0.5; 6]));
        assert_eq!(proxy.entry(uid(("b", "y"))), fallback);
    }
}
