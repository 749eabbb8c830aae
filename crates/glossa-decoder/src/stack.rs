//! Multi-stacks: one stack per count of covered source words.

use std::collections::HashMap;

use glossa_core::WordUid;

use crate::coverage::Coverage;
use crate::hypothesis::HypoArena;

/// Recombination identity: hypotheses agreeing on coverage and on the
/// trailing LM window are exchangeable for the rest of the search.
type RecombKey = (Coverage, Vec<WordUid>);

/// One stack of hypotheses sharing a covered-word count.
#[derive(Default)]
pub(crate) struct Stack {
    /// Arena indices of the live hypotheses.
    items: Vec<usize>,
    /// Recombination index over the live hypotheses.
    recomb: HashMap<RecombKey, usize>,
    /// Hypotheses ever inserted, before recombination and pruning.
    inserted: usize,
}

impl Stack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a hypothesis, recombining against an equivalent entry.
    ///
    /// The higher-scoring twin stays reachable; the loser is linked as a
    /// lattice alternative of the winner.
    pub(crate) fn insert(&mut self, arena: &mut HypoArena, idx: usize) {
        self.inserted += 1;
        let key: RecombKey = {
            let hyp = arena.get(idx);
            (hyp.coverage, hyp.window.clone())
        };

        match self.recomb.get(&key).copied() {
            None => {
                self.recomb.insert(key, idx);
                self.items.push(idx);
            }
            Some(existing) => {
                // Equal scores keep the earlier hypothesis (stable).
                let incoming_wins = arena.get(idx).total() > arena.get(existing).total();
                if incoming_wins {
                    arena.get_mut(idx).alternatives.push(existing);
                    self.recomb.insert(key, idx);
                    if let Some(slot) = self.items.iter_mut().find(|slot| **slot == existing) {
                        *slot = idx;
                    }
                } else {
                    arena.get_mut(existing).alternatives.push(idx);
                }
            }
        }
    }

    /// Apply histogram and threshold pruning; returns the stack load in
    /// percent of `capacity`.
    ///
    /// The load counts every hypothesis ever inserted, recombined twins
    /// included, so it reflects the search space the stack absorbed
    /// rather than what survived; it may exceed 100.
    pub(crate) fn prune(&mut self, arena: &HypoArena, capacity: usize, threshold: f32) -> u32 {
        // Best-first, ties towards the older hypothesis.
        self.items.sort_by(|&a, &b| {
            let (ha, hb) = (arena.get(a), arena.get(b));
            hb.total()
                .total_cmp(&ha.total())
                .then(ha.serial.cmp(&hb.serial))
        });

        let load = (self.inserted * 100 / capacity) as u32;

        if self.items.len() > capacity {
            self.items.truncate(capacity);
        }
        if let Some(&best) = self.items.first() {
            let floor = arena.get(best).total() - threshold;
            self.items.retain(|&idx| arena.get(idx).total() >= floor);
        }

        load
    }

    /// The live hypotheses, best first once pruned.
    pub(crate) fn items(&self) -> &[usize] {
        &self.items
    }

    /// The best live hypothesis, if any.
    pub(crate) fn best(&self) -> Option<usize> {
        self.items.first().copied()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hypotheses ever inserted into this stack.
    pub(crate) fn inserted(&self) -> usize {
        self.inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypothesis::Hypothesis;

    fn hyp(arena: &mut HypoArena, coverage: Coverage, window: &[u64], score: f32) -> usize {
        let mut h = Hypothesis::root(0.0);
        h.coverage = coverage;
        h.window = window.iter().map(|&w| WordUid(w)).collect();
        h.score = score;
        arena.push(h)
    }

    #[test]
    fn recombination_keeps_the_better_twin() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        let cov = Coverage::new().cover(0, 1);

        let weak = hyp(&mut arena, cov, &[7], -3.0);
        let strong = hyp(&mut arena, cov, &[7], -1.0);
        stack.insert(&mut arena, weak);
        stack.insert(&mut arena, strong);

        assert_eq!(stack.items(), &[strong]);
        assert_eq!(arena.get(strong).alternatives, vec![weak]);
        assert_eq!(stack.inserted(), 2);
    }

    #[test]
    fn equal_scores_keep_the_first_inserted() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        let cov = Coverage::new().cover(0, 0);

        let first = hyp(&mut arena, cov, &[7], -2.0);
        let second = hyp(&mut arena, cov, &[7], -2.0);
        stack.insert(&mut arena, first);
        stack.insert(&mut arena, second);

        assert_eq!(stack.items(), &[first]);
        assert_eq!(arena.get(first).alternatives, vec![second]);
    }

    #[test]
    fn different_windows_do_not_recombine() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        let cov = Coverage::new().cover(0, 0);

        let a = hyp(&mut arena, cov, &[7], -1.0);
        let b = hyp(&mut arena, cov, &[8], -2.0);
        stack.insert(&mut arena, a);
        stack.insert(&mut arena, b);
        assert_eq!(stack.items().len(), 2);
    }

    #[test]
    fn histogram_pruning_keeps_the_top_k() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        for i in 0..10 {
            let cov = Coverage::new().cover(0, 0);
            let idx = hyp(&mut arena, cov, &[100 + i], -(i as f32));
            stack.insert(&mut arena, idx);
        }

        let load = stack.prune(&arena, 4, 100.0);
        assert_eq!(load, 250);
        assert_eq!(stack.items().len(), 4);
        // Best first after pruning.
        assert_eq!(arena.get(stack.best().unwrap()).score, 0.0);
    }

    #[test]
    fn load_counts_recombined_hypotheses() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        let cov = Coverage::new().cover(0, 1);

        // Two equivalent hypotheses collapse to one surviving entry...
        let a = hyp(&mut arena, cov, &[7], -1.0);
        let b = hyp(&mut arena, cov, &[7], -2.0);
        stack.insert(&mut arena, a);
        stack.insert(&mut arena, b);
        assert_eq!(stack.items().len(), 1);

        // ...but both count towards the absorbed search space.
        let load = stack.prune(&arena, 4, 100.0);
        assert_eq!(load, 50);
    }

    #[test]
    fn threshold_pruning_drops_distant_hypotheses() {
        let mut arena = HypoArena::new();
        let mut stack = Stack::new();
        for (i, score) in [-1.0f32, -2.0, -9.5].iter().enumerate() {
            let cov = Coverage::new().cover(0, 0);
            let idx = hyp(&mut arena, cov, &[100 + i as u64], *score);
            stack.insert(&mut arena, idx);
        }

        stack.prune(&arena, 100, 5.0);
        assert_eq!(stack.items().len(), 2);
    }
}
