//! Future-cost estimation.
//!
//! The future cost of a span is the best score any single translation
//! chain can achieve over it, combining translation scores with a
//! context-free LM estimate; a dynamic program merges adjacent spans. The
//! table is computed once per sentence and consulted per hypothesis as the
//! sum over its maximal uncovered runs.

use glossa_lm::{LmModel, LmQueryProxy};

use crate::coverage::Coverage;
use crate::params::DecoderParams;
use crate::sent_data::SentenceDataMap;

pub(crate) struct FutureCosts {
    dim: usize,
    table: Vec<f32>,
}

impl FutureCosts {
    /// Build the triangular estimate table for the bootstrapped sentence.
    pub(crate) fn compute(
        sent_data: &SentenceDataMap,
        params: &DecoderParams,
        lm: &dyn LmModel,
    ) -> Self {
        let dim = sent_data.dim();
        let mut table = vec![f32::NEG_INFINITY; dim * dim];
        let mut proxy = LmQueryProxy::new(lm);

        // Direct per-span estimates, shortest spans first.
        for begin in 0..dim {
            for end in begin..dim {
                let entry = sent_data.get(begin, end);
                let mut best = f32::NEG_INFINITY;
                if let Some(tm_entry) = &entry.tm_entry {
                    for target in &tm_entry.targets {
                        let lm_est = proxy.joint(&target.word_ids);
                        let score = target.score
                            + params.lm_weight * lm_est
                            + params.word_penalty * target.word_ids.len() as f32;
                        best = best.max(score);
                    }
                } else if begin == end {
                    // Unknown single token: identity translation estimate.
                    best = params.unknown_penalty
                        + params.lm_weight * lm.unknown_prob()
                        + params.word_penalty;
                }
                table[begin * dim + end] = best;
            }
        }

        // Combine adjacent sub-spans, by increasing span length.
        for len in 2..=dim {
            for begin in 0..=(dim - len) {
                let end = begin + len - 1;
                let mut best = table[begin * dim + end];
                for split in begin..end {
                    let combined = table[begin * dim + split] + table[(split + 1) * dim + end];
                    best = best.max(combined);
                }
                table[begin * dim + end] = best;
            }
        }

        Self { dim, table }
    }

    /// Estimate of the span `[begin, end]`.
    pub(crate) fn span(&self, begin: usize, end: usize) -> f32 {
        self.table[begin * self.dim + end]
    }

    /// Estimate of everything `coverage` leaves open.
    pub(crate) fn of_coverage(&self, coverage: &Coverage) -> f32 {
        coverage
            .uncovered_runs(self.dim)
            .map(|(begin, end)| self.span(begin, end))
            .sum()
    }
}
