//! The sentence decoder.

use std::sync::atomic::{AtomicBool, Ordering};

use glossa_core::PhraseUid;
use glossa_lm::{LmModel, LmQueryProxy};
use glossa_models::{
    Orientation, ReorderingModel, RmQueryProxy, TmQueryProxy, TmTarget, TranslationModel,
};
use tracing::{debug, trace};

use crate::coverage::Coverage;
use crate::error::DecoderError;
use crate::future::FutureCosts;
use crate::hypothesis::{HypoArena, Hypothesis};
use crate::params::{DecoderParams, MAX_WORDS_PER_SENTENCE};
use crate::sent_data::SentenceDataMap;
use crate::stack::Stack;

/// Outcome of decoding one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceResult {
    /// The target sentence.
    pub text: String,
    /// Per-stack search-space load, present when translation info was
    /// requested; one entry per stack, `N + 1` in total.
    pub stack_loads: Option<Vec<u32>>,
}

/// Decoder for a single sentence.
///
/// Borrows the process-global models; all mutable state lives inside
/// [`SentenceDecoder::translate`], so one decoder value may serve many
/// sentences in sequence.
pub struct SentenceDecoder<'a> {
    params: &'a DecoderParams,
    lm: &'a dyn LmModel,
    tm: &'a TranslationModel,
    rm: &'a ReorderingModel,
    stop: &'a AtomicBool,
}

impl<'a> SentenceDecoder<'a> {
    /// Bind a decoder to the models and the job's stop flag.
    #[must_use]
    pub fn new(
        params: &'a DecoderParams,
        lm: &'a dyn LmModel,
        tm: &'a TranslationModel,
        rm: &'a ReorderingModel,
        stop: &'a AtomicBool,
    ) -> Self {
        Self {
            params,
            lm,
            tm,
            rm,
            stop,
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Translate one tokenised, lower-cased source sentence.
    ///
    /// A stop request is not an error: the source text comes back
    /// verbatim. An empty source yields an empty target.
    ///
    /// # Errors
    ///
    /// Returns [`DecoderError::TooLong`] for sentences over
    /// [`MAX_WORDS_PER_SENTENCE`] words and [`DecoderError::Internal`]
    /// when the search violates its own invariants.
    pub fn translate(
        &self,
        source: &str,
        want_info: bool,
    ) -> Result<SentenceResult, DecoderError> {
        let source = source.trim();
        if source.is_empty() {
            return Ok(SentenceResult {
                text: String::new(),
                stack_loads: want_info.then(|| vec![0]),
            });
        }

        let tokens = tokenize(source);
        if tokens.len() > MAX_WORDS_PER_SENTENCE {
            return Err(DecoderError::TooLong {
                words: tokens.len(),
                max: MAX_WORDS_PER_SENTENCE,
            });
        }

        // Phase 1: span map and translation-model lookups.
        let mut tm_proxy = TmQueryProxy::new(self.tm);
        let sent_data = self.bootstrap(source, &tokens, &mut tm_proxy);
        if self.stopped() {
            return Ok(identity_result(source, want_info));
        }

        // Phase 2: prime the reordering model for this sentence's pairs.
        let mut rm_proxy = RmQueryProxy::new(self.rm);
        rm_proxy.execute(&tm_proxy.source_target_uids());
        if self.stopped() {
            return Ok(identity_result(source, want_info));
        }

        // Phase 3: the multi-stack search.
        self.search(source, &sent_data, &rm_proxy, want_info)
    }

    /// Fill the triangular span map, submitting every span to the TM.
    ///
    /// Span uids are built incrementally from the previous column entry
    /// and the diagonal token uid.
    fn bootstrap<'p>(
        &self,
        source: &str,
        tokens: &[(usize, usize)],
        tm_proxy: &mut TmQueryProxy<'p>,
    ) -> SentenceDataMap {
        let dim = tokens.len();
        let mut sent_data = SentenceDataMap::new(dim);

        for (end, &(begin_ch, end_ch)) in tokens.iter().enumerate() {
            if self.stopped() {
                break;
            }

            let token_uid = PhraseUid::from_token(&source[begin_ch..end_ch]);
            {
                let diag = sent_data.get_mut(end, end);
                diag.begin_ch = begin_ch;
                diag.end_ch = end_ch;
                diag.phrase_uid = token_uid;
                diag.tm_entry = tm_proxy.execute(token_uid);
            }
            trace!(token = &source[begin_ch..end_ch], uid = %token_uid, "span map token");

            let first_begin = (end + 1).saturating_sub(self.params.max_source_phrase_len);
            for begin in first_begin..end {
                let prev_uid = sent_data.get(begin, end - 1).phrase_uid;
                let prev_begin_ch = sent_data.get(begin, end - 1).begin_ch;
                let span_uid = prev_uid.combine(token_uid);

                let cell = sent_data.get_mut(begin, end);
                cell.begin_ch = prev_begin_ch;
                cell.end_ch = end_ch;
                cell.phrase_uid = span_uid;
                cell.tm_entry = tm_proxy.execute(span_uid);
            }
        }

        sent_data
    }

    #[allow(clippy::too_many_lines)]
    fn search(
        &self,
        source: &str,
        sent_data: &SentenceDataMap,
        rm_proxy: &RmQueryProxy<'_>,
        want_info: bool,
    ) -> Result<SentenceResult, DecoderError> {
        let dim = sent_data.dim();
        let capacity = self.params.stack_capacity;
        let threshold = self.params.pruning_threshold;

        let future = FutureCosts::compute(sent_data, self.params, self.lm);
        let mut lm_proxy = LmQueryProxy::new(self.lm);

        let mut arena = HypoArena::new();
        let mut stacks: Vec<Stack> = (0..=dim).map(|_| Stack::new()).collect();
        let mut loads = vec![0u32; dim + 1];

        let root = arena.push(Hypothesis::root(future.of_coverage(&Coverage::new())));
        stacks[0].insert(&mut arena, root);

        for count in 0..=dim {
            if self.stopped() {
                return Ok(identity_result(source, want_info));
            }

            loads[count] = stacks[count].prune(&arena, capacity, threshold);
            if count == dim {
                break;
            }

            let items = stacks[count].items().to_vec();
            for hyp_idx in items {
                if self.stopped() {
                    return Ok(identity_result(source, want_info));
                }
                self.expand(
                    source,
                    sent_data,
                    rm_proxy,
                    &future,
                    &mut lm_proxy,
                    &mut arena,
                    &mut stacks,
                    hyp_idx,
                );
            }
        }

        let Some(best) = stacks[dim].best() else {
            return Err(DecoderError::Internal(
                "search ended with an empty final stack".to_owned(),
            ));
        };

        let text = arena.backtrace(best);
        debug!(
            score = f64::from(arena.get(best).score),
            hypotheses = stacks.iter().map(Stack::inserted).sum::<usize>(),
            "sentence decoded"
        );

        Ok(SentenceResult {
            text,
            stack_loads: want_info.then_some(loads),
        })
    }

    /// Create every successor of one hypothesis.
    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        source: &str,
        sent_data: &SentenceDataMap,
        rm_proxy: &RmQueryProxy<'_>,
        future: &FutureCosts,
        lm_proxy: &mut LmQueryProxy<'_>,
        arena: &mut HypoArena,
        stacks: &mut [Stack],
        hyp_idx: usize,
    ) {
        let dim = sent_data.dim();
        let (coverage, window, score, last_span, last_st_uid) = {
            let hyp = arena.get(hyp_idx);
            (
                hyp.coverage,
                hyp.window.clone(),
                hyp.score,
                hyp.last_span,
                hyp.last_st_uid,
            )
        };

        // The leftmost gap may always be covered, whatever the distortion
        // limit says; otherwise the search could strand it.
        let Some(first_gap) = coverage.first_uncovered(dim) else {
            return;
        };
        let next_monotone = last_span.map_or(0, |(_, end)| end + 1);

        for begin in 0..dim {
            let within_limit = begin.abs_diff(next_monotone) <= self.params.distortion_limit;
            if !within_limit && begin != first_gap {
                continue;
            }

            let max_end = (begin + self.params.max_source_phrase_len).min(dim) - 1;
            for end in begin..=max_end {
                if coverage.overlaps(begin, end) {
                    break;
                }

                let cell = sent_data.get(begin, end);
                let unknown_target;
                let targets: &[TmTarget] = match &cell.tm_entry {
                    Some(entry) => &entry.targets,
                    None if begin == end => {
                        let token = &source[cell.begin_ch..cell.end_ch];
                        unknown_target = [TmTarget::unknown(
                            token,
                            self.lm.word_id(token),
                            self.params.unknown_penalty,
                        )];
                        &unknown_target
                    }
                    None => continue,
                };

                let orientation = orientation_of(begin, end, last_span);
                let new_coverage = coverage.cover(begin, end);
                let new_future = future.of_coverage(&new_coverage);
                let dest = new_coverage.count();

                for target in targets {
                    let mut seq = window.clone();
                    seq.extend_from_slice(&target.word_ids);
                    let (lm_inc, _) = lm_proxy.execute(&seq, window.len() + 1);

                    let mut rm_inc = rm_proxy
                        .entry(target.st_uid)
                        .weight(orientation, false);
                    if let Some(prev) = last_st_uid {
                        rm_inc += rm_proxy.entry(prev).weight(orientation, true);
                    }

                    let new_score = score
                        + target.score
                        + self.params.lm_weight * lm_inc
                        + self.params.rm_weight * rm_inc
                        + self.params.word_penalty * target.word_ids.len() as f32;

                    let successor = Hypothesis {
                        coverage: new_coverage,
                        window: {
                            let hyp = arena.get(hyp_idx);
                            hyp.extended_window(&target.word_ids)
                        },
                        score: new_score,
                        future: new_future,
                        parent: Some(hyp_idx),
                        emitted: target.text.clone(),
                        last_span: Some((begin, end)),
                        last_st_uid: Some(target.st_uid),
                        serial: 0,
                        alternatives: Vec::new(),
                    };
                    let new_idx = arena.push(successor);
                    stacks[dest].insert(arena, new_idx);
                }
            }
        }
    }
}

/// Best-effort result when the stop flag interrupts decoding.
fn identity_result(source: &str, want_info: bool) -> SentenceResult {
    SentenceResult {
        text: source.to_owned(),
        stack_loads: want_info.then(Vec::new),
    }
}

/// Byte ranges of the whitespace-separated tokens of `source`.
fn tokenize(source: &str) -> Vec<(usize, usize)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (idx, ch) in source.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push((s, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        tokens.push((s, source.len()));
    }
    tokens
}

/// Orientation of a newly covered span relative to the previous one.
fn orientation_of(begin: usize, end: usize, last_span: Option<(usize, usize)>) -> Orientation {
    match last_span {
        None => {
            if begin == 0 {
                Orientation::Monotone
            } else {
                Orientation::Discontinuous
            }
        }
        Some((last_begin, last_end)) => {
            if begin == last_end + 1 {
                Orientation::Monotone
            } else if end + 1 == last_begin {
                Orientation::Swap
            } else {
                Orientation::Discontinuous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_reports_byte_ranges() {
        let toks = tokenize(" hello  world ");
        assert_eq!(toks.len(), 2);
        assert_eq!(&" hello  world "[toks[0].0..toks[0].1], "hello");
        assert_eq!(&" hello  world "[toks[1].0..toks[1].1], "world");
    }

    #[test]
    fn orientation_classification() {
        assert_eq!(orientation_of(0, 1, None), Orientation::Monotone);
        assert_eq!(orientation_of(2, 3, None), Orientation::Discontinuous);
        assert_eq!(orientation_of(2, 3, Some((0, 1))), Orientation::Monotone);
        assert_eq!(orientation_of(0, 1, Some((2, 3))), Orientation::Swap);
        assert_eq!(
            orientation_of(4, 4, Some((0, 1))),
            Orientation::Discontinuous
        );
    }
}
