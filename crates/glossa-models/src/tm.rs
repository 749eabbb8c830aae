//! The translation model and its per-sentence query proxy.

use std::collections::HashMap;
use std::sync::Arc;

use glossa_core::{PhraseUid, WordUid};
use glossa_lm::LmModel;

/// Number of feature weights per translation entry.
pub const TM_NUM_FEATURES: usize = 4;

/// Longest admissible target phrase, in words.
///
/// Bounded so that the LM history window plus one target phrase always
/// fits into a single language-model query.
pub const TM_MAX_TARGET_PHRASE_LEN: usize =
    glossa_lm::MAX_QUERY_WORDS - (glossa_lm::LM_MAX_LEVEL - 1);

/// One target-side translation of a source phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct TmTarget {
    /// Target phrase text.
    pub text: String,
    /// Target words mapped through the LM vocabulary.
    pub word_ids: Vec<WordUid>,
    /// Raw log10 feature values.
    pub features: [f32; TM_NUM_FEATURES],
    /// Weighted translation score (dot product with the model weights).
    pub score: f32,
    /// Source-target pair uid, the key into the reordering model.
    pub st_uid: PhraseUid,
}

impl TmTarget {
    /// Identity translation for an unknown single token.
    ///
    /// Carries the configured unknown penalty as its score; the st-uid
    /// pairs the token with itself.
    #[must_use]
    pub fn unknown(token: &str, word_id: WordUid, penalty: f32) -> Self {
        let uid = PhraseUid::from_token(token);
        Self {
            text: token.to_owned(),
            word_ids: vec![word_id],
            features: [penalty; TM_NUM_FEATURES],
            score: penalty,
            st_uid: uid.combine(uid),
        }
    }
}

/// All known translations of one source phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct TmSourceEntry {
    /// Uid of the source phrase.
    pub source_uid: PhraseUid,
    /// Candidate translations, best score first.
    pub targets: Vec<TmTarget>,
}

impl TmSourceEntry {
    /// The best weighted score among the targets.
    #[must_use]
    pub fn best_score(&self) -> Option<f32> {
        self.targets.first().map(|t| t.score)
    }
}

/// The process-global translation model.
pub struct TranslationModel {
    entries: HashMap<PhraseUid, Arc<TmSourceEntry>>,
    weights: [f32; TM_NUM_FEATURES],
}

impl TranslationModel {
    /// Create an empty model with the given feature weights.
    #[must_use]
    pub fn new(weights: [f32; TM_NUM_FEATURES]) -> Self {
        Self {
            entries: HashMap::new(),
            weights,
        }
    }

    /// Add one `source → target` option; entries are score-sorted per
    /// source once [`TranslationModel::finalize`] runs.
    pub fn add(
        &mut self,
        source_phrase: &str,
        target_phrase: &str,
        features: [f32; TM_NUM_FEATURES],
        lm: &dyn LmModel,
    ) {
        let source_uid = PhraseUid::from_phrase(source_phrase);
        let target_uid = PhraseUid::from_phrase(target_phrase);
        let score = features
            .iter()
            .zip(&self.weights)
            .map(|(f, w)| f * w)
            .sum();
        let word_ids: Vec<WordUid> = target_phrase
            .split_whitespace()
            .map(|token| lm.word_id(token))
            .collect();
        if word_ids.is_empty() {
            tracing::warn!(source = source_phrase, "entry with an empty target dropped");
            return;
        }
        if word_ids.len() > TM_MAX_TARGET_PHRASE_LEN {
            tracing::warn!(
                source = source_phrase,
                target = target_phrase,
                "target phrase over {TM_MAX_TARGET_PHRASE_LEN} words dropped"
            );
            return;
        }

        let entry = self
            .entries
            .entry(source_uid)
            .or_insert_with(|| {
                Arc::new(TmSourceEntry {
                    source_uid,
                    targets: Vec::new(),
                })
            });
        Arc::make_mut(entry).targets.push(TmTarget {
            text: target_phrase.to_owned(),
            word_ids,
            features,
            score,
            st_uid: source_uid.combine(target_uid),
        });
    }

    /// Sort every entry's targets best-first. Call once after loading.
    pub fn finalize(&mut self) {
        for entry in self.entries.values_mut() {
            Arc::make_mut(entry)
                .targets
                .sort_by(|a, b| b.score.total_cmp(&a.score));
        }
    }

    /// Pure lookup of a source phrase.
    #[must_use]
    pub fn entry(&self, uid: PhraseUid) -> Option<Arc<TmSourceEntry>> {
        self.entries.get(&uid).cloned()
    }

    /// Number of distinct source phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the model holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-sentence translation-model query.
///
/// Records every retrieved source entry so the reordering model can be
/// primed with the sentence's source-target pairs in one pass.
pub struct TmQueryProxy<'a> {
    model: &'a TranslationModel,
    found: Vec<Arc<TmSourceEntry>>,
}

impl<'a> TmQueryProxy<'a> {
    /// Create a proxy over the model.
    #[must_use]
    pub fn new(model: &'a TranslationModel) -> Self {
        Self {
            model,
            found: Vec::new(),
        }
    }

    /// Look up one source span; same inputs always give the same outputs.
    pub fn execute(&mut self, uid: PhraseUid) -> Option<Arc<TmSourceEntry>> {
        let entry = self.model.entry(uid);
        if let Some(entry) = &entry {
            self.found.push(Arc::clone(entry));
        }
        entry
    }

    /// Source-target pair uids of every translation retrieved so far.
    #[must_use]
    pub fn source_target_uids(&self) -> Vec<PhraseUid> {
        self.found
            .iter()
            .flat_map(|entry| entry.targets.iter().map(|t| t.st_uid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glossa_lm::LmBuilder;

    use super::*;

    fn toy_lm() -> glossa_lm::HashMapTrie {
        LmBuilder::new()
            .unknown(-6.0)
            .unigram("hallo", -1.0, 0.0)
            .unigram("welt", -1.1, 0.0)
            .build()
    }

    #[test]
    fn lookups_are_pure() {
        let lm = toy_lm();
        let mut tm = TranslationModel::new([1.0; TM_NUM_FEATURES]);
        tm.add("hello", "hallo", [-0.1, -0.2, -0.3, -0.4], &lm);
        tm.finalize();

        let uid = PhraseUid::from_phrase("hello");
        let a = tm.entry(uid).unwrap();
        let b = tm.entry(uid).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.targets.len(), 1);
        assert!((a.targets[0].score - (-1.0)).abs() < 1e-6);
    }

    #[test]
    fn targets_are_sorted_best_first() {
        let lm = toy_lm();
        let mut tm = TranslationModel::new([1.0, 0.0, 0.0, 0.0]);
        tm.add("hello", "welt", [-2.0, 0.0, 0.0, 0.0], &lm);
        tm.add("hello", "hallo", [-0.5, 0.0, 0.0, 0.0], &lm);
        tm.finalize();

        let entry = tm.entry(PhraseUid::from_phrase("hello")).unwrap();
        assert_eq!(entry.targets[0].text, "hallo");
        assert_eq!(entry.best_score(), Some(-0.5));
    }

    #[test]
    fn proxy_collects_source_target_pairs() {
        let lm = toy_lm();
        let mut tm = TranslationModel::new([1.0; TM_NUM_FEATURES]);
        tm.add("hello", "hallo", [-0.1; TM_NUM_FEATURES], &lm);
        tm.add("world", "welt", [-0.2; TM_NUM_FEATURES], &lm);
        tm.finalize();

        let mut proxy = TmQueryProxy::new(&tm);
        assert!(proxy.execute(PhraseUid::from_phrase("hello")).is_some());
        assert!(proxy.execute(PhraseUid::from_phrase("missing")).is_none());
        assert!(proxy.execute(PhraseUid::from_phrase("world")).is_some());

        let pairs = proxy.source_target_uids();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0],
            PhraseUid::from_phrase("hello").combine(PhraseUid::from_phrase("hallo"))
        );
    }

    #[test]
    fn unknown_target_is_an_identity_with_penalty() {
        let target = TmTarget::unknown("zork", WordUid::UNKNOWN, -10.0);
        assert_eq!(target.text, "zork");
        assert_eq!(target.word_ids, vec![WordUid::UNKNOWN]);
        assert!((target.score - (-10.0)).abs() < 1e-6);
    }
}
