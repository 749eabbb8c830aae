//! The English→German toy models.

use glossa_core::PhraseUid;
use glossa_lm::{HashMapTrie, LmBuilder, LmModel};
use glossa_models::{ReorderingModel, RmEntry, TM_NUM_FEATURES, TranslationModel};

/// A small German language model.
///
/// Unigrams for the vocabulary of [`toy_tm`] plus a few bigrams that
/// reward the expected word orders.
#[must_use]
pub fn toy_lm() -> HashMapTrie {
    LmBuilder::new()
        .unknown(-6.0)
        .unigram("hallo", -1.0, -0.3)
        .unigram("wie", -1.1, -0.3)
        .unigram("geht", -1.2, -0.3)
        .unigram("es", -1.0, -0.3)
        .unigram("dir", -1.3, -0.3)
        .unigram("du", -1.2, -0.3)
        .unigram("sind", -1.4, -0.3)
        .unigram("welt", -1.2, -0.3)
        .unigram(".", -0.4, -0.1)
        .unigram("?", -0.6, -0.1)
        .bigram("hallo", ".", -0.3, 0.0)
        .bigram("wie", "geht", -0.4, 0.0)
        .bigram("geht", "es", -0.3, 0.0)
        .bigram("es", "dir", -0.5, 0.0)
        .bigram("dir", "?", -0.4, 0.0)
        .build()
}

/// The matching English→German phrase table.
///
/// The phrasal option for `how are you` outscores the word-by-word path,
/// so the expected decodes are `hello .` → `hallo .` and
/// `how are you ?` → `wie geht es dir ?`.
#[must_use]
pub fn toy_tm(lm: &dyn LmModel) -> TranslationModel {
    let mut tm = TranslationModel::new([1.0; TM_NUM_FEATURES]);
    let mut add = |source: &str, target: &str, prob: f32| {
        tm.add(source, target, [prob, 0.0, 0.0, 0.0], lm);
    };

    add("hello", "hallo", -0.1);
    add(".", ".", -0.1);
    add("?", "?", -0.1);
    add("how are you", "wie geht es dir", -0.2);
    add("how", "wie", -0.6);
    add("are", "sind", -0.7);
    add("you", "du", -0.6);

    tm.finalize();
    tm
}

/// A reordering model that mildly prefers monotone decoding.
#[must_use]
pub fn toy_rm() -> ReorderingModel {
    let mut rm = ReorderingModel::new(RmEntry([-0.6, -1.2, -1.8, -0.6, -1.2, -1.8]));
    for (source, target) in [
        ("hello", "hallo"),
        (".", "."),
        ("?", "?"),
        ("how are you", "wie geht es dir"),
    ] {
        let st_uid = PhraseUid::from_phrase(source).combine(PhraseUid::from_phrase(target));
        rm.add(st_uid, RmEntry([-0.2, -1.0, -1.5, -0.2, -1.0, -1.5]));
    }
    rm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_consistent() {
        let lm = toy_lm();
        let tm = toy_tm(&lm);
        assert!(tm.entry(PhraseUid::from_phrase("hello")).is_some());
        assert!(tm.entry(PhraseUid::from_phrase("how are you")).is_some());
        assert!(!toy_rm().is_empty());
    }
}
