//! End-to-end decoding against the shared toy models.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glossa_decoder::{DecoderError, DecoderParams, SentenceDecoder};
use glossa_test::{toy_lm, toy_rm, toy_tm};

fn decode(source: &str, want_info: bool) -> Result<glossa_decoder::SentenceResult, DecoderError> {
    let lm = toy_lm();
    let tm = toy_tm(&lm);
    let rm = toy_rm();
    let params = DecoderParams::default();
    let stop = AtomicBool::new(false);
    SentenceDecoder::new(&params, &lm, &tm, &rm, &stop).translate(source, want_info)
}

#[test]
fn translates_a_simple_sentence() {
    let result = decode("hello .", false).unwrap();
    assert_eq!(result.text, "hallo .");
    assert!(result.stack_loads.is_none());
}

#[test]
fn prefers_the_phrasal_option() {
    let result = decode("how are you ?", false).unwrap();
    assert_eq!(result.text, "wie geht es dir ?");
}

#[test]
fn empty_sentence_yields_an_empty_target() {
    let result = decode("", false).unwrap();
    assert_eq!(result.text, "");
    assert!(result.stack_loads.is_none());

    let result = decode("   ", false).unwrap();
    assert_eq!(result.text, "");
}

#[test]
fn trans_info_reports_one_load_per_stack() {
    let result = decode("how are you ?", true).unwrap();
    let loads = result.stack_loads.expect("loads requested");
    // One entry per coverage count: token count plus one.
    assert_eq!(loads.len(), 5);

    let result = decode("hello .", true).unwrap();
    assert_eq!(result.stack_loads.unwrap().len(), 3);
}

#[test]
fn unknown_tokens_pass_through_as_identity() {
    let result = decode("hello zork .", false).unwrap();
    let words: Vec<&str> = result.text.split_whitespace().collect();
    assert!(words.contains(&"zork"));
    assert!(words.contains(&"hallo"));
}

#[test]
fn over_long_sentences_fail_before_any_model_work() {
    let long = vec!["hello"; 101].join(" ");
    match decode(&long, false) {
        Err(DecoderError::TooLong { words, max }) => {
            assert_eq!(words, 101);
            assert_eq!(max, 100);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn max_length_sentence_terminates() {
    let long = vec!["hello"; 100].join(" ");
    let result = decode(&long, false).unwrap();
    assert_eq!(result.text.split_whitespace().count(), 100);
}

#[test]
fn stop_flag_yields_the_source_verbatim() {
    let lm = toy_lm();
    let tm = toy_tm(&lm);
    let rm = toy_rm();
    let params = DecoderParams::default();
    let stop = Arc::new(AtomicBool::new(false));
    stop.store(true, Ordering::Release);

    let decoder = SentenceDecoder::new(&params, &lm, &tm, &rm, &stop);
    let result = decoder.translate("hello .", false).unwrap();
    assert_eq!(result.text, "hello .");
}

#[test]
fn tight_beam_still_finds_a_translation() {
    let lm = toy_lm();
    let tm = toy_tm(&lm);
    let rm = toy_rm();
    let params = DecoderParams {
        stack_capacity: 1,
        pruning_threshold: 0.5,
        ..DecoderParams::default()
    };
    let stop = AtomicBool::new(false);
    let decoder = SentenceDecoder::new(&params, &lm, &tm, &rm, &stop);
    let result = decoder.translate("hello .", false).unwrap();
    assert_eq!(result.text.split_whitespace().count(), 2);
}
