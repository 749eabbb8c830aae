//! Model file loading.
//!
//! Both models use the `|||`-separated phrase-table format:
//!
//! ```text
//! source phrase ||| target phrase ||| f1 f2 f3 f4      (translation model)
//! source phrase ||| target phrase ||| w1 .. w6         (reordering model)
//! ```
//!
//! Files are read once at startup; any problem is fatal.

use std::path::Path;

use glossa_core::PhraseUid;
use glossa_lm::LmModel;
use tracing::info;

use crate::error::ModelsError;
use crate::rm::{ReorderingModel, RmEntry};
use crate::tm::{TM_NUM_FEATURES, TranslationModel};

const FIELD_SEP: &str = "|||";

fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_SEP).map(str::trim).collect()
}

fn parse_weights<const N: usize>(
    field: &str,
    path: &Path,
    line: usize,
) -> Result<[f32; N], ModelsError> {
    let mut out = [0.0f32; N];
    let mut count = 0;
    for (slot, token) in out.iter_mut().zip(field.split_whitespace()) {
        *slot = token.parse().map_err(|e| ModelsError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("bad weight {token}: {e}"),
        })?;
        count += 1;
    }
    if count != N || field.split_whitespace().count() != N {
        return Err(ModelsError::Parse {
            path: path.to_path_buf(),
            line,
            reason: format!("expected {N} weights, got {}", field.split_whitespace().count()),
        });
    }
    Ok(out)
}

/// Load the translation model from `path`.
///
/// Target phrases are mapped through the LM vocabulary so the decoder can
/// score them without re-tokenising.
///
/// # Errors
///
/// Returns [`ModelsError`] for unreadable files or malformed lines.
pub fn load_tm(
    path: &Path,
    weights: [f32; TM_NUM_FEATURES],
    lm: &dyn LmModel,
) -> Result<TranslationModel, ModelsError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tm = TranslationModel::new(weights);
    let mut lines = 0usize;
    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        let [source, target, feats] = fields.as_slice() else {
            return Err(ModelsError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("expected 3 fields, got {}", fields.len()),
            });
        };
        let features = parse_weights::<TM_NUM_FEATURES>(feats, path, idx + 1)?;
        tm.add(source, target, features, lm);
        lines += 1;
    }

    tm.finalize();
    info!(path = %path.display(), entries = lines, "translation model loaded");
    Ok(tm)
}

/// Load the reordering model from `path`.
///
/// # Errors
///
/// Returns [`ModelsError`] for unreadable files or malformed lines.
pub fn load_rm(path: &Path, fallback: RmEntry) -> Result<ReorderingModel, ModelsError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rm = ReorderingModel::new(fallback);
    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields = split_fields(line);
        let [source, target, weights] = fields.as_slice() else {
            return Err(ModelsError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: format!("expected 3 fields, got {}", fields.len()),
            });
        };
        let weights = parse_weights::<6>(weights, path, idx + 1)?;
        let st_uid = PhraseUid::from_phrase(source).combine(PhraseUid::from_phrase(target));
        rm.add(st_uid, RmEntry(weights));
    }

    info!(path = %path.display(), entries = rm.len(), "reordering model loaded");
    Ok(rm)
}
