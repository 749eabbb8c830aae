//! Line-oriented language-model file loading.
//!
//! Format, one entry per line, tab-separated:
//!
//! ```text
//! w1 w2 .. wk<TAB>log10-prob<TAB>back-off
//! ```
//!
//! The reserved token `<unk>` sets the unknown-word payload. Empty lines
//! and `#` comments are skipped. The file is read once at startup; any
//! problem is fatal.

use std::path::Path;

use tracing::info;

use crate::builder::LmBuilder;
use crate::error::LmError;
use crate::trie::HashMapTrie;

/// The reserved unknown-word token.
const UNK_TOKEN: &str = "<unk>";

/// Load a language model from `path`.
///
/// # Errors
///
/// Returns [`LmError`] when the file cannot be read, a line does not
/// parse, or no unigram entries are present.
pub fn load_lm(path: &Path) -> Result<HashMapTrie, LmError> {
    let text = std::fs::read_to_string(path).map_err(|source| LmError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut builder = LmBuilder::new();
    let mut unigrams = 0usize;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parse_err = |reason: String| LmError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let mut fields = line.split('\t');
        let words_field = fields
            .next()
            .ok_or_else(|| parse_err("missing words field".to_owned()))?;
        let prob: f32 = fields
            .next()
            .ok_or_else(|| parse_err("missing probability field".to_owned()))?
            .parse()
            .map_err(|e| parse_err(format!("bad probability: {e}")))?;
        let back_off: f32 = fields
            .next()
            .map_or(Ok(0.0), str::parse)
            .map_err(|e| parse_err(format!("bad back-off: {e}")))?;

        let words: Vec<&str> = words_field.split_whitespace().collect();
        match words.as_slice() {
            [] => return Err(parse_err("empty m-gram".to_owned())),
            [UNK_TOKEN] => {
                builder = builder.unknown(prob);
            }
            tokens => {
                if tokens.len() == 1 {
                    unigrams += 1;
                }
                builder = builder.ngram(tokens, prob, back_off);
            }
        }
    }

    if unigrams == 0 {
        return Err(LmError::EmptyModel {
            path: path.to_path_buf(),
        });
    }

    let trie = builder.build();
    info!(path = %path.display(), unigrams, "language model loaded");
    Ok(trie)
}
