//! Content-addressed phrase uids.
//!
//! A phrase uid is a 64-bit hash of a source or target phrase (or a single
//! token), used as the key into the translation and reordering models. Uids
//! are built incrementally: the uid of `w_0 .. w_k` is the uid of
//! `w_0 .. w_{k-1}` combined with the uid of `w_k`, so the decoder can fill
//! its triangular span map without re-hashing prefixes. The same combiner
//! drives the language model's sliding-window hash reuse.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 64-bit content hash of a phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhraseUid(pub u64);

impl PhraseUid {
    /// Reserved "no phrase" sentinel.
    pub const UNDEFINED: Self = Self(0);
    /// Reserved unknown-phrase sentinel.
    pub const UNKNOWN: Self = Self(1);
    /// First value a natural hash may occupy; lower hashes are shifted up.
    pub const MIN_VALID: Self = Self(2);

    /// Uid of a single token.
    ///
    /// The token bytes are hashed with blake3, truncated to 64 bits, folded
    /// onto the [`PhraseUid::UNDEFINED`] seed and shifted out of the
    /// sentinel range if necessary. The token is not trimmed or re-cased.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&blake3::hash(token.as_bytes()).as_bytes()[..8]);
        Self(shift_sentinels(combine_uids(
            Self::UNDEFINED.0,
            u64::from_le_bytes(raw),
        )))
    }

    /// Uid of a whitespace-separated phrase, built token by token.
    ///
    /// Equivalent to folding [`PhraseUid::combine`] over the token uids;
    /// an empty phrase yields [`PhraseUid::UNDEFINED`].
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let mut tokens = phrase.split_whitespace();
        let Some(first) = tokens.next() else {
            return Self::UNDEFINED;
        };
        tokens.fold(Self::from_token(first), |uid, token| {
            uid.combine(Self::from_token(token))
        })
    }

    /// Extend this uid with the uid of the next token or sub-phrase.
    ///
    /// The combination is not commutative: `a.combine(b) != b.combine(a)`
    /// for distinct phrases, so word order is preserved in the hash.
    #[must_use]
    pub fn combine(self, next: Self) -> Self {
        Self(combine_uids(self.0, next.0))
    }

    /// Whether the uid holds a real phrase hash.
    #[must_use]
    pub fn is_defined(self) -> bool {
        self != Self::UNDEFINED
    }
}

impl Default for PhraseUid {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl fmt::Display for PhraseUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Combine an accumulated 64-bit hash with the next value.
///
/// Order-dependent mix: the accumulator is perturbed by the shifted-xor
/// fold of the incoming value, then avalanched (splitmix64 finaliser) so
/// single-bit differences spread over the whole word.
#[must_use]
pub fn combine_uids(prev: u64, next: u64) -> u64 {
    let folded = prev
        ^ next
            .wrapping_add(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(prev << 6)
            .wrapping_add(prev >> 2);
    let mut h = folded;
    h ^= h >> 30;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 27;
    h = h.wrapping_mul(0x94d0_49bb_1331_11eb);
    h ^ (h >> 31)
}

fn shift_sentinels(raw: u64) -> u64 {
    if raw < PhraseUid::MIN_VALID.0 {
        raw + PhraseUid::MIN_VALID.0
    } else {
        raw
    }
}
