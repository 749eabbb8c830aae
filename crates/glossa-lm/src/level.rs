//! Precomputed `(begin, end) → level` tables.
//!
//! The query inner loop asks for the m-gram level, `level - 1` and
//! `level - 2` of every considered window; the tables trade three array
//! reads for the arithmetic and its branches.

use crate::payload::MAX_QUERY_WORDS;

/// `LEVEL[begin][end] = end - begin + 1` for `begin <= end`, else 0.
pub(crate) static LEVEL: [[usize; MAX_QUERY_WORDS]; MAX_QUERY_WORDS] = build_level_map(0);

/// `LEVEL_M1[begin][end] = level - 1`, saturating at 0.
pub(crate) static LEVEL_M1: [[usize; MAX_QUERY_WORDS]; MAX_QUERY_WORDS] = build_level_map(1);

/// `LEVEL_M2[begin][end] = level - 2`, saturating at 0.
pub(crate) static LEVEL_M2: [[usize; MAX_QUERY_WORDS]; MAX_QUERY_WORDS] = build_level_map(2);

const fn build_level_map(minus: usize) -> [[usize; MAX_QUERY_WORDS]; MAX_QUERY_WORDS] {
    let mut map = [[0usize; MAX_QUERY_WORDS]; MAX_QUERY_WORDS];
    let mut begin = 0;
    while begin < MAX_QUERY_WORDS {
        let mut end = begin;
        while end < MAX_QUERY_WORDS {
            let level = end - begin + 1;
            map[begin][end] = level.saturating_sub(minus);
            end += 1;
        }
        begin += 1;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_maps_agree_with_arithmetic() {
        for begin in 0..MAX_QUERY_WORDS {
            for end in begin..MAX_QUERY_WORDS {
                let level = end - begin + 1;
                assert_eq!(LEVEL[begin][end], level);
                assert_eq!(LEVEL_M1[begin][end], level - 1);
                assert_eq!(LEVEL_M2[begin][end], level.saturating_sub(2));
            }
        }
    }
}
