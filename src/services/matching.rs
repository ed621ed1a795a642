//! Text normalization and approximate string matching.
//!
//! Similarity is the Ratcliff/Obershelp "gestalt pattern matching" ratio:
//! `2 * M / (len(a) + len(b))`, where `M` counts characters in matching blocks
//! found by taking the longest common substring and recursing on the pieces to
//! either side of it. The result is in `[0, 1]`; identical strings score 1.
//! Unlike a normalized edit distance it rewards long shared runs, so a single
//! inserted letter ("lattle" vs "latte") stays above 0.9.

/// Lower-cases `text` and drops every character that is neither alphanumeric
/// nor whitespace.
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Similarity ratio of two strings, compared character by character
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Number of characters in all matching blocks of `a` and `b`
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common substring of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`
///
/// Returns `(start_in_a, start_in_b, size)`. Among equally long candidates the
/// one starting earliest in `a` wins, then the one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // run[j - b_lo] = length of the common run ending at a[i - 1], b[j - 1]
    let width = b_hi - b_lo;
    let mut previous = vec![0usize; width + 1];
    let mut current = vec![0usize; width + 1];

    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let slot = j - b_lo + 1;
            current[slot] = if a[i] == b[j] { previous[slot - 1] + 1 } else { 0 };
            let run = current[slot];
            if run > best_size {
                best_i = i + 1 - run;
                best_j = j + 1 - run;
                best_size = run;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    (best_i, best_j, best_size)
}
