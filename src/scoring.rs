//! Scoring functions for playlist matching.
//!
//! Two independent measures feed the hybrid score:
//! - word overlap between the token sets of two titles
//! - character-level sequence similarity between two artist names

use rustc_hash::FxHashMap;

use crate::models::MatchMethod;
use crate::normalize::{normalize, TokenSet};

// ============================================================================
// Policy Constants
// ============================================================================

/// Artist similarity at or above this corroborates the match strongly.
pub const ARTIST_STRONG: f64 = 0.8;

/// Artist similarity at or above this is a usable secondary signal.
pub const ARTIST_WEAK: f64 = 0.5;

/// Channel-branding markers that are source noise, not artist identity.
const CHANNEL_SUFFIXES: [&str; 2] = [" - topic", " official"];

// ============================================================================
// Word Similarity
// ============================================================================

/// Word-overlap ratio between two token sets, plus the common-token count.
///
/// The denominator is the larger set's cardinality, not the union size:
/// a short title fully contained in a long title still scores low, which
/// favors precision over recall for partial titles.
pub fn word_similarity(a: &TokenSet, b: &TokenSet) -> (f64, usize) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 0);
    }
    let common = a.intersection(b).count();
    let total = a.len().max(b.len());
    (common as f64 / total as f64, common)
}

// ============================================================================
// Artist Similarity
// ============================================================================

/// Fuzzy similarity between two artist/uploader names in [0, 1].
///
/// Both names are normalized and stripped of channel-branding markers.
/// Names shorter than two characters after stripping carry too little
/// signal and score 0.0.
pub fn artist_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a = strip_channel_suffixes(&normalize(a));
    let b = strip_channel_suffixes(&normalize(b));

    if a.chars().count() < 2 || b.chars().count() < 2 {
        return 0.0;
    }

    sequence_ratio(&a, &b)
}

fn strip_channel_suffixes(name: &str) -> String {
    let mut result = name.to_string();
    for suffix in CHANNEL_SUFFIXES {
        result = result.replace(suffix, "");
    }
    result
}

/// Ratcliff/Obershelp sequence similarity: `2 * M / T` where `M` is the
/// total size of the longest matching blocks and `T` the combined length.
/// Symmetric, and 1.0 only for identical strings.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Recurse around each longest matching block, summing block sizes.
    let mut matches = 0usize;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(&a, &b, alo, ahi, blo, bhi);
        if size > 0 {
            matches += size;
            pending.push((alo, i, blo, j));
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    2.0 * matches as f64 / (a.len() + b.len()) as f64
}

/// Longest block of consecutive equal characters within the given window,
/// earliest occurrence winning ties.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);
    // j2len[j] = length of the longest run ending at a[i], b[j]
    let mut j2len: FxHashMap<usize, usize> = FxHashMap::default();

    for i in alo..ahi {
        let mut next: FxHashMap<usize, usize> = FxHashMap::default();
        for j in blo..bhi {
            if a[i] == b[j] {
                let run = if j > blo {
                    j2len.get(&(j - 1)).copied().unwrap_or(0) + 1
                } else {
                    1
                };
                next.insert(j, run);
                if run > best_size {
                    best_i = i + 1 - run;
                    best_j = j + 1 - run;
                    best_size = run;
                }
            }
        }
        j2len = next;
    }

    (best_i, best_j, best_size)
}

// ============================================================================
// Hybrid Scoring
// ============================================================================

/// Combine word overlap and artist similarity into one confidence score.
///
/// Word overlap is the primary discriminator; artist similarity is only
/// trusted as a corroborating signal once it clears a confidence floor.
pub fn hybrid_score(word_ratio: f64, artist_ratio: f64) -> (f64, MatchMethod) {
    if artist_ratio >= ARTIST_STRONG {
        (
            word_ratio * 0.75 + artist_ratio * 0.25,
            MatchMethod::HybridHighQuality,
        )
    } else if artist_ratio >= ARTIST_WEAK {
        (
            word_ratio * 0.80 + artist_ratio * 0.20,
            MatchMethod::HybridMediumQuality,
        )
    } else {
        (word_ratio * 0.90, MatchMethod::HybridWordBased)
    }
}
