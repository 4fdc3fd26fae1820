//! Shared normalization and tokenization for playlist matching.
//! Used by the matcher binary and the merge tooling.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;

/// Set of normalized word tokens derived from a title.
pub type TokenSet = FxHashSet<String>;

/// Maximal runs of one script class each: CJK ideographs, hiragana,
/// katakana, or ASCII alphanumerics. A class boundary always splits,
/// so a mixed-script word yields one token per script.
static TOKEN_CLASSES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{4e00}-\u{9fff}]+|[\u{3040}-\u{309f}]+|[\u{30a0}-\u{30ff}]+|[a-z0-9]+")
        .unwrap()
});

/// Normalize free text for comparison.
///
/// Applies NFKC (full-width/half-width forms and compatibility ligatures
/// collapse), lowercases, strips parenthesis glyphs while keeping their
/// content, and collapses whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    let lowered = folded.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '（' | '）'))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the comparable word tokens of a title.
///
/// The input is normalized first, then split into script-class runs.
/// ASCII runs shorter than two characters are noise (single-letter
/// artifacts, stray numbering) and are dropped; tokens from the CJK
/// classes are kept at any length since single ideographs carry meaning.
pub fn tokenize(text: &str) -> TokenSet {
    let norm = normalize(text);
    let mut tokens = TokenSet::default();
    for m in TOKEN_CLASSES.find_iter(&norm) {
        let token = m.as_str();
        if token.is_ascii() && token.len() < 2 {
            continue;
        }
        tokens.insert(token.to_string());
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tokens: &[&str]) -> TokenSet {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("First Love (Live)"), "first love live");
        assert_eq!(normalize("  A   B  "), "a b");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_width_folding() {
        // Full-width forms collapse to ASCII under NFKC
        assert_eq!(normalize("ＦＩＲＳＴ　ＬＯＶＥ"), "first love");
        // Full-width parens stripped, content kept
        assert_eq!(normalize("曲名（ライブ）"), "曲名ライブ");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in ["First Love (Live)", "ＹＯＡＳＯＢＩ - Topic", "テスト  曲", ""] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_tokenize_latin() {
        assert_eq!(
            tokenize("First Love (Live)"),
            set(&["first", "love", "live"])
        );
        // Single-letter ASCII tokens are dropped
        assert_eq!(tokenize("A b cd 9"), set(&["cd"]));
    }

    #[test]
    fn test_tokenize_script_boundaries() {
        // Katakana / Latin boundary splits
        assert_eq!(tokenize("テストLive"), set(&["テスト", "live"]));
        // Kanji / hiragana / katakana are separate classes
        assert_eq!(tokenize("夜に駆ける"), set(&["夜", "に", "駆", "ける"]));
    }

    #[test]
    fn test_tokenize_single_ideograph_kept() {
        assert_eq!(tokenize("桜"), set(&["桜"]));
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("( )").is_empty());
    }
}
