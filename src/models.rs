//! Core data models for playlist matching.
//!
//! Record types for both input lists, the match output row, and the
//! run statistics used for instrumentation.

use serde::{Deserialize, Serialize};

// ============================================================================
// Input Records
// ============================================================================

/// Song entry from the authoritative source list.
#[derive(Clone, Debug)]
pub struct SourceTrack {
    /// 1-based position in the source list
    pub index: usize,
    pub title: String,
    pub artist: String,
}

/// Song entry harvested from an external playlist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// 1-based position in the playlist
    pub index: usize,
    pub title: String,
    pub uploader: String,
    pub url: String,
    pub video_id: String,
}

// ============================================================================
// Match Output
// ============================================================================

/// How a match's combined score was formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    /// Artist identity strongly confirmed; word overlap still dominates
    #[serde(rename = "hybrid_high_quality")]
    HybridHighQuality,
    /// Artist signal usable but not conclusive
    #[serde(rename = "hybrid_medium_quality")]
    HybridMediumQuality,
    /// Artist signal too weak to trust; title overlap only
    #[serde(rename = "hybrid_word_based")]
    HybridWordBased,
}

impl MatchMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchMethod::HybridHighQuality => "hybrid_high_quality",
            MatchMethod::HybridMediumQuality => "hybrid_medium_quality",
            MatchMethod::HybridWordBased => "hybrid_word_based",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One confirmed source-to-playlist match with its score breakdown.
///
/// Invariants for a completed run: each source position and each playlist
/// video id appears in at most one record. Score fields are rounded to
/// 3 decimal places at creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub source_index: usize,
    pub source_title: String,
    pub source_artist: String,
    pub playlist_index: usize,
    pub playlist_title: String,
    pub playlist_uploader: String,
    pub url: String,
    pub video_id: String,
    pub hybrid_score: f64,
    pub word_similarity: f64,
    pub artist_similarity: f64,
    pub common_tokens: usize,
    pub method: MatchMethod,
}

/// Round to 3 decimal places for stable, readable output.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// Run Statistics (Instrumentation)
// ============================================================================

/// Per-run matching statistics.
#[derive(Default, Debug, Clone, Serialize)]
pub struct MatchRunStats {
    pub source_count: usize,
    pub candidate_count: usize,

    // Matches confirmed per stage, in stage order (0.8, 0.6, 0.4)
    pub stage_matches: Vec<usize>,

    // Matches per scoring method
    pub high_quality: usize,
    pub medium_quality: usize,
    pub word_based: usize,

    pub total_matches: usize,
    pub elapsed_seconds: f64,
}

impl MatchRunStats {
    /// Match rate over the source list as a percentage.
    pub fn match_rate(&self) -> f64 {
        if self.source_count == 0 {
            0.0
        } else {
            100.0 * self.total_matches as f64 / self.source_count as f64
        }
    }

    pub fn record_method(&mut self, method: MatchMethod) {
        match method {
            MatchMethod::HybridHighQuality => self.high_quality += 1,
            MatchMethod::HybridMediumQuality => self.medium_quality += 1,
            MatchMethod::HybridWordBased => self.word_based += 1,
        }
        self.total_matches += 1;
    }

    /// Log stats to stderr in JSON format.
    pub fn log(&self) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS]\n{}", json);
        }
    }

    /// Write stats to a JSON file.
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
