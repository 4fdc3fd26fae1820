//! Multi-pass greedy assignment between the source list and the playlist.
//!
//! Runs a fixed sequence of decreasing confidence thresholds. Each stage
//! scans every still-unmatched source record against every unconsumed
//! playlist entry, keeps the best-scoring pair at or above the stage
//! threshold, and consumes the winning entry. A consumed entry is
//! permanently unavailable to later stages; there is no backtracking.

use rustc_hash::FxHashSet;

use crate::models::{round3, MatchMethod, MatchRecord, PlaylistEntry, SourceTrack};
use crate::normalize::{tokenize, TokenSet};
use crate::scoring::{artist_similarity, hybrid_score, word_similarity};

/// Stage acceptance thresholds, strictly decreasing.
pub const STAGE_THRESHOLDS: [f64; 3] = [0.8, 0.6, 0.4];

/// Progress notification emitted while a run is in flight.
///
/// Decoupled from scoring so binaries can render bars or log lines
/// without the core knowing about either.
#[derive(Debug)]
pub enum MatchEvent<'a> {
    StageStarted {
        stage: usize,
        threshold: f64,
        unmatched: usize,
    },
    /// Sent after each unmatched source record has been scanned.
    RecordProcessed {
        stage: usize,
        processed: usize,
        unmatched: usize,
        matched: Option<&'a MatchRecord>,
    },
    StageFinished {
        stage: usize,
        threshold: f64,
        matched_in_stage: usize,
    },
}

/// Best candidate tracked while scanning one source record.
struct ScoredPair {
    candidate_pos: usize,
    score: f64,
    word_ratio: f64,
    artist_ratio: f64,
    common: usize,
    method: MatchMethod,
}

/// Matcher over two fully materialized record lists.
///
/// Token sets are computed once per record at construction; the matching
/// run itself performs no I/O and no allocation beyond the result set.
pub struct HybridMatcher<'a> {
    sources: &'a [SourceTrack],
    candidates: &'a [PlaylistEntry],
    source_tokens: Vec<TokenSet>,
    candidate_tokens: Vec<TokenSet>,
}

impl<'a> HybridMatcher<'a> {
    pub fn new(sources: &'a [SourceTrack], candidates: &'a [PlaylistEntry]) -> Self {
        let source_tokens = sources.iter().map(|s| tokenize(&s.title)).collect();
        let candidate_tokens = candidates.iter().map(|c| tokenize(&c.title)).collect();
        Self {
            sources,
            candidates,
            source_tokens,
            candidate_tokens,
        }
    }

    /// Run all stages and return the confirmed matches.
    ///
    /// The result order is deterministic: stage order first, then source
    /// order within a stage. No playlist video id appears twice.
    pub fn run(&self) -> Vec<MatchRecord> {
        self.run_with_observer(&mut |_| {})
    }

    pub fn run_with_observer(
        &self,
        observer: &mut dyn FnMut(MatchEvent<'_>),
    ) -> Vec<MatchRecord> {
        let mut matches: Vec<MatchRecord> = Vec::new();
        let mut matched_sources: FxHashSet<usize> = FxHashSet::default();
        let mut consumed: FxHashSet<usize> = FxHashSet::default();

        for (stage, &threshold) in STAGE_THRESHOLDS.iter().enumerate() {
            let unmatched = self.sources.len() - matched_sources.len();
            observer(MatchEvent::StageStarted {
                stage,
                threshold,
                unmatched,
            });

            let mut matched_in_stage = 0;
            let mut processed = 0;

            for (pos, source) in self.sources.iter().enumerate() {
                if matched_sources.contains(&pos) {
                    continue;
                }
                processed += 1;

                let best = self.best_candidate(pos, source, threshold, &consumed);

                let matched_now = if let Some(found) = best {
                    let entry = &self.candidates[found.candidate_pos];
                    consumed.insert(found.candidate_pos);
                    matched_sources.insert(pos);
                    matched_in_stage += 1;
                    matches.push(MatchRecord {
                        source_index: source.index,
                        source_title: source.title.clone(),
                        source_artist: source.artist.clone(),
                        playlist_index: entry.index,
                        playlist_title: entry.title.clone(),
                        playlist_uploader: entry.uploader.clone(),
                        url: entry.url.clone(),
                        video_id: entry.video_id.clone(),
                        hybrid_score: round3(found.score),
                        word_similarity: round3(found.word_ratio),
                        artist_similarity: round3(found.artist_ratio),
                        common_tokens: found.common,
                        method: found.method,
                    });
                    true
                } else {
                    false
                };

                observer(MatchEvent::RecordProcessed {
                    stage,
                    processed,
                    unmatched,
                    matched: if matched_now { matches.last() } else { None },
                });
            }

            observer(MatchEvent::StageFinished {
                stage,
                threshold,
                matched_in_stage,
            });
        }

        matches
    }

    /// Scan all unconsumed candidates for the given source record and
    /// return the best pair at or above the threshold. Ties keep the
    /// earliest-scanned candidate since only a strictly greater score
    /// replaces the running best.
    fn best_candidate(
        &self,
        pos: usize,
        source: &SourceTrack,
        threshold: f64,
        consumed: &FxHashSet<usize>,
    ) -> Option<ScoredPair> {
        let mut best: Option<ScoredPair> = None;

        for (candidate_pos, entry) in self.candidates.iter().enumerate() {
            if consumed.contains(&candidate_pos) {
                continue;
            }

            let (word_ratio, common) =
                word_similarity(&self.source_tokens[pos], &self.candidate_tokens[candidate_pos]);
            let artist_ratio = artist_similarity(&source.artist, &entry.uploader);
            let (score, method) = hybrid_score(word_ratio, artist_ratio);

            if score >= threshold && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ScoredPair {
                    candidate_pos,
                    score,
                    word_ratio,
                    artist_ratio,
                    common,
                    method,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchMethod;

    fn source(index: usize, title: &str, artist: &str) -> SourceTrack {
        SourceTrack {
            index,
            title: title.to_string(),
            artist: artist.to_string(),
        }
    }

    fn entry(index: usize, title: &str, uploader: &str) -> PlaylistEntry {
        PlaylistEntry {
            index,
            title: title.to_string(),
            uploader: uploader.to_string(),
            url: format!("https://www.youtube.com/watch?v=vid{:03}", index),
            video_id: format!("vid{:03}", index),
        }
    }

    #[test]
    fn test_exact_match_high_quality() {
        let sources = vec![source(1, "First Love (Live)", "Hikaru Utada")];
        let candidates = vec![entry(1, "first love live", "Hikaru Utada - Topic")];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.method, MatchMethod::HybridHighQuality);
        assert_eq!(m.word_similarity, 1.0);
        assert!(m.hybrid_score >= 0.95);
        assert_eq!(m.common_tokens, 3);
    }

    #[test]
    fn test_empty_candidates() {
        let sources = vec![source(1, "Anything", "Anyone")];
        let candidates: Vec<PlaylistEntry> = vec![];
        assert!(HybridMatcher::new(&sources, &candidates).run().is_empty());
    }

    #[test]
    fn test_empty_sources() {
        let sources: Vec<SourceTrack> = vec![];
        let candidates = vec![entry(1, "Song", "Artist")];
        assert!(HybridMatcher::new(&sources, &candidates).run().is_empty());
    }

    #[test]
    fn test_exclusivity_single_candidate() {
        // Two identical source titles, one matching candidate: the
        // first-scanned source consumes it, the second stays unmatched.
        let sources = vec![
            source(1, "Instrumental", "Composer A"),
            source(2, "Instrumental", "Composer A"),
        ];
        let candidates = vec![entry(1, "instrumental", "Composer A")];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source_index, 1);
    }

    #[test]
    fn test_no_video_id_reused() {
        let sources = vec![
            source(1, "Song Alpha", "Band"),
            source(2, "Song Alpha", "Band"),
            source(3, "Song Beta", "Band"),
        ];
        let candidates = vec![
            entry(1, "song alpha", "Band"),
            entry(2, "song alpha", "Band"),
            entry(3, "song beta", "Band"),
        ];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        let mut seen = FxHashSet::default();
        for m in &matches {
            assert!(seen.insert(m.video_id.clone()), "video id reused: {}", m.video_id);
        }
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_tie_breaks_to_first_scanned() {
        let sources = vec![source(1, "Same Song", "Same Artist")];
        // Two candidates scoring identically; the earlier one must win.
        let candidates = vec![
            entry(1, "same song", "Same Artist"),
            entry(2, "same song", "Same Artist"),
        ];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].playlist_index, 1);
    }

    #[test]
    fn test_stage_fallthrough() {
        // Half the tokens overlap and the uploader is unrelated, so the
        // score is 0.9 * 0.5 = 0.45: fails 0.8 and 0.6, matches at 0.4.
        let sources = vec![source(1, "Night Sky", "Somebody")];
        let candidates = vec![entry(1, "night drive", "xq_9z")];

        let mut stage_of_match = None;
        let mut events = 0;
        let matcher = HybridMatcher::new(&sources, &candidates);
        let matches = matcher.run_with_observer(&mut |event| {
            events += 1;
            if let MatchEvent::RecordProcessed { stage, matched: Some(_), .. } = event {
                stage_of_match = Some(stage);
            }
        });

        assert_eq!(matches.len(), 1);
        assert_eq!(stage_of_match, Some(2));
        assert_eq!(matches[0].hybrid_score, 0.45);
        assert!(events > 0);
    }

    #[test]
    fn test_matched_at_stage_meets_threshold() {
        let sources = vec![
            source(1, "Perfect Match", "The Band"),
            source(2, "Partial Overlap Title Here", "The Band"),
        ];
        let candidates = vec![
            entry(1, "perfect match", "The Band"),
            entry(2, "partial overlap song", "The Band"),
        ];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        for m in &matches {
            assert!(m.hybrid_score >= STAGE_THRESHOLDS[STAGE_THRESHOLDS.len() - 1]);
        }
    }

    #[test]
    fn test_deterministic_repeat_runs() {
        let sources = vec![
            source(1, "Tokyo Flash", "Vaundy"),
            source(2, "Dried Flower", "Yuuri"),
            source(3, "Betelgeuse", "Yuuri"),
        ];
        let candidates = vec![
            entry(1, "Dried Flower", "Yuuri - Topic"),
            entry(2, "Betelgeuse", "Yuuri Official"),
            entry(3, "Tokyo Flash", "Vaundy - Topic"),
        ];

        let matcher = HybridMatcher::new(&sources, &candidates);
        let first = matcher.run();
        let second = matcher.run();

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.source_index, b.source_index);
            assert_eq!(a.video_id, b.video_id);
            assert_eq!(a.hybrid_score, b.hybrid_score);
        }
    }

    #[test]
    fn test_consumed_candidate_unavailable_later() {
        // Source 1 takes the only good candidate at stage one; source 2
        // would have preferred it but must settle or stay unmatched.
        let sources = vec![
            source(1, "shared title", "Artist X"),
            source(2, "shared title extra words here", "Artist X"),
        ];
        let candidates = vec![entry(1, "shared title", "Artist X")];

        let matches = HybridMatcher::new(&sources, &candidates).run();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].source_index, 1);
    }
}
