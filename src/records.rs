//! Delimited-file collaborators: reading the two input lists, writing
//! match results, and merging them back into the source table.
//!
//! The matching core never touches files; everything here runs before or
//! after a matching run, and fatal conditions (missing file, malformed
//! rows, unknown columns) surface to the caller instead of being
//! recovered mid-match.

use anyhow::{Context, Result};
use encoding_rs::SHIFT_JIS;
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::path::Path;

use crate::models::{MatchRecord, PlaylistEntry, SourceTrack};

/// Columns appended to the source table by the merge step.
pub const MERGE_COLUMNS: [&str; 10] = [
    "playlist_index",
    "playlist_title",
    "playlist_uploader",
    "playlist_url",
    "video_id",
    "hybrid_score",
    "word_similarity",
    "artist_similarity",
    "common_tokens",
    "match_method",
];

// ============================================================================
// Decoding
// ============================================================================

/// Decode file bytes as UTF-8, falling back to Shift_JIS.
///
/// Source lists exported from older spreadsheet tools are frequently
/// Shift_JIS encoded; playlist exports are always UTF-8. A UTF-8 BOM is
/// tolerated and stripped.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s.strip_prefix('\u{feff}').unwrap_or(s)),
        Err(_) => {
            let (text, _, _) = SHIFT_JIS.decode(bytes);
            text
        }
    }
}

// ============================================================================
// Source List
// ============================================================================

/// Parse the authoritative source list from CSV text.
///
/// Rows get 1-based positions in file order. Missing cells degrade to
/// empty strings; a missing column is an error.
pub fn parse_source_list(
    text: &str,
    title_column: &str,
    artist_column: &str,
) -> Result<Vec<SourceTrack>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let title_col = column_index(&headers, title_column)?;
    let artist_col = column_index(&headers, artist_column)?;

    let mut tracks = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        tracks.push(SourceTrack {
            index: row + 1,
            title: record.get(title_col).unwrap_or("").to_string(),
            artist: record.get(artist_col).unwrap_or("").to_string(),
        });
    }
    Ok(tracks)
}

pub fn read_source_list(
    path: &Path,
    title_column: &str,
    artist_column: &str,
) -> Result<Vec<SourceTrack>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read source list {}", path.display()))?;
    parse_source_list(&decode_text(&bytes), title_column, artist_column)
        .with_context(|| format!("malformed source list {}", path.display()))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers.iter().position(|h| h == name).with_context(|| {
        format!(
            "column '{}' not found (available: {})",
            name,
            headers.iter().collect::<Vec<_>>().join(", ")
        )
    })
}

// ============================================================================
// Playlist
// ============================================================================

/// Parse a harvested playlist export. Input order is preserved exactly;
/// the matcher's tie-breaking depends on it.
pub fn parse_playlist(text: &str) -> Result<Vec<PlaylistEntry>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut entries = Vec::new();
    for entry in reader.deserialize() {
        entries.push(entry?);
    }
    Ok(entries)
}

pub fn read_playlist(path: &Path) -> Result<Vec<PlaylistEntry>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read playlist {}", path.display()))?;
    parse_playlist(&decode_text(&bytes))
        .with_context(|| format!("malformed playlist {}", path.display()))
}

pub fn write_playlist(path: &Path, entries: &[PlaylistEntry]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

// ============================================================================
// Match Results
// ============================================================================

pub fn write_matches(path: &Path, records: &[MatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_matches(path: &Path) -> Result<Vec<MatchRecord>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read matches {}", path.display()))?;
    let text = decode_text(&bytes);
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

// ============================================================================
// Merge
// ============================================================================

/// Result of merging matches into the source table.
pub struct MergeOutcome {
    /// Source rows processed
    pub rows: usize,
    /// Rows that received match columns
    pub matched: usize,
    /// Merged CSV as UTF-8 with a BOM, so spreadsheet tools detect the
    /// encoding
    pub data: Vec<u8>,
}

/// Append the match columns to every row of the source table, keyed by
/// 1-based row position. Unmatched rows get empty cells.
pub fn merge_matches(source_text: &str, matches: &[MatchRecord]) -> Result<MergeOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source_text.as_bytes());
    let headers = reader.headers()?.clone();

    let by_index: FxHashMap<usize, &MatchRecord> =
        matches.iter().map(|m| (m.source_index, m)).collect();

    let mut data: Vec<u8> = vec![0xef, 0xbb, 0xbf];
    let mut rows = 0usize;
    let mut matched = 0usize;
    {
        let mut writer = csv::Writer::from_writer(&mut data);

        let mut header_row: Vec<String> = headers.iter().map(str::to_string).collect();
        header_row.extend(MERGE_COLUMNS.iter().map(|c| c.to_string()));
        writer.write_record(&header_row)?;

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            rows += 1;
            let hit = by_index.get(&(row + 1)).copied();
            if hit.is_some() {
                matched += 1;
            }

            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            cells.extend(merge_cells(hit));
            writer.write_record(&cells)?;
        }
        writer.flush()?;
    }

    Ok(MergeOutcome {
        rows,
        matched,
        data,
    })
}

fn merge_cells(record: Option<&MatchRecord>) -> Vec<String> {
    match record {
        Some(m) => vec![
            m.playlist_index.to_string(),
            m.playlist_title.clone(),
            m.playlist_uploader.clone(),
            m.url.clone(),
            m.video_id.clone(),
            m.hybrid_score.to_string(),
            m.word_similarity.to_string(),
            m.artist_similarity.to_string(),
            m.common_tokens.to_string(),
            m.method.to_string(),
        ],
        None => vec![String::new(); MERGE_COLUMNS.len()],
    }
}
