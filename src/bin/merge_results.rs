//! Merge match results back into the original source table.
//!
//! Keeps every source column untouched and appends the match columns,
//! keyed by 1-based row position.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use playlist_match::models::MatchMethod;
use playlist_match::records::{decode_text, merge_matches, read_matches};
use playlist_match::safety::ensure_output_distinct;

#[derive(Parser)]
#[command(name = "merge-results")]
#[command(about = "Append match columns to the original source list")]
struct Args {
    /// Original source list (any columns, UTF-8 or Shift_JIS)
    source: PathBuf,

    /// Matches CSV produced by playlist-match
    matches: PathBuf,

    /// Merged output CSV (UTF-8 with BOM)
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure_output_distinct(&args.output, &[&args.source, &args.matches])?;

    let bytes = std::fs::read(&args.source)
        .with_context(|| format!("failed to read source list {}", args.source.display()))?;
    let source_text = decode_text(&bytes);
    let matches = read_matches(&args.matches)?;

    let outcome = merge_matches(&source_text, &matches)?;
    std::fs::write(&args.output, &outcome.data)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let rate = if outcome.rows == 0 {
        0.0
    } else {
        100.0 * outcome.matched as f64 / outcome.rows as f64
    };
    println!("Source rows:  {}", outcome.rows);
    println!(
        "Merged:       {} matched ({:.1}%), {} unmatched",
        outcome.matched,
        rate,
        outcome.rows - outcome.matched
    );

    for method in [
        MatchMethod::HybridHighQuality,
        MatchMethod::HybridMediumQuality,
        MatchMethod::HybridWordBased,
    ] {
        let count = matches.iter().filter(|m| m.method == method).count();
        if count > 0 {
            println!("  {}: {}", method, count);
        }
    }

    println!("Merged table written to {}", args.output.display());
    Ok(())
}
