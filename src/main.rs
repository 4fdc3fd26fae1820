use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::Instant;

use playlist_match::matcher::{HybridMatcher, MatchEvent};
use playlist_match::models::MatchRunStats;
use playlist_match::progress::{create_progress_bar, format_duration, log_progress, set_log_only};
use playlist_match::records::{read_playlist, read_source_list, write_matches};
use playlist_match::safety::ensure_output_distinct;

#[derive(Parser)]
#[command(name = "playlist-match")]
#[command(about = "Match an authoritative song list against a harvested playlist export")]
struct Args {
    /// Authoritative source list (CSV, UTF-8 or Shift_JIS)
    source: PathBuf,

    /// Playlist export (CSV: index,title,uploader,url,video_id)
    playlist: PathBuf,

    /// Output CSV of match results
    output: PathBuf,

    /// Header name of the title column in the source list
    #[arg(long, default_value = "title")]
    title_column: String,

    /// Header name of the artist column in the source list
    #[arg(long, default_value = "artist")]
    artist_column: String,

    /// Hide progress bars and log periodic lines instead
    #[arg(long)]
    log_only: bool,

    /// Write run statistics to this JSON file
    #[arg(long)]
    stats: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);

    ensure_output_distinct(&args.output, &[&args.source, &args.playlist])?;

    let start = Instant::now();

    let sources = read_source_list(&args.source, &args.title_column, &args.artist_column)?;
    let playlist = read_playlist(&args.playlist)?;
    println!("Source list: {} tracks", sources.len());
    println!("Playlist:    {} entries", playlist.len());

    let matcher = HybridMatcher::new(&sources, &playlist);

    let mut stats = MatchRunStats {
        source_count: sources.len(),
        candidate_count: playlist.len(),
        ..Default::default()
    };

    let mut bar: Option<ProgressBar> = None;
    let matches = matcher.run_with_observer(&mut |event| match event {
        MatchEvent::StageStarted {
            stage,
            threshold,
            unmatched,
        } => {
            let msg = format!("Stage {} (score >= {:.1})", stage + 1, threshold);
            bar = Some(create_progress_bar(unmatched as u64, &msg));
        }
        MatchEvent::RecordProcessed {
            stage,
            processed,
            unmatched,
            matched,
        } => {
            if let Some(pb) = &bar {
                pb.inc(1);
            }
            log_progress(
                &format!("stage-{}", stage + 1),
                processed as u64,
                unmatched as u64,
                20,
            );
            if let Some(record) = matched {
                stats.record_method(record.method);
            }
        }
        MatchEvent::StageFinished {
            stage,
            matched_in_stage,
            ..
        } => {
            if let Some(pb) = bar.take() {
                pb.finish_with_message(format!(
                    "Stage {}: {} matched",
                    stage + 1,
                    matched_in_stage
                ));
            }
            stats.stage_matches.push(matched_in_stage);
        }
    });

    write_matches(&args.output, &matches)?;
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    println!("\n{:=<60}", "");
    println!("Matching complete!");
    println!(
        "  Matched: {}/{} ({:.1}%)",
        matches.len(),
        sources.len(),
        stats.match_rate()
    );
    println!("  Elapsed: {}", format_duration(start.elapsed()));
    println!("{:=<60}", "");

    println!("\nBy method:");
    for (label, count) in [
        ("hybrid_high_quality", stats.high_quality),
        ("hybrid_medium_quality", stats.medium_quality),
        ("hybrid_word_based", stats.word_based),
    ] {
        if count > 0 {
            println!(
                "  {}: {} ({:.1}%)",
                label,
                count,
                100.0 * count as f64 / matches.len() as f64
            );
        }
    }

    let near_perfect: Vec<_> = matches
        .iter()
        .filter(|m| m.hybrid_score >= 0.95)
        .take(5)
        .collect();
    if !near_perfect.is_empty() {
        println!("\nBest matches (score >= 0.95):");
        for m in near_perfect {
            println!(
                "  {} -> {} [{} | {}]",
                m.source_title, m.playlist_title, m.hybrid_score, m.method
            );
        }
    }

    if args.log_only {
        stats.log();
    }
    if let Some(stats_path) = &args.stats {
        stats.write_to_file(stats_path)?;
        println!("\nStats written to {}", stats_path.display());
    }

    println!("\nResults written to {}", args.output.display());
    Ok(())
}
