//! Fetch playlist metadata from the YouTube Data API and write the
//! playlist CSV consumed by the matcher.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use playlist_match::models::PlaylistEntry;
use playlist_match::progress::create_spinner;
use playlist_match::records::write_playlist;

const API_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";
const PAGE_SIZE: &str = "50";

#[derive(Parser)]
#[command(name = "fetch-playlist")]
#[command(about = "Fetch playlist metadata and export it as CSV")]
struct Args {
    /// Playlist URL or bare playlist id
    playlist: String,

    /// Output CSV (index,title,uploader,url,video_id)
    output: PathBuf,

    /// API key; falls back to $YOUTUBE_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    /// Also write the raw API pages to this JSON file
    #[arg(long)]
    dump_json: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemsPage {
    items: Vec<Item>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Item {
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    video_owner_channel_title: Option<String>,
    resource_id: ResourceId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    #[serde(default)]
    video_id: Option<String>,
}

/// Extract the playlist id from a URL's `list=` parameter, or pass a
/// bare id through unchanged.
fn playlist_id(input: &str) -> &str {
    match input.find("list=") {
        Some(pos) => {
            let rest = &input[pos + 5..];
            rest.split('&').next().unwrap_or(rest)
        }
        None => input,
    }
}

fn fetch_all(playlist_id: &str, api_key: &str) -> Result<(Vec<PlaylistEntry>, Vec<Value>)> {
    let mut entries: Vec<PlaylistEntry> = Vec::new();
    let mut pages: Vec<Value> = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut request = ureq::get(API_URL)
            .query("part", "snippet")
            .query("maxResults", PAGE_SIZE)
            .query("playlistId", playlist_id)
            .query("key", api_key);
        if let Some(token) = &page_token {
            request = request.query("pageToken", token);
        }

        let value: Value = request
            .call()
            .context("playlist items request failed")?
            .into_json()
            .context("invalid playlist items response")?;
        let page: ItemsPage =
            serde_json::from_value(value.clone()).context("unexpected playlist items shape")?;
        pages.push(value);

        for item in page.items {
            let snippet = item.snippet;
            // Deleted and private videos have no id or owning channel
            let (Some(video_id), Some(uploader)) =
                (snippet.resource_id.video_id, snippet.video_owner_channel_title)
            else {
                continue;
            };
            entries.push(PlaylistEntry {
                index: entries.len() + 1,
                title: snippet.title,
                uploader,
                url: format!("https://www.youtube.com/watch?v={}", video_id),
                video_id,
            });
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok((entries, pages))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let api_key = args
        .api_key
        .or_else(|| std::env::var("YOUTUBE_API_KEY").ok())
        .context("no API key: pass --api-key or set YOUTUBE_API_KEY")?;

    let id = playlist_id(&args.playlist);
    println!("Playlist id: {}", id);

    let spinner = create_spinner("Fetching playlist metadata");
    let (entries, pages) = fetch_all(id, &api_key)?;
    spinner.finish_with_message(format!(
        "Fetched {} entries over {} pages",
        entries.len(),
        pages.len()
    ));

    write_playlist(&args.output, &entries)?;
    println!("Playlist written to {}", args.output.display());

    if let Some(json_path) = &args.dump_json {
        std::fs::write(json_path, serde_json::to_string_pretty(&pages)?)
            .with_context(|| format!("failed to write {}", json_path.display()))?;
        println!("Raw pages written to {}", json_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_id_from_url() {
        assert_eq!(
            playlist_id("https://www.youtube.com/playlist?list=PLabc123"),
            "PLabc123"
        );
        assert_eq!(
            playlist_id("https://www.youtube.com/watch?v=xyz&list=PLabc123&index=2"),
            "PLabc123"
        );
    }

    #[test]
    fn test_playlist_id_passthrough() {
        assert_eq!(playlist_id("PLabc123"), "PLabc123");
    }

    #[test]
    fn test_snippet_shape() {
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "Lemon",
                    "videoOwnerChannelTitle": "Kenshi Yonezu",
                    "resourceId": {"videoId": "SX_ViT4Ra7k"}
                }
            }],
            "nextPageToken": "CAUQAA"
        }"#;
        let page: ItemsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
        let snippet = &page.items[0].snippet;
        assert_eq!(snippet.resource_id.video_id.as_deref(), Some("SX_ViT4Ra7k"));
    }

    #[test]
    fn test_snippet_deleted_video() {
        // Deleted entries omit the owning channel
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "Deleted video",
                    "resourceId": {}
                }
            }]
        }"#;
        let page: ItemsPage = serde_json::from_str(json).unwrap();
        let snippet = &page.items[0].snippet;
        assert!(snippet.video_owner_channel_title.is_none());
        assert!(snippet.resource_id.video_id.is_none());
    }
}
