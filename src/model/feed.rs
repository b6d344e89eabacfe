//! Feed items and feed loading

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const FEED_FILE: &str = "reels.json";

/// One reel in the feed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedItem {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "url")]
    pub media_url: Option<String>,
    pub thumbnail: Option<String>,
    pub first_frame: Option<String>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_profile_url: Option<String>,
    pub like_count: u64,
    pub comment_count: u64,
    pub download_count: u64,
    pub is_already_liked: bool,
    pub is_followed: bool,
    pub category_id: Option<i64>,
    pub view_type_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub share_link: Option<String>,
    pub file_type: Option<String>,
}

impl FeedItem {
    /// Media URL, treating blank strings as absent.
    pub fn media_url(&self) -> Option<&str> {
        self.media_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn uploader(&self) -> &str {
        self.user_name.as_deref().unwrap_or("unknown")
    }

    pub fn toggle_like(&mut self) {
        if self.is_already_liked {
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.like_count += 1;
        }
        self.is_already_liked = !self.is_already_liked;
    }
}

pub fn parse_feed(json: &str) -> Result<Vec<FeedItem>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_feed(path: &Path) -> Result<Vec<FeedItem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed file {}", path.display()))?;
    let items = parse_feed(&content)
        .with_context(|| format!("Failed to parse feed file {}", path.display()))?;

    let without_media = items.iter().filter(|item| item.media_url().is_none()).count();
    tracing::info!(
        path = %path.display(),
        items = items.len(),
        without_media,
        "Feed loaded"
    );
    Ok(items)
}
