//! Core type definitions shared by the model and the view

use std::time::Instant;

use super::feed::FeedItem;
use super::pager::{PageState, RenderTarget};

/// How long a status line message stays on screen
pub const STATUS_TTL_SECS: u64 = 3;

#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub show_help: bool,
    pub status_message: Option<String>,
    pub status_time: Option<Instant>,
}

/// One page in the viewport, with everything needed to draw it.
#[derive(Clone, Debug)]
pub struct PageView {
    pub index: usize,
    /// Share of the viewport height, 0.0..=1.0
    pub share: f32,
    pub item: FeedItem,
    pub state: PageState,
    pub target: RenderTarget,
}

/// Snapshot of the model taken once per frame.
#[derive(Clone, Debug)]
pub struct FeedViewState {
    pub pages: Vec<PageView>,
    pub page_count: usize,
    pub current_page: usize,
    pub playback: super::playback::PlaybackInfo,
    pub ui: UiState,
}
