//! Main application model with state management

use std::time::{Duration, Instant};

use super::feed::FeedItem;
use super::pager::FeedPager;
use super::playback::PlaybackInfo;
use super::types::{FeedViewState, PageView, STATUS_TTL_SECS, UiState};

/// Main application model containing all screen state
pub struct AppModel {
    feed: Vec<FeedItem>,
    pager: FeedPager,
    playback: PlaybackInfo,
    ui_state: UiState,
    should_quit: bool,
}

impl AppModel {
    pub fn new(feed: Vec<FeedItem>) -> Self {
        let pager = FeedPager::new(feed.len());
        Self {
            feed,
            pager,
            playback: PlaybackInfo::default(),
            ui_state: UiState::default(),
            should_quit: false,
        }
    }

    pub fn feed(&self) -> &[FeedItem] {
        &self.feed
    }

    // ========================================================================
    // Pager
    // ========================================================================

    pub fn pager(&self) -> &FeedPager {
        &self.pager
    }

    pub fn pager_tick(&mut self) -> Option<usize> {
        self.pager.tick()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.pager.scroll_by(delta);
    }

    pub fn on_ready(&mut self, feed_index: usize) -> bool {
        self.pager.on_ready(feed_index)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn playback(&self) -> &PlaybackInfo {
        &self.playback
    }

    pub fn set_playback(&mut self, playback: PlaybackInfo) {
        self.playback = playback;
    }

    pub fn update_buffered(&mut self, playlist_index: usize, bytes: u64) {
        self.playback.update_buffered(playlist_index, bytes);
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.playback.is_playing = is_playing;
    }

    /// Toggle like on the centered item; returns the new liked state.
    pub fn toggle_like_centered(&mut self) -> Option<bool> {
        let page = self.pager.centered_page()?;
        let item = self.feed.get_mut(page)?;
        item.toggle_like();
        Some(item.is_already_liked)
    }

    // ========================================================================
    // UI
    // ========================================================================

    pub fn toggle_help(&mut self) {
        self.ui_state.show_help = !self.ui_state.show_help;
    }

    pub fn is_help_open(&self) -> bool {
        self.ui_state.show_help
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui_state.status_message = Some(message.into());
        self.ui_state.status_time = Some(Instant::now());
    }

    pub fn auto_clear_status(&mut self) {
        let expired = self
            .ui_state
            .status_time
            .is_some_and(|t| t.elapsed() >= Duration::from_secs(STATUS_TTL_SECS));
        if expired {
            self.ui_state.status_message = None;
            self.ui_state.status_time = None;
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_should_quit(&mut self, quit: bool) {
        self.should_quit = quit;
    }

    pub fn view_state(&self) -> FeedViewState {
        let pages = self
            .pager
            .visible_pages()
            .into_iter()
            .filter_map(|(index, share)| {
                let item = self.feed.get(index)?.clone();
                Some(PageView {
                    index,
                    share,
                    item,
                    state: self.pager.page_state(index),
                    target: self.pager.render_target(index),
                })
            })
            .collect();

        FeedViewState {
            pages,
            page_count: self.feed.len(),
            current_page: self.pager.current_page(),
            playback: self.playback.clone(),
            ui: self.ui_state.clone(),
        }
    }
}
