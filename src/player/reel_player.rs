//! Reel player: one engine per screen behind an index-based control surface
//!
//! Control operations are best-effort. Failures are logged and swallowed so a broken item
//! never takes the feed down with it.

use std::sync::Arc;

use crate::model::FeedItem;

use super::cache::MediaCache;
use super::config::{CacheFlags, EngineConfig};
use super::datasource::{CacheDataSource, MediaSource, Upstream};
use super::engine::ProgressiveEngine;
use super::error::PlayerResult;
use super::{EngineEventChannel, PlaybackEngine, RepeatMode};

pub struct ReelPlayer<E: PlaybackEngine = ProgressiveEngine> {
    engine: E,
    data_source: Arc<CacheDataSource>,
    /// Append-only concatenated playlist
    playlist: Vec<MediaSource>,
    attached: bool,
    /// feed index -> playlist index; `None` for items without media
    playlist_index_by_feed: Vec<Option<usize>>,
}

/// Log the outcome of a best-effort engine operation whose error is swallowed.
pub(crate) fn log_swallowed<T>(operation: &str, result: &PlayerResult<T>) {
    match result {
        Ok(_) => tracing::trace!(operation, "engine operation applied"),
        Err(e) => tracing::warn!(operation, error = %e, "engine operation failed, ignoring"),
    }
}

impl ReelPlayer<ProgressiveEngine> {
    /// Configure buffering + adaptive selection and construct the engine.
    pub fn initialize(
        config: EngineConfig,
        cache: Arc<MediaCache>,
        upstream: Arc<dyn Upstream>,
    ) -> PlayerResult<Self> {
        config.validate()?;
        let data_source = Arc::new(CacheDataSource::new(cache, upstream, CacheFlags::default()));
        Ok(Self::with_engine(ProgressiveEngine::new(config), data_source))
    }
}

impl<E: PlaybackEngine> ReelPlayer<E> {
    pub fn with_engine(engine: E, data_source: Arc<CacheDataSource>) -> Self {
        Self {
            engine,
            data_source,
            playlist: Vec::new(),
            attached: false,
            playlist_index_by_feed: Vec::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    pub fn media_url(&self, playlist_index: usize) -> Option<&str> {
        self.playlist.get(playlist_index).map(MediaSource::url)
    }

    /// Wrap `url` in the cache-aware source chain and append it. Not idempotent.
    pub fn append_source(&mut self, url: &str) -> usize {
        let source = MediaSource::new(url, Arc::clone(&self.data_source));
        if self.attached {
            log_swallowed("add_media_source", &self.engine.add_media_source(source.clone()));
        }
        self.playlist.push(source);
        self.playlist.len() - 1
    }

    /// Build the playlist from the feed and attach it to the engine. Runs at most once.
    pub fn build_playlist_from_feed(&mut self, items: &[FeedItem]) {
        if !self.playlist.is_empty() || self.engine.media_item_count() > 0 {
            tracing::debug!(playlist_len = self.playlist.len(), "Playlist already built, skipping");
            return;
        }

        let mut mapping = Vec::with_capacity(items.len());
        for (feed_index, item) in items.iter().enumerate() {
            match item.media_url() {
                Some(url) => mapping.push(Some(self.append_source(url))),
                None => {
                    tracing::debug!(feed_index, id = item.id, "Feed item has no media URL, skipping");
                    mapping.push(None);
                }
            }
        }
        self.playlist_index_by_feed = mapping;

        tracing::info!(
            feed_len = items.len(),
            playlist_len = self.playlist.len(),
            "Playlist built from feed"
        );
        self.attach();
    }

    fn attach(&mut self) {
        if self.engine.media_item_count() != 0 {
            return;
        }
        let result = self
            .engine
            .set_media_sources(self.playlist.clone())
            .and_then(|_| self.engine.prepare());
        self.attached = result.is_ok();
        log_swallowed("attach playlist", &result);
    }

    pub fn playlist_index_for(&self, feed_index: usize) -> Option<usize> {
        self.playlist_index_by_feed.get(feed_index).copied().flatten()
    }

    pub fn feed_index_for(&self, playlist_index: usize) -> Option<usize> {
        self.playlist_index_by_feed
            .iter()
            .position(|mapped| *mapped == Some(playlist_index))
    }

    /// Jump to the start of `index`, looping it. Failures are swallowed.
    pub fn seek_to(&mut self, index: usize, autoplay: bool) {
        self.engine.set_play_when_ready(autoplay);
        let result = self
            .engine
            .seek_to(index)
            .and_then(|_| self.engine.set_repeat_mode(RepeatMode::One));
        log_swallowed("seek_to", &result);
    }

    pub fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.engine.set_play_when_ready(play_when_ready);
    }

    pub fn play_when_ready(&self) -> bool {
        self.engine.play_when_ready()
    }

    pub fn release(&mut self) {
        self.engine.release();
    }

    pub fn is_released(&self) -> bool {
        self.engine.is_released()
    }

    /// Events tagged with an older generation belong to a load a later seek replaced.
    pub fn load_generation(&self) -> u64 {
        self.engine.load_generation()
    }

    pub fn take_event_channel(&mut self) -> Option<EngineEventChannel> {
        self.engine.take_event_channel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerError;
    use crate::player::testing::{MemoryUpstream, RecordingEngine, data_source};
    use tempfile::TempDir;

    fn item(id: i64, url: Option<&str>) -> FeedItem {
        FeedItem {
            id,
            media_url: url.map(str::to_string),
            ..Default::default()
        }
    }

    fn player(tmp: &TempDir) -> ReelPlayer<RecordingEngine> {
        ReelPlayer::with_engine(RecordingEngine::new(), data_source(tmp, MemoryUpstream::new()))
    }

    #[test]
    fn initialize_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(MediaCache::open(tmp.path(), 1024).unwrap());
        let mut config = EngineConfig::default();
        config.track_selection.bandwidth_fraction = 2.0;

        let result = ReelPlayer::initialize(config, cache, Arc::new(MemoryUpstream::new()));
        assert!(matches!(result, Err(PlayerError::InvalidConfig(_))));
    }

    #[test]
    fn append_source_returns_new_index_and_is_not_idempotent() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        assert_eq!(player.append_source("u1"), 0);
        assert_eq!(player.append_source("u1"), 1);
        assert_eq!(player.playlist_len(), 2);
    }

    #[test]
    fn skips_items_without_media_and_maps_indices() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        let feed = vec![item(1, Some("u1")), item(2, None), item(3, Some("u3"))];

        player.build_playlist_from_feed(&feed);

        assert_eq!(player.engine().sources, vec!["u1", "u3"]);
        assert_eq!(player.playlist_index_for(0), Some(0));
        assert_eq!(player.playlist_index_for(1), None);
        assert_eq!(player.playlist_index_for(2), Some(1));
        assert_eq!(player.feed_index_for(1), Some(2));
        assert_eq!(player.media_url(1), Some("u3"));
    }

    #[test]
    fn building_twice_keeps_playlist_length() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        let feed = vec![item(1, Some("u1")), item(2, Some("u2"))];

        player.build_playlist_from_feed(&feed);
        player.build_playlist_from_feed(&feed);

        assert_eq!(player.playlist_len(), 2);
        assert_eq!(player.engine().media_item_count(), 2);
        assert_eq!(player.engine().set_media_calls, 1);
        assert_eq!(player.engine().prepare_calls, 1);
    }

    #[test]
    fn append_after_attach_reaches_engine() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        player.build_playlist_from_feed(&[item(1, Some("u1"))]);

        assert_eq!(player.append_source("u2"), 1);
        assert_eq!(player.engine().sources, vec!["u1", "u2"]);
    }

    #[test]
    fn seek_sets_autoplay_and_loops_item() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        player.build_playlist_from_feed(&[item(1, Some("u1")), item(2, Some("u2"))]);

        player.seek_to(1, true);

        assert_eq!(player.engine().seeks, vec![1]);
        assert!(player.play_when_ready());
        assert_eq!(player.engine().repeat_mode, RepeatMode::One);
    }

    #[test]
    fn seek_failures_are_swallowed() {
        let tmp = TempDir::new().unwrap();
        let mut player = player(&tmp);
        player.build_playlist_from_feed(&[item(1, Some("u1"))]);

        // Out of range and engine-level failure both return normally
        player.seek_to(5, true);
        player.engine.fail_seeks = true;
        player.seek_to(0, true);

        assert!(player.engine().seeks.is_empty());
        assert_eq!(player.engine().repeat_mode, RepeatMode::Off);
    }
}
