//! Progressive-download playback engine
//!
//! Owns:
//! - the concatenated playlist
//! - one load task for the current item (aborted on every seek)
//! - the event channel back to the UI
//!
//! The load task reads the item through its cache-aware data source. The item is reported
//! Ready as soon as the first chunk arrives; the rest of the stream keeps filling the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::EngineConfig;
use super::datasource::MediaSource;
use super::error::{PlayerError, PlayerResult};
use super::{EngineEvent, EngineEventChannel, PlaybackEngine, PlaybackState, RepeatMode};

pub struct ProgressiveEngine {
    config: EngineConfig,
    playlist: Vec<MediaSource>,
    prepared: bool,
    current_index: Option<usize>,
    play_when_ready: bool,
    looping: Arc<AtomicBool>,
    released: bool,
    /// Bumped by every load; events carry the value of the load that produced them
    load_generation: u64,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    event_rx: Option<EngineEventChannel>,
    load_task: Option<JoinHandle<()>>,
}

impl ProgressiveEngine {
    pub fn new(config: EngineConfig) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tracing::info!(
            min_buffer_ms = config.load_control.min_buffer.as_millis() as u64,
            max_buffer_ms = config.load_control.max_buffer.as_millis() as u64,
            buffer_for_playback_ms = config.load_control.buffer_for_playback.as_millis() as u64,
            bandwidth_fraction = config.track_selection.bandwidth_fraction,
            "Progressive engine created"
        );

        Self {
            config,
            playlist: Vec::new(),
            prepared: false,
            current_index: None,
            play_when_ready: false,
            looping: Arc::new(AtomicBool::new(false)),
            released: false,
            load_generation: 0,
            event_tx,
            event_rx: Some(event_rx),
            load_task: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    fn ensure_live(&self) -> PlayerResult<()> {
        if self.released {
            Err(PlayerError::Released)
        } else {
            Ok(())
        }
    }

    fn cancel_load(&mut self) {
        if let Some(task) = self.load_task.take() {
            task.abort();
        }
    }

    fn start_load(&mut self, index: usize) -> PlayerResult<()> {
        let runtime = Handle::try_current()
            .map_err(|e| PlayerError::Upstream(format!("no async runtime for loading: {}", e)))?;

        self.cancel_load();
        self.load_generation += 1;
        let load = self.load_generation;
        let source = self.playlist[index].clone();
        let _ = self.event_tx.send(EngineEvent::PlaybackStateChanged {
            load,
            index,
            state: PlaybackState::Buffering,
        });

        tracing::debug!(index, load, url = %source.url(), "Loading playlist item");
        self.load_task = Some(runtime.spawn(load_item(
            load,
            index,
            source,
            self.event_tx.clone(),
            Arc::clone(&self.looping),
        )));
        Ok(())
    }
}

async fn load_item(
    load: u64,
    index: usize,
    source: MediaSource,
    tx: mpsc::UnboundedSender<EngineEvent>,
    looping: Arc<AtomicBool>,
) {
    let fail = |message: String| {
        tracing::warn!(index, url = %source.url(), error = %message, "Playlist item failed to load");
        let _ = tx.send(EngineEvent::Error { index, message });
        let _ = tx.send(EngineEvent::PlaybackStateChanged {
            load,
            index,
            state: PlaybackState::Idle,
        });
    };

    let mut stream = match source.open().await {
        Ok(stream) => stream,
        Err(e) => {
            fail(e.to_string());
            return;
        }
    };

    let mut buffered: u64 = 0;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                if buffered == 0 && !bytes.is_empty() {
                    let _ = tx.send(EngineEvent::PlaybackStateChanged {
                        load,
                        index,
                        state: PlaybackState::Ready,
                    });
                }
                buffered += bytes.len() as u64;
                let _ = tx.send(EngineEvent::LoadProgress {
                    load,
                    index,
                    bytes: buffered,
                });
            }
            Err(e) => {
                fail(e.to_string());
                return;
            }
        }
    }

    if buffered == 0 {
        fail("no media data".to_string());
        return;
    }

    tracing::debug!(index, bytes = buffered, "Playlist item fully loaded");
    if !looping.load(Ordering::Relaxed) {
        let _ = tx.send(EngineEvent::PlaybackStateChanged {
            load,
            index,
            state: PlaybackState::Ended,
        });
    }
}

impl PlaybackEngine for ProgressiveEngine {
    fn media_item_count(&self) -> usize {
        self.playlist.len()
    }

    fn set_media_sources(&mut self, sources: Vec<MediaSource>) -> PlayerResult<()> {
        self.ensure_live()?;
        self.cancel_load();
        self.playlist = sources;
        self.current_index = None;
        self.prepared = false;
        Ok(())
    }

    fn add_media_source(&mut self, source: MediaSource) -> PlayerResult<()> {
        self.ensure_live()?;
        self.playlist.push(source);
        Ok(())
    }

    fn prepare(&mut self) -> PlayerResult<()> {
        self.ensure_live()?;
        self.prepared = true;
        if self.playlist.is_empty() {
            return Ok(());
        }
        let index = *self.current_index.get_or_insert(0);
        self.start_load(index)
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        if self.released {
            tracing::trace!("set_play_when_ready on released engine ignored");
            return;
        }
        self.play_when_ready = play_when_ready;
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn seek_to(&mut self, index: usize) -> PlayerResult<()> {
        self.ensure_live()?;
        if index >= self.playlist.len() {
            return Err(PlayerError::IndexOutOfRange {
                index,
                len: self.playlist.len(),
            });
        }
        self.current_index = Some(index);
        if self.prepared {
            self.start_load(index)?;
        }
        Ok(())
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> PlayerResult<()> {
        self.ensure_live()?;
        self.looping.store(mode == RepeatMode::One, Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.cancel_load();
        self.released = true;
        self.play_when_ready = false;
        self.playlist.clear();
        self.current_index = None;
        tracing::info!("Progressive engine released");
    }

    fn is_released(&self) -> bool {
        self.released
    }

    fn load_generation(&self) -> u64 {
        self.load_generation
    }

    fn take_event_channel(&mut self) -> Option<EngineEventChannel> {
        self.event_rx.take()
    }
}

impl Drop for ProgressiveEngine {
    fn drop(&mut self) {
        self.cancel_load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::testing::{MemoryUpstream, data_source};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn engine_with(tmp: &TempDir, upstream: MemoryUpstream, urls: &[&str]) -> ProgressiveEngine {
        let ds = data_source(tmp, upstream);
        let mut engine = ProgressiveEngine::new(EngineConfig::default());
        let sources = urls.iter().map(|u| MediaSource::new(*u, ds.clone())).collect();
        engine.set_media_sources(sources).unwrap();
        engine
    }

    /// Collect events until `stop` matches one, or fail after a second.
    async fn events_until(
        rx: &mut EngineEventChannel,
        stop: impl Fn(&EngineEvent) -> bool,
    ) -> Vec<EngineEvent> {
        let mut seen = Vec::new();
        tokio::time::timeout(Duration::from_secs(1), async {
            while let Some(event) = rx.recv().await {
                let done = stop(&event);
                seen.push(event);
                if done {
                    break;
                }
            }
        })
        .await
        .expect("timed out waiting for engine events");
        seen
    }

    fn state(load: u64, index: usize, state: PlaybackState) -> EngineEvent {
        EngineEvent::PlaybackStateChanged { load, index, state }
    }

    fn part_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "part")
            })
            .count()
    }

    /// Wait for aborted load tasks to be torn down.
    async fn wait_for_part_files(dir: &Path, expected: usize) {
        for _ in 0..200 {
            if part_files(dir) == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(part_files(dir), expected);
    }

    #[tokio::test]
    async fn seek_loads_item_and_reports_ready_then_ended() {
        let tmp = TempDir::new().unwrap();
        let upstream = MemoryUpstream::new()
            .with("u0", &[b"zero"])
            .with("u1", &[b"one", b"more"]);
        let mut engine = engine_with(&tmp, upstream, &["u0", "u1"]);
        let mut rx = engine.take_event_channel().unwrap();

        engine.prepare().unwrap();
        events_until(&mut rx, |e| *e == state(1, 0, PlaybackState::Ended)).await;

        engine.seek_to(1).unwrap();
        let events = events_until(&mut rx, |e| *e == state(2, 1, PlaybackState::Ended)).await;
        assert_eq!(
            events,
            vec![
                state(2, 1, PlaybackState::Buffering),
                state(2, 1, PlaybackState::Ready),
                EngineEvent::LoadProgress { load: 2, index: 1, bytes: 3 },
                EngineEvent::LoadProgress { load: 2, index: 1, bytes: 7 },
                state(2, 1, PlaybackState::Ended),
            ]
        );
        assert_eq!(engine.current_index(), Some(1));
        assert_eq!(engine.load_generation(), 2);
    }

    #[tokio::test]
    async fn repeat_one_suppresses_ended() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with(&tmp, MemoryUpstream::new().with("u0", &[b"x"]), &["u0"]);
        let mut rx = engine.take_event_channel().unwrap();

        engine.set_repeat_mode(RepeatMode::One).unwrap();
        engine.prepare().unwrap();
        let events = events_until(&mut rx, |e| matches!(e, EngineEvent::LoadProgress { .. })).await;
        assert!(events.contains(&state(1, 0, PlaybackState::Ready)));

        // Give the task time to finish; nothing else should arrive
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn load_failure_reports_error_and_idle() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with(&tmp, MemoryUpstream::new(), &["missing"]);
        let mut rx = engine.take_event_channel().unwrap();

        engine.prepare().unwrap();
        let events = events_until(&mut rx, |e| *e == state(1, 0, PlaybackState::Idle)).await;
        assert!(events.iter().any(|e| matches!(e, EngineEvent::Error { index: 0, .. })));
        assert!(!events.contains(&state(1, 0, PlaybackState::Ready)));
    }

    #[tokio::test]
    async fn seeking_away_mid_download_leaves_no_partial_files() {
        let tmp = TempDir::new().unwrap();
        let upstream = MemoryUpstream::new()
            .with_stall_after("slow", &[b"head"])
            .with("fast", &[b"whole"]);
        let mut engine = engine_with(&tmp, upstream, &["slow", "fast"]);
        let mut rx = engine.take_event_channel().unwrap();
        let dir = tmp.path().join(crate::player::cache::CACHE_SUBDIR);

        engine.prepare().unwrap();
        for _ in 0..5 {
            engine.seek_to(0).unwrap();
            let current = engine.load_generation();
            events_until(&mut rx, |e| {
                matches!(e, EngineEvent::LoadProgress { load, index: 0, .. } if *load == current)
            })
            .await;
        }
        // Only the live download may hold a partial file
        wait_for_part_files(&dir, 1).await;

        engine.seek_to(1).unwrap();
        events_until(&mut rx, |e| {
            matches!(
                e,
                EngineEvent::PlaybackStateChanged { index: 1, state: PlaybackState::Ended, .. }
            )
        })
        .await;
        wait_for_part_files(&dir, 0).await;

        engine.release();
        wait_for_part_files(&dir, 0).await;
    }

    #[tokio::test]
    async fn seek_out_of_range_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with(&tmp, MemoryUpstream::new(), &["a", "b"]);
        assert!(matches!(
            engine.seek_to(2),
            Err(PlayerError::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[tokio::test]
    async fn release_is_idempotent_and_blocks_further_use() {
        let tmp = TempDir::new().unwrap();
        let mut engine = engine_with(&tmp, MemoryUpstream::new(), &["a"]);
        engine.set_play_when_ready(true);

        engine.release();
        engine.release();

        assert!(engine.is_released());
        assert!(!engine.play_when_ready());
        assert_eq!(engine.media_item_count(), 0);
        assert!(matches!(engine.seek_to(0), Err(PlayerError::Released)));
        assert!(matches!(engine.prepare(), Err(PlayerError::Released)));
    }

    #[test]
    fn event_channel_is_handed_out_once() {
        let mut engine = ProgressiveEngine::new(EngineConfig::default());
        assert_eq!(engine.config(), &EngineConfig::default());
        assert!(engine.take_event_channel().is_some());
        assert!(engine.take_event_channel().is_none());
    }
}
