//! Test doubles for the playback layer

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream;
use futures::{FutureExt, StreamExt};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::cache::MediaCache;
use super::config::CacheFlags;
use super::datasource::{ByteStream, CacheDataSource, MediaSource, Upstream};
use super::error::{PlayerError, PlayerResult};
use super::{EngineEvent, EngineEventChannel, PlaybackEngine, RepeatMode};

/// How a canned body ends after its chunks.
#[derive(Clone, Copy)]
enum Tail {
    End,
    Fail,
    /// Never ends, like a slow connection
    Stall,
}

/// Upstream serving canned chunk lists from memory.
#[derive(Default)]
pub struct MemoryUpstream {
    bodies: HashMap<String, (Vec<Bytes>, Tail)>,
    opens: AtomicUsize,
}

impl MemoryUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, chunks: &[&[u8]]) -> Self {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.bodies.insert(url.to_string(), (chunks, Tail::End));
        self
    }

    /// Serve `chunks`, then fail the stream.
    pub fn with_failure_after(mut self, url: &str, chunks: &[&[u8]]) -> Self {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.bodies.insert(url.to_string(), (chunks, Tail::Fail));
        self
    }

    /// Serve `chunks`, then hang forever.
    pub fn with_stall_after(mut self, url: &str, chunks: &[&[u8]]) -> Self {
        let chunks = chunks.iter().map(|c| Bytes::copy_from_slice(c)).collect();
        self.bodies.insert(url.to_string(), (chunks, Tail::Stall));
        self
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl Upstream for MemoryUpstream {
    fn open<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PlayerResult<ByteStream>> {
        async move {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let (chunks, tail) = self
                .bodies
                .get(url)
                .cloned()
                .ok_or_else(|| PlayerError::Upstream(format!("no such url: {}", url)))?;

            let mut items: Vec<PlayerResult<Bytes>> = chunks.into_iter().map(Ok).collect();
            match tail {
                Tail::End => Ok(stream::iter(items).boxed()),
                Tail::Fail => {
                    items.push(Err(PlayerError::Upstream("connection reset".to_string())));
                    Ok(stream::iter(items).boxed())
                }
                Tail::Stall => Ok(stream::iter(items).chain(stream::pending()).boxed()),
            }
        }
        .boxed()
    }
}

pub fn data_source(tmp: &TempDir, upstream: MemoryUpstream) -> Arc<CacheDataSource> {
    let cache = Arc::new(MediaCache::open(tmp.path(), 1024 * 1024).expect("open cache"));
    Arc::new(CacheDataSource::new(cache, Arc::new(upstream), CacheFlags::default()))
}

/// Engine double that records every call and never does I/O.
pub struct RecordingEngine {
    pub sources: Vec<String>,
    pub set_media_calls: usize,
    pub prepare_calls: usize,
    pub play_when_ready: bool,
    pub repeat_mode: RepeatMode,
    pub seeks: Vec<usize>,
    /// Bumped on every successful seek, like a real engine starting a load
    pub load_generation: u64,
    pub release_calls: usize,
    pub released: bool,
    pub fail_seeks: bool,
    pub event_tx: mpsc::UnboundedSender<EngineEvent>,
    event_rx: Option<EngineEventChannel>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            sources: Vec::new(),
            set_media_calls: 0,
            prepare_calls: 0,
            play_when_ready: false,
            repeat_mode: RepeatMode::Off,
            seeks: Vec::new(),
            load_generation: 0,
            release_calls: 0,
            released: false,
            fail_seeks: false,
            event_tx,
            event_rx: Some(event_rx),
        }
    }
}

impl PlaybackEngine for RecordingEngine {
    fn media_item_count(&self) -> usize {
        self.sources.len()
    }

    fn set_media_sources(&mut self, sources: Vec<MediaSource>) -> PlayerResult<()> {
        self.set_media_calls += 1;
        self.sources = sources.iter().map(|s| s.url().to_string()).collect();
        Ok(())
    }

    fn add_media_source(&mut self, source: MediaSource) -> PlayerResult<()> {
        self.sources.push(source.url().to_string());
        Ok(())
    }

    fn prepare(&mut self) -> PlayerResult<()> {
        self.prepare_calls += 1;
        Ok(())
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.play_when_ready = play_when_ready;
    }

    fn play_when_ready(&self) -> bool {
        self.play_when_ready
    }

    fn seek_to(&mut self, index: usize) -> PlayerResult<()> {
        if self.released {
            return Err(PlayerError::Released);
        }
        if self.fail_seeks {
            return Err(PlayerError::Upstream("seek failed".to_string()));
        }
        if index >= self.sources.len() {
            return Err(PlayerError::IndexOutOfRange {
                index,
                len: self.sources.len(),
            });
        }
        self.seeks.push(index);
        self.load_generation += 1;
        Ok(())
    }

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> PlayerResult<()> {
        self.repeat_mode = mode;
        Ok(())
    }

    fn release(&mut self) {
        self.release_calls += 1;
        self.released = true;
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
