//! Player module - playback engine seam, cache-backed media sources and the reel player
//!
//! - `engine`: progressive-download engine implementing [`PlaybackEngine`]
//! - `cache`: process-wide LRU disk cache for media bytes
//! - `datasource`: cache-aware data source chain (cache -> upstream)
//! - `config`: load control / adaptive selection configuration
//! - `reel_player`: index-based control surface over one engine per screen
//! - `readiness`: edge detector turning engine state changes into per-item ready signals
//! - `lifecycle`: host screen lifecycle binding (pause/resume/release)

mod cache;
mod config;
mod datasource;
mod engine;
mod error;
mod lifecycle;
mod readiness;
mod reel_player;

#[cfg(test)]
pub(crate) mod testing;

use tokio::sync::mpsc;

pub use cache::MediaCache;
pub use config::{CacheFlags, EngineConfig};
pub use datasource::{HttpUpstream, MediaSource, Upstream};
pub use engine::ProgressiveEngine;
pub use error::{PlayerError, PlayerResult};
pub use lifecycle::{LifecycleBinding, LifecycleEvent};
pub use readiness::ReadinessTracker;
pub use reel_player::ReelPlayer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Buffering,
    Ready,
    Ended,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepeatMode {
    Off,
    /// Loop the current item indefinitely
    One,
}

/// Notifications emitted by an engine, keyed by playlist index.
///
/// `load` is the engine's load generation when the event was produced. Events whose `load`
/// is older than [`PlaybackEngine::load_generation`] describe a superseded load.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    PlaybackStateChanged { load: u64, index: usize, state: PlaybackState },
    LoadProgress { load: u64, index: usize, bytes: u64 },
    Error { index: usize, message: String },
}

pub type EngineEventChannel = mpsc::UnboundedReceiver<EngineEvent>;

/// The media engine the reel player drives.
pub trait PlaybackEngine: Send {
    fn media_item_count(&self) -> usize;

    /// Replace the playlist.
    fn set_media_sources(&mut self, sources: Vec<MediaSource>) -> PlayerResult<()>;

    /// Append to an attached playlist.
    fn add_media_source(&mut self, source: MediaSource) -> PlayerResult<()>;

    fn prepare(&mut self) -> PlayerResult<()>;

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play_when_ready(&self) -> bool;

    /// Seek to the start of the playlist item at `index`.
    fn seek_to(&mut self, index: usize) -> PlayerResult<()>;

    fn set_repeat_mode(&mut self, mode: RepeatMode) -> PlayerResult<()>;

    /// Release all resources. Idempotent.
    fn release(&mut self);

    fn is_released(&self) -> bool;

    /// Generation of the most recent load request; 0 before the first one.
    fn load_generation(&self) -> u64;

    /// Hand out the event receiver; only the first caller gets it.
    fn take_event_channel(&mut self) -> Option<EngineEventChannel>;
}
