//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the feed screen.
//! It is organized into submodules by responsibility:
//!
//! - `feed`: Feed item records and feed file loading
//! - `pager`: Scroll position, centered page and the per-page render state machine
//! - `playback`: Playback state for the centered item
//! - `types`: UI state and per-frame view snapshots
//! - `app_model`: Main application model with state management methods

mod feed;
mod pager;
mod playback;
mod types;
mod app_model;

pub use feed::{FEED_FILE, FeedItem, load_feed};
pub use pager::{FeedPager, PageState, RenderTarget};
pub use playback::PlaybackInfo;
pub use types::{FeedViewState, PageView, UiState};

pub use app_model::AppModel;
