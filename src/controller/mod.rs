//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and drives the reel player.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key and focus event handling
//! - `playback`: Playlist setup, page activation and lifecycle forwarding
//! - `player_events`: Engine event listener

mod input;
mod playback;
mod player_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::model::AppModel;
use crate::player::{LifecycleBinding, PlaybackEngine, ProgressiveEngine, ReelPlayer};

pub struct AppController<E: PlaybackEngine + 'static = ProgressiveEngine> {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) player: Arc<Mutex<ReelPlayer<E>>>,
    lifecycle: Arc<Mutex<LifecycleBinding>>,
    event_listener_started: Arc<Mutex<bool>>,
}

// Manual impl: derive would demand `E: Clone`, but only the handles are cloned
impl<E: PlaybackEngine + 'static> Clone for AppController<E> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            player: Arc::clone(&self.player),
            lifecycle: Arc::clone(&self.lifecycle),
            event_listener_started: Arc::clone(&self.event_listener_started),
        }
    }
}

impl<E: PlaybackEngine + 'static> AppController<E> {
    pub fn new(model: Arc<Mutex<AppModel>>, player: Arc<Mutex<ReelPlayer<E>>>) -> Self {
        Self {
            model,
            player,
            lifecycle: Arc::new(Mutex::new(LifecycleBinding::new())),
            event_listener_started: Arc::new(Mutex::new(false)),
        }
    }

    /// Register the engine listener once; later calls are no-ops.
    pub(crate) async fn try_start_event_listener(&self) {
        let mut started = self.event_listener_started.lock().await;
        if *started {
            return;
        }

        let channel = self.player.lock().await.take_event_channel();
        match channel {
            Some(event_channel) => {
                *started = true;
                drop(started);
                self.start_player_event_listener(event_channel);
            }
            None => tracing::warn!("Engine event channel already taken, readiness will not be tracked"),
        }
    }
}
