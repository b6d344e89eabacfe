//! Engine event listener

use crate::player::{EngineEvent, EngineEventChannel, PlaybackEngine, ReadinessTracker};

use super::AppController;

impl<E: PlaybackEngine + 'static> AppController<E> {
    pub fn start_player_event_listener(&self, mut event_channel: EngineEventChannel) {
        let model = self.model.clone();
        let player = self.player.clone();
        tracing::info!("Starting engine event listener");

        tokio::spawn(async move {
            let mut readiness = ReadinessTracker::new();

            while let Some(event) = event_channel.recv().await {
                match event {
                    EngineEvent::PlaybackStateChanged { load, index, state } => {
                        tracing::debug!(load, index, ?state, "EngineEvent::PlaybackStateChanged");
                        let current = player.lock().await.load_generation();
                        if load != current {
                            tracing::trace!(load, current, "Stale state change dropped");
                            continue;
                        }
                        let Some(ready_index) = readiness.observe(index, state) else {
                            continue;
                        };
                        let feed_index = player.lock().await.feed_index_for(ready_index);
                        if let Some(feed_index) = feed_index {
                            let shown = model.lock().await.on_ready(feed_index);
                            tracing::debug!(feed_index, shown, "Item ready");
                        }
                    }
                    EngineEvent::LoadProgress { load, index, bytes } => {
                        tracing::trace!(load, index, bytes, "EngineEvent::LoadProgress");
                        if load != player.lock().await.load_generation() {
                            continue;
                        }
                        model.lock().await.update_buffered(index, bytes);
                    }
                    EngineEvent::Error { index, message } => {
                        tracing::warn!(index, error = %message, "EngineEvent::Error");
                    }
                }

                if model.lock().await.should_quit() {
                    tracing::debug!("Engine event listener shutting down");
                    break;
                }
            }
        });
    }
}
