//! Playback control methods

use crate::model::PlaybackInfo;
use crate::player::{LifecycleEvent, PlaybackEngine};

use super::AppController;

impl<E: PlaybackEngine + 'static> AppController<E> {
    /// Build the playlist from the feed and start listening for engine events.
    pub async fn initialize_playback(&self) {
        self.try_start_event_listener().await;

        let feed = self.model.lock().await.feed().to_vec();
        self.player.lock().await.build_playlist_from_feed(&feed);

        // The first page may have settled before the playlist existed
        let centered = self.model.lock().await.pager().centered_page();
        if let Some(page) = centered {
            self.activate_page(page).await;
        }
    }

    /// Advance the pager animation and activate a newly centered page.
    pub async fn tick(&self) {
        let activation = self.model.lock().await.pager_tick();
        if let Some(page) = activation {
            self.activate_page(page).await;
        }
    }

    pub(crate) async fn activate_page(&self, page: usize) {
        let mut player = self.player.lock().await;
        let playback = match player.playlist_index_for(page) {
            Some(index) => {
                player.seek_to(index, true);
                tracing::debug!(page, playlist_index = index, "Activating page");
                let url = player.media_url(index).unwrap_or_default().to_string();
                PlaybackInfo::for_item(index, url, player.play_when_ready())
            }
            None => {
                // Nothing to play here; keep the previous item from playing off-screen
                player.set_play_when_ready(false);
                tracing::debug!(page, "Centered page has no playable media");
                PlaybackInfo::default()
            }
        };
        drop(player);

        self.model.lock().await.set_playback(playback);
    }

    pub async fn toggle_playback(&self) {
        let mut player = self.player.lock().await;
        if player.is_released() {
            return;
        }
        let play = !player.play_when_ready();
        player.set_play_when_ready(play);
        drop(player);

        tracing::info!(action = if play { "resumed" } else { "paused" }, "Playback toggled");
        self.model.lock().await.set_playing(play);
    }

    pub async fn handle_lifecycle(&self, event: LifecycleEvent) {
        let mut player = self.player.lock().await;
        self.lifecycle.lock().await.handle(event, &mut player);
        let is_playing = player.play_when_ready();
        drop(player);

        self.model.lock().await.set_playing(is_playing);
    }
}
