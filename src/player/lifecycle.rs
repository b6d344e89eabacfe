//! Host screen lifecycle binding

use super::PlaybackEngine;
use super::reel_player::ReelPlayer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Resume,
    Pause,
    Stop,
    Destroy,
}

/// Pauses the player while the screen is in the background and releases it on destroy.
///
/// One binding lives as long as its screen, so the player it drives is never duplicated.
#[derive(Debug, Default)]
pub struct LifecycleBinding {
    in_background: bool,
    resume_on_foreground: bool,
    destroyed: bool,
}

impl LifecycleBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn handle<E: PlaybackEngine>(&mut self, event: LifecycleEvent, player: &mut ReelPlayer<E>) {
        if self.destroyed {
            tracing::trace!(?event, "Lifecycle event after destroy ignored");
            return;
        }

        match event {
            LifecycleEvent::Pause | LifecycleEvent::Stop => {
                // Pause then Stop must not overwrite what was playing before Pause
                if !self.in_background {
                    self.resume_on_foreground = player.play_when_ready();
                    self.in_background = true;
                }
                player.set_play_when_ready(false);
                tracing::debug!(?event, resume_on_foreground = self.resume_on_foreground, "Screen backgrounded");
            }
            LifecycleEvent::Resume => {
                if self.in_background && self.resume_on_foreground {
                    player.set_play_when_ready(true);
                }
                tracing::debug!(resumed = self.in_background && self.resume_on_foreground, "Screen foregrounded");
                self.in_background = false;
                self.resume_on_foreground = false;
            }
            LifecycleEvent::Destroy => {
                self.destroyed = true;
                player.release();
                tracing::info!("Screen destroyed, player released");
            }
        }
    }
}
