//! Key and focus event handling

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::player::{LifecycleEvent, PlaybackEngine};
use super::AppController;

impl<E: PlaybackEngine + 'static> AppController<E> {
    pub async fn handle_event(&self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key_event(key).await,
            // Terminal focus stands in for the screen going to / coming back from background
            Event::FocusLost => {
                self.handle_lifecycle(LifecycleEvent::Pause).await;
                Ok(())
            }
            Event::FocusGained => {
                self.handle_lifecycle(LifecycleEvent::Resume).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let mut model = self.model.lock().await;

        // Help popup swallows everything except closing it
        if model.is_help_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.toggle_help();
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => model.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => model.scroll_by(-1),
            KeyCode::Char('l') | KeyCode::Char('L') => {
                if let Some(liked) = model.toggle_like_centered() {
                    model.set_status(if liked { "Liked" } else { "Like removed" });
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => model.toggle_help(),
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                model.set_should_quit(true);
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                model.set_should_quit(true);
            }
            _ => {}
        }

        Ok(())
    }
}
