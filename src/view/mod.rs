//! View module - UI rendering
//!
//! This module handles all UI rendering for the feed screen using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared formatting helpers
//! - `pager`: Feed pages (thumbnail panel or live playback surface)
//! - `status`: Bottom status bar
//! - `overlays`: Modal overlays (help)

mod utils;
mod pager;
mod status;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::FeedViewState;

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, view: &FeedViewState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),    // Pager
                Constraint::Length(3), // Status bar
            ])
            .split(frame.area());

        pager::render_pager(frame, chunks[0], view);
        status::render_status_bar(frame, chunks[1], view);

        if view.ui.show_help {
            overlays::render_help_popup(frame);
        }
    }
}
