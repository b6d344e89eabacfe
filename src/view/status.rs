//! Status bar rendering

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::model::FeedViewState;
use super::utils::format_bytes;

pub fn render_status_bar(frame: &mut Frame, area: Rect, view: &FeedViewState) {
    let playback = &view.playback;

    let status_text = if playback.playlist_index.is_none() {
        " Nothing playing".to_string()
    } else if playback.is_playing {
        format!(" ▶ Playing | {} buffered", format_bytes(playback.buffered_bytes))
    } else {
        format!(" ⏸  Paused | {} buffered", format_bytes(playback.buffered_bytes))
    };

    let position = if view.page_count == 0 {
        " 0 / 0 ".to_string()
    } else {
        format!(" {} / {} ", view.current_page + 1, view.page_count)
    };

    let message = view.ui.status_message.as_deref().unwrap_or("↑/↓ scroll · space play/pause · h help");

    let bar = Paragraph::new(format!(" {}", message))
        .style(Style::default().fg(Color::Gray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(status_text)
                .title_bottom(Line::from(position).right_aligned()),
        );

    frame.render_widget(bar, area);
}
