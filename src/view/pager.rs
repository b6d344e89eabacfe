//! Feed page rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{FeedViewState, PageState, PageView, PlaybackInfo, RenderTarget};
use super::utils::{format_bytes, format_count, truncate_string};

pub fn render_pager(frame: &mut Frame, area: Rect, view: &FeedViewState) {
    if view.pages.is_empty() {
        let empty = Paragraph::new("Feed is empty")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Reels "));
        frame.render_widget(empty, area);
        return;
    }

    // Mid-scroll two pages share the viewport
    let constraints: Vec<Constraint> = view
        .pages
        .iter()
        .map(|page| Constraint::Percentage((page.share * 100.0).round() as u16))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (page, chunk) in view.pages.iter().zip(chunks.iter()) {
        match page.target {
            RenderTarget::PlaybackSurface => render_surface(frame, *chunk, page, &view.playback),
            RenderTarget::Thumbnail => render_thumbnail(frame, *chunk, page, view.page_count),
        }
    }
}

fn render_thumbnail(frame: &mut Frame, area: Rect, page: &PageView, page_count: usize) {
    let item = &page.item;
    let width = area.width.saturating_sub(4) as usize;

    let title = match page.state {
        PageState::Activating => format!(" Reel {}/{} · loading… ", page.index + 1, page_count),
        _ => format!(" Reel {}/{} ", page.index + 1, page_count),
    };

    let thumbnail = item.thumbnail.as_deref().unwrap_or("(no thumbnail)");
    let liked = if item.is_already_liked { "♥" } else { "♡" };
    let followed = if item.is_followed { " · following" } else { "" };

    let mut lines = vec![
        Line::from(Span::styled(
            "▣ thumbnail",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(truncate_string(thumbnail, width)),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("@{}", item.uploader()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(followed),
        ]),
    ];
    if let Some(name) = &item.name {
        lines.push(Line::from(truncate_string(name, width)));
    }
    if item.media_url().is_none() {
        lines.push(Line::from(Span::styled(
            "no video for this reel",
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(format!(
        "{} {}   💬 {}   ⬇ {}",
        liked,
        format_count(item.like_count),
        format_count(item.comment_count),
        format_count(item.download_count),
    )));

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(widget, area);
}

fn render_surface(frame: &mut Frame, area: Rect, page: &PageView, playback: &PlaybackInfo) {
    let width = area.width.saturating_sub(4) as usize;
    let url = playback.media_url.as_deref().unwrap_or_default();
    let state = if playback.is_playing { "▶ playing" } else { "⏸ paused" };
    let index = playback
        .playlist_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(Span::styled(
            state,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(truncate_string(url, width)),
        Line::from(""),
        Line::from(format!("playlist #{}   buffered {}", index, format_bytes(playback.buffered_bytes))),
        Line::from(format!(
            "@{}   ♥ {}",
            page.item.uploader(),
            format_count(page.item.like_count)
        )),
    ];

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(format!(" Reel {} · live ", page.index + 1))
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}
