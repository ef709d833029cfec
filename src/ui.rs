//! UI rendering for the terminal user interface.
//!
//! Pure drawing: everything shown is read from `App`; nothing here mutates
//! state.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock};

use crate::app::{App, InputMode, LibraryItem, View};
use crate::config::UiSettings;
use crate::time_format::format_time;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("space", "play/pause");
    map.insert("n/p", "next/prev");
    map.insert("←/→", "seek");
    map.insert("↑/↓", "volume");
    map.insert("0-9", "jump");
    map.insert("m", "mute");
    map.insert("s", "shuffle");
    map.insert("r", "repeat");
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "select/play");
    map.insert("c", "now playing");
    map.insert("/", "search");
    map.insert("tab", "queue/library");
    map.insert("w", "save queue");
    map.insert("o", "load playlist");
    map.insert("f", "favorite");
    map.insert("x", "delete");
    map.insert("q", "quit");
    map
});

/// Render the controls help text in a stable, human-friendly order.
fn controls_text() -> String {
    let order = [
        "space", "n/p", "←/→", "↑/↓", "0-9", "m", "s", "r", "j/k", "gg/G", "enter", "c", "/",
        "tab", "w", "o", "f", "x", "q",
    ];
    order
        .iter()
        .filter_map(|k| CONTROLS_MAP.get(k).map(|v| format!("[{k}] {v}")))
        .collect::<Vec<String>>()
        .join(" | ")
}

fn left_padded(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

/// Status line: transport, policy and cursor mode.
fn status_text(app: &App) -> String {
    let transport = app.core.transport();
    let mut parts: Vec<String> = Vec::new();

    let state = if transport.is_playing { "Playing" } else { "Paused" };
    match app.session.current_track() {
        Some(track) => parts.push(format!("{state}: {}", track.display())),
        None => parts.push("No track".to_string()),
    }

    parts.push(format!(
        "Shuffle: {}",
        if app.core.shuffle() { "ON" } else { "OFF" }
    ));
    parts.push(format!("Repeat: {}", app.core.repeat().label()));

    if transport.muted {
        parts.push("Volume: muted".to_string());
    } else {
        parts.push(format!("Volume: {:.0}%", transport.volume * 100.0));
    }

    if app.follow_playback {
        parts.push("Cursor: follow".to_string());
    } else {
        parts.push("Cursor: free-roam".to_string());
    }

    let q = app.queue.query().trim();
    if !q.is_empty() {
        parts.push(format!("Filter: {q}"));
    }

    parts.join(" • ")
}

/// Compute the visible window `(start, end, selected_in_window)` that keeps
/// `selected` centered when the list is taller than `height`.
fn visible_window(total: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected - start)
}

fn draw_list(frame: &mut Frame, area: Rect, title: &str, rows: Vec<String>, selected: usize) {
    let total = rows.len();
    let height = area.height.saturating_sub(2) as usize;
    let selected = selected.min(total.saturating_sub(1));
    let (start, end, selected_in_window) = visible_window(total, height, selected);

    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .map(|r| ListItem::new(r.as_str()))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_in_window));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn queue_rows(app: &App) -> Vec<String> {
    let playing = app.now_playing_row();
    app.queue
        .displayed()
        .into_iter()
        .enumerate()
        .map(|(row, track)| {
            let marker = if Some(row) == playing { "♪ " } else { "  " };
            let star = if app.is_favorite(&track.id) { " ★" } else { "" };
            format!("{marker}{}{star}", track.display())
        })
        .collect()
}

fn library_rows(app: &App) -> Vec<String> {
    (0..app.library_len())
        .filter_map(|row| app.library_item(row))
        .map(|item| match item {
            LibraryItem::Playlist(p) => format!(
                "[playlist] {} ({} tracks, {})",
                p.name,
                p.tracks.len(),
                p.created_at.format("%Y-%m-%d %H:%M")
            ),
            LibraryItem::Favorite(t) => format!("★ {}", t.display()),
        })
        .collect()
}

fn prompt_line(app: &App) -> Line<'static> {
    match &app.mode {
        InputMode::Search => Line::from(format!("/{}", app.queue.query())),
        InputMode::NamePlaylist(name) => Line::from(format!("Save queue as: {name}")),
        InputMode::Confirm(action) => Line::from(action.question()).bold(),
        InputMode::Normal => Line::from(app.status.clone().unwrap_or_default()),
    }
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" mymusic ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(left_padded(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Progress
    let transport = app.core.transport();
    let ratio = if transport.duration > 0.0 {
        (transport.progress / transport.duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .ratio(ratio)
        .label(format!(
            "{} / {}",
            format_time(transport.progress),
            format_time(transport.duration)
        ));
    frame.render_widget(gauge, chunks[2]);

    match app.view {
        View::Queue => draw_list(
            frame,
            chunks[3],
            " queue (tab: library) ",
            queue_rows(app),
            app.queue.cursor(),
        ),
        View::Library => draw_list(
            frame,
            chunks[3],
            " library (tab: queue) ",
            library_rows(app),
            app.library_cursor(),
        ),
    }

    let prompt = Paragraph::new(prompt_line(app)).block(left_padded(" prompt "));
    frame.render_widget(prompt, chunks[4]);

    let footer = Paragraph::new(controls_text())
        .block(left_padded(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[5]);
}
