use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, InputMode};
use crate::config;
use crate::player::{MediaElement, MediaEvent, shortcut_for};
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: keeps the core bound to the displayed queue,
/// applies media events in arrival order, draws, and handles input.
/// Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    media: &mut dyn MediaElement,
    events: &mpsc::Receiver<MediaEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = EventLoopState::default();

    loop {
        app.sync_queue();

        while let Ok(ev) = events.try_recv() {
            app.handle_media_event(ev, media);
        }
        app.persist_prefs();

        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, media, &mut state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one key press. Returns `true` when the user asked to quit.
fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    media: &mut dyn MediaElement,
    state: &mut EventLoopState,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match app.mode {
        InputMode::Confirm(_) => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.resolve_confirm(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.resolve_confirm(false)
                }
                _ => {}
            }
            return false;
        }
        InputMode::Search => {
            handle_search_key(key, app);
            return false;
        }
        InputMode::NamePlaylist(_) => {
            match key.code {
                KeyCode::Esc => app.cancel_prompt(),
                KeyCode::Enter => app.submit_name(),
                KeyCode::Backspace => app.name_pop(),
                KeyCode::Char(c) if !c.is_control() => app.name_push(c),
                _ => {}
            }
            return false;
        }
        InputMode::Normal => {}
    }

    app.status = None;

    if let Some(shortcut) = shortcut_for(&key, app.typing()) {
        state.pending_gg = false;
        app.dispatch(shortcut, media);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.cursor_top();
            } else {
                state.pending_gg = true;
            }
            return false;
        }
        KeyCode::Char('G') => app.cursor_bottom(),
        KeyCode::Char('j') => app.cursor_down(),
        KeyCode::Char('k') => app.cursor_up(),
        KeyCode::Char('c') => app.cursor_to_now_playing(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('s') => app.core.toggle_shuffle(),
        KeyCode::Char('r') => app.core.cycle_repeat(),
        KeyCode::Char('m') => app.core.toggle_mute(media),
        KeyCode::Char(c @ '0'..='9') => app.seek_tenths(c.to_digit(10).unwrap_or(0), media),
        KeyCode::Char('w') => app.begin_save(),
        KeyCode::Char('o') => app.load_selected_playlist(media),
        KeyCode::Char('x') => app.request_delete(),
        KeyCode::Char('f') => app.favorite_at_cursor(),
        KeyCode::Enter => app.activate(media),
        KeyCode::Tab => app.toggle_view(),
        KeyCode::Esc if !app.queue.query().is_empty() => app.cancel_search(),
        _ => {}
    }
    // gg pending should clear on any other key
    state.pending_gg = false;

    false
}

fn handle_search_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => app.finish_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Down => app.cursor_down(),
        KeyCode::Up => app.cursor_up(),
        KeyCode::Char('j') if key.modifiers.contains(KeyModifiers::CONTROL) => app.cursor_down(),
        KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => app.cursor_up(),
        KeyCode::Char(c) if !c.is_control() => app.search_push(c),
        _ => {}
    }
}
