use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Global playback shortcuts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Shortcut {
    TogglePlay,
    SeekForward,
    SeekBackward,
    VolumeUp,
    VolumeDown,
    Next,
    Previous,
}

/// Map a key press to a shortcut.
///
/// Shortcuts are suspended while the user is typing into a text prompt
/// (`typing`), and chords with Ctrl/Alt are never shortcuts.
pub fn shortcut_for(key: &KeyEvent, typing: bool) -> Option<Shortcut> {
    if typing
        || key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }

    match key.code {
        KeyCode::Char(' ') => Some(Shortcut::TogglePlay),
        KeyCode::Right => Some(Shortcut::SeekForward),
        KeyCode::Left => Some(Shortcut::SeekBackward),
        KeyCode::Up => Some(Shortcut::VolumeUp),
        KeyCode::Down => Some(Shortcut::VolumeDown),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Shortcut::Next),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Shortcut::Previous),
        _ => None,
    }
}
