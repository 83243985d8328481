mod confirm;
mod edit;
mod navigate;
mod popups;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

use confirm::handle_confirm;
use edit::handle_edit;
use navigate::handle_navigate;
use popups::{handle_help, handle_stats_popup};

/// Handle a key event in the current mode
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    // Ctrl+C always quits, even mid-edit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.mode {
        Mode::Edit => handle_edit(app, key),
        Mode::Confirm => handle_confirm(app, key),
        Mode::Navigate => {
            // Overlays intercept navigation keys
            if app.show_help {
                handle_help(app, key);
            } else if app.show_stats {
                handle_stats_popup(app, key);
            } else {
                handle_navigate(app, key);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_keys {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    pub fn key(c: char) -> KeyEvent {
        let modifiers = if c.is_ascii_uppercase() {
            KeyModifiers::SHIFT
        } else {
            KeyModifiers::NONE
        };
        KeyEvent::new(KeyCode::Char(c), modifiers)
    }

    pub fn code(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Type `text` then press Enter
    pub fn type_line(app: &mut crate::tui::app::App, text: &str) {
        for c in text.chars() {
            super::handle_key(app, KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        super::handle_key(app, code(KeyCode::Enter));
    }
}
