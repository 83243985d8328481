use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::confirm::ConfirmAction;
use crate::tui::app::App;

use super::navigate::request_confirm;

/// Help overlay: any of ? Esc q closes it
pub(super) fn handle_help(app: &mut App, key: KeyEvent) {
    if matches!(
        key.code,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
    ) {
        app.show_help = false;
    }
}

/// Stats popup: r asks to reset, S Esc q close
pub(super) fn handle_stats_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('r') => {
            app.show_stats = false;
            request_confirm(app, ConfirmAction::ResetStats);
        }
        KeyCode::Char('S') | KeyCode::Esc | KeyCode::Char('q') => app.show_stats = false,
        _ => {}
    }
}
