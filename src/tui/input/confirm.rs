use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::confirm::ConfirmAction;
use crate::tui::app::{App, Mode};

pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm: y or Enter
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.mode = Mode::Navigate;
            // `confirm` hands the action out once; a repeated y finds nothing
            if let Some(action) = app.confirm.confirm() {
                let message = done_message(&action);
                if app.change(|s| s.apply(action)).is_some() {
                    app.status = Some(message);
                }
            }
        }
        // Cancel: n or Esc
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.confirm.cancel();
            app.mode = Mode::Navigate;
        }
        _ => {}
    }
}

fn done_message(action: &ConfirmAction) -> String {
    match action {
        ConfirmAction::DeleteTask { label, .. } => format!("deleted \"{}\"", label),
        ConfirmAction::ClearBucket { key } => format!("cleared {}", key),
        ConfirmAction::ResetStats => "tally reset".to_string(),
        ConfirmAction::Import { path } => format!("imported {}", path.display()),
    }
}
