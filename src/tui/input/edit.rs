use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::edit::EditTarget;
use crate::tui::app::{App, Mode};

pub(super) fn handle_edit(app: &mut App, key: KeyEvent) {
    let Some(edit) = app.edit.as_mut() else {
        app.mode = Mode::Navigate;
        return;
    };
    match (key.modifiers, key.code) {
        (_, KeyCode::Enter) => commit_edit(app),
        (_, KeyCode::Esc) => {
            edit.cancel();
            finish_edit(app);
        }
        (_, KeyCode::Backspace) => edit.backspace(),
        (_, KeyCode::Left) => edit.move_left(),
        (_, KeyCode::Right) => edit.move_right(),
        (_, KeyCode::Home) => edit.move_home(),
        (_, KeyCode::End) => edit.move_end(),
        (KeyModifiers::CONTROL, KeyCode::Char('a')) => edit.move_home(),
        (KeyModifiers::CONTROL, KeyCode::Char('e')) => edit.move_end(),
        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => edit.insert(c),
        _ => {}
    }
}

fn finish_edit(app: &mut App) {
    app.edit = None;
    app.mode = Mode::Navigate;
}

/// Apply the entered text. Blank text ends the edit without a change.
fn commit_edit(app: &mut App) {
    let Some(edit) = app.edit.as_mut() else {
        return;
    };
    let target = edit.target;
    let text = edit.commit();
    finish_edit(app);
    let Some(text) = text else {
        return;
    };

    match target {
        EditTarget::NewSimple => {
            if let Some(Some(id)) = app.change(|s| s.add_simple(&text)) {
                app.select_task(id);
            }
        }
        EditTarget::NewGroup => {
            if let Some(Some(id)) = app.change(|s| s.add_group(&text)) {
                app.select_task(id);
            }
        }
        EditTarget::NewSubtask { group } => {
            app.change(|s| s.add_subtask(group, &text));
            app.select_task(group);
        }
        EditTarget::Task(id) => {
            app.change(|s| s.edit_text(id, &text));
        }
        EditTarget::Subtask { group, sub } => {
            app.change(|s| s.edit_subtask(group, sub, &text));
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyCode;

    use crate::tui::app::Mode;
    use crate::tui::input::handle_key;
    use crate::tui::input::test_keys::{code, key, type_line};
    use crate::tui::render::test_helpers::empty_app;

    #[test]
    fn blank_entry_adds_nothing() {
        let mut app = empty_app();
        handle_key(&mut app, key('a'));
        type_line(&mut app, "   ");
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.board().pending.is_empty());
    }

    #[test]
    fn esc_cancels_without_saving() {
        let mut app = empty_app();
        handle_key(&mut app, key('a'));
        for c in "draft".chars() {
            handle_key(&mut app, key(c));
        }
        handle_key(&mut app, code(KeyCode::Esc));
        assert_eq!(app.mode, Mode::Navigate);
        assert!(app.edit.is_none());
        assert!(app.board().pending.is_empty());
    }

    #[test]
    fn edit_replaces_text() {
        let mut app = empty_app();
        handle_key(&mut app, key('a'));
        type_line(&mut app, "buy milk");
        handle_key(&mut app, key('e'));
        for _ in 0.."milk".len() {
            handle_key(&mut app, code(KeyCode::Backspace));
        }
        type_line(&mut app, "bread");
        assert_eq!(app.board().pending[0].label(), "buy bread");
    }

    #[test]
    fn edit_step_text() {
        let mut app = empty_app();
        handle_key(&mut app, key('g'));
        type_line(&mut app, "trip");
        handle_key(&mut app, key('s'));
        type_line(&mut app, "pak");
        handle_key(&mut app, key('j'));
        handle_key(&mut app, key('e'));
        handle_key(&mut app, code(KeyCode::Left));
        handle_key(&mut app, key('c'));
        handle_key(&mut app, code(KeyCode::Enter));
        assert_eq!(app.board().pending[0].subtasks()[0].text, "pack");
    }

    #[test]
    fn typed_keys_do_not_trigger_commands() {
        let mut app = empty_app();
        handle_key(&mut app, key('a'));
        type_line(&mut app, "quit? x d");
        assert!(!app.should_quit);
        assert_eq!(app.board().pending[0].label(), "quit? x d");
    }
}
