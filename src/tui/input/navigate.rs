use crossterm::event::{KeyCode, KeyEvent};

use crate::ops::confirm::{ConfirmAction, delete_needs_confirm};
use crate::ops::edit::{EditSession, EditTarget};
use crate::tui::app::{App, Mode, Row};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Clear any transient status message on keypress
    app.status = None;

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('S') => app.show_stats = true,

        // Cursor
        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, 1),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, -1),
        KeyCode::Home => app.cursor = 0,
        KeyCode::End => app.cursor = app.rows.len().saturating_sub(1),

        // New entries
        KeyCode::Char('a') => begin_edit(app, EditTarget::NewSimple, ""),
        KeyCode::Char('g') => begin_edit(app, EditTarget::NewGroup, ""),
        KeyCode::Char('s') => begin_add_subtask(app),

        // Changes to the selection
        KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => toggle_selected(app),
        KeyCode::Char('e') => begin_edit_selected(app),
        KeyCode::Char('d') | KeyCode::Delete => delete_selected(app),
        KeyCode::Char('c') => clear_selected_bucket(app),
        KeyCode::Char('J') => move_selected(app, 1),
        KeyCode::Char('K') => move_selected(app, -1),
        _ => {}
    }
}

fn move_cursor(app: &mut App, delta: isize) {
    if app.rows.is_empty() {
        return;
    }
    let max = app.rows.len() - 1;
    app.cursor = app.cursor.saturating_add_signed(delta).min(max);
}

fn begin_edit(app: &mut App, target: EditTarget, initial: &str) {
    app.edit = Some(EditSession::new(target, initial));
    app.mode = Mode::Edit;
}

fn begin_add_subtask(app: &mut App) {
    let Some(id) = app.selected_task() else {
        app.status = Some("select a group to add a step".into());
        return;
    };
    let is_group = app.board().node(id).is_some_and(|n| n.is_group());
    if is_group {
        begin_edit(app, EditTarget::NewSubtask { group: id }, "");
    } else {
        app.status = Some("steps can only be added to groups".into());
    }
}

fn toggle_selected(app: &mut App) {
    match app.selected().cloned() {
        Some(Row::Task { id, .. }) => {
            let is_group = app.board().node(id).is_some_and(|n| n.is_group());
            if is_group {
                app.status = Some("a group finishes when all of its steps are done".into());
                return;
            }
            app.change(|s| s.toggle_simple(id));
        }
        Some(Row::Subtask { group, sub }) => {
            app.change(|s| s.toggle_subtask(group, sub));
            // A finished group moves to the archive; follow the step
            if let Some(i) = app
                .rows
                .iter()
                .position(|r| *r == Row::Subtask { group, sub })
            {
                app.cursor = i;
            }
        }
        Some(Row::Bucket { .. }) | None => {}
    }
}

fn begin_edit_selected(app: &mut App) {
    let Some(row) = app.selected().cloned() else {
        return;
    };
    let (target, initial) = match row {
        Row::Task { id, done } => {
            if done {
                app.status = Some("archived tasks cannot be edited".into());
                return;
            }
            let Some(node) = app.board().node(id) else {
                return;
            };
            (EditTarget::Task(id), node.label().to_string())
        }
        Row::Subtask { group, sub } => {
            let Some(node) = app.board().node(group) else {
                return;
            };
            if node.is_done() {
                app.status = Some("archived tasks cannot be edited".into());
                return;
            }
            let Some(step) = node.subtask(sub) else {
                return;
            };
            (EditTarget::Subtask { group, sub }, step.text.clone())
        }
        Row::Bucket { .. } => return,
    };
    begin_edit(app, target, &initial);
}

fn delete_selected(app: &mut App) {
    match app.selected().cloned() {
        Some(Row::Task { id, .. }) => {
            let Some(node) = app.board().node(id) else {
                return;
            };
            let action = ConfirmAction::delete(node);
            if delete_needs_confirm(node, &app.config.ui) {
                request_confirm(app, action);
            } else {
                app.change(|s| s.apply(action));
            }
        }
        Some(Row::Subtask { group, sub }) => {
            app.change(|s| s.remove_subtask(group, sub));
        }
        Some(Row::Bucket { key }) => request_confirm(app, ConfirmAction::ClearBucket { key }),
        None => {}
    }
}

/// Clear the archive day under the cursor (its heading or any task in it)
fn clear_selected_bucket(app: &mut App) {
    let key = app
        .rows
        .get(..=app.cursor)
        .and_then(|rows| {
            rows.iter().rev().find_map(|r| match r {
                Row::Bucket { key } => Some(Some(key.clone())),
                Row::Task { done: false, .. } => Some(None),
                _ => None,
            })
        })
        .flatten();
    match key {
        Some(key) => request_confirm(app, ConfirmAction::ClearBucket { key }),
        None => app.status = Some("select an archive day to clear".into()),
    }
}

fn move_selected(app: &mut App, delta: isize) {
    let Some(Row::Task { id, done: false }) = app.selected().cloned() else {
        return;
    };
    let Some(index) = app.board().pending.iter().position(|t| t.id == id) else {
        return;
    };
    let Some(to) = index.checked_add_signed(delta) else {
        return;
    };
    if to >= app.board().pending.len() {
        return;
    }
    app.change(|s| s.move_pending(id, to));
    app.select_task(id);
}

pub(super) fn request_confirm(app: &mut App, action: ConfirmAction) {
    app.confirm.request(action);
    app.mode = Mode::Confirm;
}
