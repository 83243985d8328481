use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::ops::edit::{EditSession, EditTarget};
use crate::tui::app::{App, Mode};

use super::helpers::spans_width;

const KEY_HINTS: &str = "a add  g group  s step  space tick  e edit  d delete  S tally  ? help  q quit";

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = match app.mode {
        Mode::Edit => match &app.edit {
            Some(edit) => (edit_spans(app, edit), "Enter save  Esc cancel"),
            None => (Vec::new(), ""),
        },
        Mode::Confirm => (
            vec![Span::styled(
                app.confirm
                    .current()
                    .map(|a| a.prompt())
                    .unwrap_or_default(),
                Style::default().fg(app.theme.text_bright).bg(bg),
            )],
            "y/n",
        ),
        Mode::Navigate => match &app.status {
            Some(message) => (
                vec![Span::styled(
                    message.clone(),
                    Style::default().fg(app.theme.yellow).bg(bg),
                )],
                "",
            ),
            None if app.config.ui.show_key_hints => (Vec::new(), KEY_HINTS),
            None => (Vec::new(), ""),
        },
    };

    // Right-aligned hint, dropped when it does not fit
    let content_width = spans_width(&spans);
    let hint_width = hint.chars().count();
    if !hint.is_empty() && content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn edit_label(target: EditTarget) -> &'static str {
    match target {
        EditTarget::NewSimple => "new task: ",
        EditTarget::NewGroup => "new group: ",
        EditTarget::NewSubtask { .. } => "new step: ",
        EditTarget::Task(_) => "edit: ",
        EditTarget::Subtask { .. } => "edit step: ",
    }
}

/// Prompt, buffer and a block cursor at the edit position
fn edit_spans(app: &App, edit: &EditSession) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    let text = Style::default().fg(app.theme.text_bright).bg(bg);
    let (before, after) = edit.buffer.split_at(edit.cursor.min(edit.buffer.len()));
    vec![
        Span::styled(
            edit_label(edit.target),
            Style::default().fg(app.theme.highlight).bg(bg),
        ),
        Span::styled(before.to_string(), text),
        Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
        Span::styled(after.to_string(), text),
    ]
}
