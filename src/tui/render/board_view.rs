use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::{Subtask, TaskKind, TaskNode};
use crate::tui::app::{App, Row};
use crate::tui::theme::Theme;
use crate::util::time::time_tag;
use crate::util::unicode::{display_width, truncate_to_width};

use super::helpers::spans_width;

/// Render the pending list and the archive below it
pub fn render_board(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines = board_lines(app, area.width as usize);

    // Keep the cursor line on screen
    let visible_height = area.height as usize;
    if let Some(cursor_line) = lines.iter().position(|(row, _)| *row == Some(app.cursor)) {
        if cursor_line < app.scroll_offset {
            app.scroll_offset = cursor_line;
        } else if cursor_line >= app.scroll_offset + visible_height {
            app.scroll_offset = cursor_line + 1 - visible_height;
        }
    }
    app.scroll_offset = app
        .scroll_offset
        .min(lines.len().saturating_sub(visible_height));

    let visible: Vec<Line> = lines
        .into_iter()
        .skip(app.scroll_offset)
        .take(visible_height)
        .map(|(_, line)| line)
        .collect();
    let paragraph = Paragraph::new(visible).style(Style::default().bg(app.theme.background));
    frame.render_widget(paragraph, area);
}

/// Every board line, tagged with the row index it shows (headings have none)
fn board_lines(app: &App, width: usize) -> Vec<(Option<usize>, Line<'static>)> {
    let theme = &app.theme;
    let board = app.board();
    let bg = theme.background;
    let heading_style = Style::default()
        .fg(theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![(
        None,
        Line::from(Span::styled(
            format!(" Pending ({})", board.pending.len()),
            heading_style,
        )),
    )];
    if board.pending.is_empty() {
        lines.push((
            None,
            Line::from(Span::styled(
                "   nothing to do. press a to add a task",
                Style::default().fg(theme.dim).bg(bg),
            )),
        ));
    }

    let mut archive_started = false;
    for (i, row) in app.rows.iter().enumerate() {
        let selected = i == app.cursor;
        let spans = match row {
            Row::Task { id, .. } => match board.node(*id) {
                Some(node) => task_spans(node, theme),
                None => continue,
            },
            Row::Subtask { group, sub } => match board.node(*group).and_then(|g| g.subtask(*sub)) {
                Some(step) => subtask_spans(step, theme),
                None => continue,
            },
            Row::Bucket { key } => {
                if !archive_started {
                    archive_started = true;
                    lines.push((None, Line::from("")));
                    lines.push((
                        None,
                        Line::from(Span::styled(
                            format!(" Archive ({})", board.done_count()),
                            heading_style,
                        )),
                    ));
                }
                let count = board.bucket(key).map_or(0, |b| b.tasks.len());
                vec![
                    Span::styled(
                        format!(" {}", key),
                        Style::default()
                            .fg(theme.date)
                            .bg(bg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {}", count),
                        Style::default().fg(theme.dim).bg(bg),
                    ),
                ]
            }
        };
        lines.push((Some(i), finish_line(spans, selected, width, theme)));
    }
    lines
}

fn task_spans(node: &TaskNode, theme: &Theme) -> Vec<Span<'static>> {
    let bg = theme.background;
    let done = node.is_done();
    let text_style = if done {
        Style::default().fg(theme.done).bg(bg)
    } else {
        Style::default().fg(theme.text).bg(bg)
    };
    let mut spans = match &node.kind {
        TaskKind::Simple { text } => vec![
            Span::styled(
                if done { "  [x] " } else { "  [ ] " },
                Style::default()
                    .fg(if done { theme.green } else { theme.text })
                    .bg(bg),
            ),
            Span::styled(text.clone(), text_style),
        ],
        TaskKind::Group { title, subtasks } => {
            let ticked = subtasks.iter().filter(|s| s.done).count();
            vec![
                Span::styled(
                    "  \u{25BE} ",
                    Style::default()
                        .fg(if done { theme.green } else { theme.yellow })
                        .bg(bg),
                ),
                Span::styled(title.clone(), text_style.add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  {}/{}", ticked, subtasks.len()),
                    Style::default().fg(theme.dim).bg(bg),
                ),
            ]
        }
    };
    if let Some(ts) = node.completed_at {
        spans.push(Span::styled(
            format!("  {}", time_tag(ts)),
            Style::default().fg(theme.dim).bg(bg),
        ));
    }
    spans
}

fn subtask_spans(step: &Subtask, theme: &Theme) -> Vec<Span<'static>> {
    let bg = theme.background;
    let (mark, mark_color, text_color) = if step.done {
        ("      [x] ", theme.green, theme.done)
    } else {
        ("      [ ] ", theme.text, theme.text)
    };
    vec![
        Span::styled(mark, Style::default().fg(mark_color).bg(bg)),
        Span::styled(step.text.clone(), Style::default().fg(text_color).bg(bg)),
    ]
}

/// Truncate to the available width and paint the selection
fn finish_line(
    mut spans: Vec<Span<'static>>,
    selected: bool,
    width: usize,
    theme: &Theme,
) -> Line<'static> {
    let total = spans_width(&spans);
    if total > width {
        // Shorten the widest span (the task text) so the tail still fits
        let overflow = total - width;
        if let Some(widest) = spans
            .iter_mut()
            .max_by_key(|s| display_width(&s.content))
        {
            let w = display_width(&widest.content);
            widest.content = truncate_to_width(&widest.content, w.saturating_sub(overflow)).into();
        }
    }
    if selected {
        if let Some(first) = spans.first_mut() {
            // Replace the leading space with a cursor bar
            let rest = first
                .content
                .strip_prefix(' ')
                .unwrap_or(first.content.as_ref())
                .to_string();
            *first = Span::styled(rest, first.style);
        }
        spans.insert(
            0,
            Span::styled("\u{258C}", Style::default().fg(theme.highlight)),
        );
        let used = spans_width(&spans);
        if used < width {
            spans.push(Span::raw(" ".repeat(width - used)));
        }
        for span in &mut spans {
            span.style = span.style.bg(theme.selection_bg);
        }
    }
    Line::from(spans)
}
