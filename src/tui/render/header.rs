use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;
use crate::util::time::header_clock;

use super::helpers::spans_width;

/// Clock and tally on the first row, a rule on the second
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let stats = &app.board().stats;

    let mut spans = vec![
        Span::styled(
            " tickoff",
            Style::default()
                .fg(app.theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ", Style::default().bg(bg)),
        Span::styled(
            header_clock(app.now()),
            Style::default().fg(app.theme.text_bright).bg(bg),
        ),
    ];
    let tally = vec![
        Span::styled("groups ", Style::default().fg(app.theme.dim).bg(bg)),
        Span::styled(
            stats.big.to_string(),
            Style::default().fg(app.theme.green).bg(bg),
        ),
        Span::styled("  items ", Style::default().fg(app.theme.dim).bg(bg)),
        Span::styled(
            stats.small.to_string(),
            Style::default().fg(app.theme.green).bg(bg),
        ),
        Span::styled(" ", Style::default().bg(bg)),
    ];

    // Right-align the tally when it fits
    let left_w = spans_width(&spans);
    let right_w = spans_width(&tally);
    if left_w + right_w < width {
        spans.push(Span::styled(
            " ".repeat(width - left_w - right_w),
            Style::default().bg(bg),
        ));
        spans.extend(tally);
    }

    let rule = Line::from(Span::styled(
        "\u{2500}".repeat(width),
        Style::default().fg(app.theme.dim).bg(bg),
    ));
    let paragraph = Paragraph::new(vec![Line::from(spans), rule]).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
