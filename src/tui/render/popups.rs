use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::tui::app::App;

use super::helpers::centered_rect_fixed;

/// Yes/no box for the action waiting in `app.confirm`
pub fn render_confirm_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(action) = app.confirm.current() else {
        return;
    };
    let bg = app.theme.background;
    let popup_w: u16 = 52.min(area.width.saturating_sub(2));
    let inner_w = popup_w.saturating_sub(4).max(1) as usize;
    let prompt = action.prompt();
    let prompt_rows = prompt.chars().count().div_ceil(inner_w).max(1) as u16;

    let lines = vec![
        Line::from(Span::styled(
            prompt,
            Style::default().fg(app.theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "y",
                Style::default()
                    .fg(app.theme.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" confirm   ", Style::default().fg(app.theme.text).bg(bg)),
            Span::styled(
                "n",
                Style::default()
                    .fg(app.theme.highlight)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" cancel", Style::default().fg(app.theme.text).bg(bg)),
        ]),
    ];

    let popup_area = centered_rect_fixed(popup_w, prompt_rows + 4, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm ")
        .border_style(Style::default().fg(app.theme.red).bg(bg))
        .style(Style::default().bg(bg));
    let paragraph = Paragraph::new(lines)
        .block(block.padding(Padding::horizontal(1)))
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, popup_area);
}

/// The tally: finished groups and ticked items
pub fn render_stats_popup(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let stats = &app.board().stats;
    let label = Style::default().fg(app.theme.text).bg(bg);
    let value = Style::default()
        .fg(app.theme.green)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let key = Style::default().fg(app.theme.highlight).bg(bg);
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let lines = vec![
        Line::from(vec![
            Span::styled(" Groups finished  ", label),
            Span::styled(stats.big.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled(" Items ticked     ", label),
            Span::styled(stats.small.to_string(), value),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" r", key),
            Span::styled(" reset   ", dim),
            Span::styled("Esc", key),
            Span::styled(" close", dim),
        ]),
    ];

    let popup_area = centered_rect_fixed(34, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tally ")
        .border_style(Style::default().fg(app.theme.highlight).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        popup_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::confirm::ConfirmAction;
    use crate::tui::render::test_helpers::*;

    #[test]
    fn confirm_popup_shows_prompt() {
        let mut app = sample_app();
        app.confirm.request(ConfirmAction::ResetStats);
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_confirm_popup(frame, &app, area);
        });
        assert!(output.contains("Confirm"));
        assert!(output.contains("Reset the tally to zero?"));
        assert!(output.contains("y confirm"));
    }

    #[test]
    fn nothing_without_request() {
        let app = sample_app();
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_confirm_popup(frame, &app, area);
        });
        assert_eq!(output, "");
    }

    #[test]
    fn stats_popup_shows_counts() {
        let app = sample_app();
        let output = render_to_string(TERM_W, TERM_H, |frame, area| {
            render_stats_popup(frame, &app, area);
        });
        assert!(output.contains("Groups finished  0"));
        assert!(output.contains("Items ticked     2"));
    }
}
