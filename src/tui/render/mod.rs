pub mod board_view;
pub mod header;
pub mod help_overlay;
pub mod helpers;
pub mod popups;
pub mod status_row;

#[cfg(test)]
pub mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, Mode};

/// Draw the whole screen: header, board, status row and any overlay
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Background fill
    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: header (2 rows) | board | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // clock + tally, separator
            Constraint::Min(1),    // board
            Constraint::Length(1), // status row
        ])
        .split(area);

    header::render_header(frame, app, chunks[0]);
    board_view::render_board(frame, app, chunks[1]);

    // Overlays (rendered on top of everything)
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
    if app.show_stats {
        popups::render_stats_popup(frame, app, area);
    }
    if app.mode == Mode::Confirm {
        popups::render_confirm_popup(frame, app, area);
    }

    status_row::render_status_row(frame, app, chunks[2]);
}
