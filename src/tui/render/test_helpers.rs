use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::session::Session;
use crate::io::storage::{MemoryStorage, Storage};
use crate::model::AppConfig;
use crate::tui::app::App;
use crate::util::time::{Clock, ManualClock};
use crate::util::unicode::display_width;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Fixed "now" for every test app: 2025-03-07 12:00 UTC
pub const T0: i64 = 1_741_348_800_000;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            // A wide glyph is followed by a blank continuation cell; skip it
            let mut s = String::new();
            let mut skip = 0;
            for cell in row {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                s.push_str(cell.symbol());
                skip = display_width(cell.symbol()).saturating_sub(1);
            }
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App over empty in-memory storage with the clock stopped at `T0`.
pub fn empty_app() -> App {
    let storage: Box<dyn Storage> = Box::new(MemoryStorage::new());
    let clock: Box<dyn Clock> = Box::new(ManualClock::new(T0));
    let session = Session::open_with_clock(storage, clock, "todoData").unwrap();
    App::new(session, AppConfig::default())
}

/// Pending: "call mom", group "trip" (pack ticked, book open).
/// Archive: "buy milk" finished at `T0`.
pub fn sample_app() -> App {
    let mut app = empty_app();
    let s = &mut app.session;
    let milk = s.add_simple("buy milk").unwrap().unwrap();
    s.toggle_simple(milk).unwrap();
    s.add_simple("call mom").unwrap();
    let trip = s.add_group("trip").unwrap().unwrap();
    let (pack, _) = s.add_subtask(trip, "pack").unwrap().unwrap();
    s.add_subtask(trip, "book").unwrap();
    s.toggle_subtask(trip, pack).unwrap();
    app.rebuild_rows();
    app
}

#[cfg(test)]
mod tests {
    use ratatui::widgets::Paragraph;

    use super::*;

    #[test]
    fn wide_glyphs_render_without_gaps() {
        let output = render_to_string(20, 1, |frame, area| {
            frame.render_widget(Paragraph::new("2025年03月07日 周五"), area);
        });
        assert_eq!(output, "2025年03月07日 周五");
    }
}
