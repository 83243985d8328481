use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::io::config_io::{read_config, resolve_data_dir};
use crate::io::lock::FileLock;
use crate::io::session::{Session, SessionError};
use crate::io::storage::{FileStorage, Storage};
use crate::io::watcher::DataWatcher;
use crate::model::{AppConfig, Board, SubtaskId, TaskId, TaskNode};
use crate::ops::archive_ops::newest_first;
use crate::ops::confirm::PendingConfirm;
use crate::ops::edit::EditSession;
use crate::util::time::{Clock, SystemClock};

use super::input;
use super::render;
use super::theme::Theme;

/// The session type the TUI drives. Boxed so tests can swap in memory storage
/// and a fixed clock.
pub type BoardSession = Session<Box<dyn Storage>, Box<dyn Clock>>;

/// Current interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Edit,
    Confirm,
}

/// One selectable line of the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    /// A pending or archived task
    Task { id: TaskId, done: bool },
    /// A step under the group row above it
    Subtask { group: TaskId, sub: SubtaskId },
    /// Date heading of an archive bucket
    Bucket { key: String },
}

/// Main application state
pub struct App {
    pub session: BoardSession,
    /// Locked around every write when set; `None` for in-memory sessions
    pub data_dir: Option<PathBuf>,
    pub config: AppConfig,
    pub theme: Theme,
    pub mode: Mode,
    pub should_quit: bool,
    /// Selectable rows in display order, rebuilt after every change
    pub rows: Vec<Row>,
    /// Index into `rows`
    pub cursor: usize,
    /// First visible line of the board
    pub scroll_offset: usize,
    pub confirm: PendingConfirm,
    pub edit: Option<EditSession>,
    pub show_help: bool,
    pub show_stats: bool,
    /// One-line message in the status row, cleared on the next key
    pub status: Option<String>,
    /// An outside write arrived while editing; reload once the edit ends
    pub reload_pending: bool,
}

impl App {
    pub fn new(session: BoardSession, config: AppConfig) -> Self {
        let theme = Theme::from_config(&config.ui);
        let mut app = App {
            session,
            data_dir: None,
            config,
            theme,
            mode: Mode::Navigate,
            should_quit: false,
            rows: Vec::new(),
            cursor: 0,
            scroll_offset: 0,
            confirm: PendingConfirm::default(),
            edit: None,
            show_help: false,
            show_stats: false,
            status: None,
            reload_pending: false,
        };
        app.rebuild_rows();
        app
    }

    pub fn board(&self) -> &Board {
        self.session.board()
    }

    pub fn now(&self) -> i64 {
        self.session.now()
    }

    /// Recompute `rows` from the board and keep the cursor in range
    pub fn rebuild_rows(&mut self) {
        self.rows = build_rows(self.session.board());
        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
    }

    pub fn selected(&self) -> Option<&Row> {
        self.rows.get(self.cursor)
    }

    /// The task under the cursor, or the group owning the step under it
    pub fn selected_task(&self) -> Option<TaskId> {
        match self.selected()? {
            Row::Task { id, .. } => Some(*id),
            Row::Subtask { group, .. } => Some(*group),
            Row::Bucket { .. } => None,
        }
    }

    /// Put the cursor on the row for `id`, if it is still on the board
    pub fn select_task(&mut self, id: TaskId) {
        if let Some(i) = self
            .rows
            .iter()
            .position(|r| matches!(r, Row::Task { id: rid, .. } if *rid == id))
        {
            self.cursor = i;
        }
    }

    /// Run one write against the session while holding the data-directory
    /// lock. The stored document is re-read first so that writes made
    /// since the last watcher event are kept. Rebuilds the rows on
    /// success; errors go to the status row.
    pub fn change<T>(
        &mut self,
        f: impl FnOnce(&mut BoardSession) -> Result<T, SessionError>,
    ) -> Option<T> {
        let _lock = match self.data_dir.as_deref().map(FileLock::acquire_default) {
            Some(Err(e)) => {
                self.status = Some(e.to_string());
                return None;
            }
            Some(Ok(lock)) => Some(lock),
            None => None,
        };
        let result = self
            .session
            .reload_if_changed()
            .and_then(|_| f(&mut self.session));
        match result {
            Ok(value) => {
                self.rebuild_rows();
                Some(value)
            }
            Err(e) => {
                self.status = Some(e.to_string());
                self.rebuild_rows();
                None
            }
        }
    }

    /// Pick up writes made by another process (usually `tick` on the CLI).
    /// Waits while an edit or a confirmation prompt is open.
    pub fn reload_from_disk(&mut self) {
        if self.mode != Mode::Navigate {
            self.reload_pending = true;
            return;
        }
        self.reload_pending = false;
        match self.session.reload_if_changed() {
            Ok(true) => {
                self.rebuild_rows();
                self.status = Some("reloaded: data changed outside this window".into());
            }
            Ok(false) => {}
            Err(e) => self.status = Some(e.to_string()),
        }
    }
}

/// Pending tasks first, then each archive day newest first, each followed
/// by the steps of its groups.
pub fn build_rows(board: &Board) -> Vec<Row> {
    let mut rows = Vec::new();
    for node in &board.pending {
        push_task_rows(&mut rows, node);
    }
    for (key, tasks) in newest_first(board) {
        rows.push(Row::Bucket {
            key: key.to_string(),
        });
        for node in tasks {
            push_task_rows(&mut rows, node);
        }
    }
    rows
}

fn push_task_rows(rows: &mut Vec<Row>, node: &TaskNode) {
    rows.push(Row::Task {
        id: node.id,
        done: node.is_done(),
    });
    for sub in node.subtasks() {
        rows.push(Row::Subtask {
            group: node.id,
            sub: sub.id,
        });
    }
}

/// Run the TUI application
pub fn run(data_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = resolve_data_dir(data_dir);
    let config = read_config(&data_dir)?;
    let storage: Box<dyn Storage> = Box::new(FileStorage::new(&data_dir));
    let clock: Box<dyn Clock> = Box::new(SystemClock);
    let session = {
        let _lock = FileLock::acquire_default(&data_dir)?;
        Session::open_with_clock(storage, clock, &config.storage.key)?
    };
    let watcher = DataWatcher::start(&data_dir, &config.storage.key).ok();

    let mut app = App::new(session, config);
    app.data_dir = Some(data_dir);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app, watcher.as_ref());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    watcher: Option<&DataWatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| render::render(frame, app))?;

        // 250ms poll keeps the header clock ticking
        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if let Some(w) = watcher
            && !w.poll().is_empty()
        {
            app.reload_from_disk();
        }
        if app.reload_pending && app.mode == Mode::Navigate {
            app.reload_from_disk();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
