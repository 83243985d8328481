use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Events sent from the file watcher to the TUI event loop.
#[derive(Debug)]
pub enum FileEvent {
    /// The stored document was written by someone else (usually `tick`).
    DocumentChanged(PathBuf),
}

/// Watches the data directory for changes to one stored document.
pub struct DataWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<FileEvent>,
}

impl DataWatcher {
    /// Start watching `data_dir` for writes to `<key>.json`.
    /// `poll()` should be called each tick.
    pub fn start(data_dir: &Path, key: &str) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let document = format!("{}.json", key);

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(_) => return,
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                if let Some(path) = event.paths.into_iter().find(|p| is_document(p, &document)) {
                    let _ = tx.send(FileEvent::DocumentChanged(path));
                }
            },
            Config::default(),
        )?;

        watcher.watch(data_dir, RecursiveMode::NonRecursive)?;
        Ok(DataWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll for pending file events.
    pub fn poll(&self) -> Vec<FileEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

/// Only the document itself counts; the lock, the recovery log, temp
/// files from atomic writes and `.bak` copies are ignored.
fn is_document(path: &Path, document: &str) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(document)
}
