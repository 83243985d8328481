use std::path::{Path, PathBuf};

use crate::io::document::{from_document, parse_document, to_document};
use crate::io::recovery::{RecoveryCategory, RecoveryEntry, log_recovery};
use crate::io::storage::{Storage, StorageError};
use crate::model::{Board, SubtaskId, TaskId, TaskNode};
use crate::ops::backup::{self, BackupError, ExportOutcome};
use crate::ops::confirm::ConfirmAction;
use crate::ops::group_ops::{self, GroupChange, SubtaskToggle};
use crate::ops::task_ops::{self, StoreError};
use crate::ops::archive_ops;
use crate::util::time::{Clock, SystemClock};

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Backup(#[from] BackupError),
}

/// The board bound to its storage.
///
/// Every operation that changes the board writes the full document before
/// returning. Ignored input (blank text, no-op edits) writes nothing.
pub struct Session<S: Storage, C: Clock = SystemClock> {
    board: Board,
    storage: S,
    clock: C,
    key: String,
}

impl<S: Storage> Session<S, SystemClock> {
    pub fn open(storage: S, key: &str) -> Result<Self, SessionError> {
        Session::open_with_clock(storage, SystemClock, key)
    }
}

impl<S: Storage, C: Clock> Session<S, C> {
    /// Load the document under `key`, or start empty if there is none
    pub fn open_with_clock(storage: S, clock: C, key: &str) -> Result<Self, SessionError> {
        let board = load_board(&storage, key, clock.now_ms())?;
        Ok(Session {
            board,
            storage,
            clock,
            key: key.to_string(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Throw away in-memory state and read the stored document again
    pub fn reload(&mut self) -> Result<(), SessionError> {
        self.board = load_board(&self.storage, &self.key, self.clock.now_ms())?;
        Ok(())
    }

    /// Reload only if the stored document differs from what this session
    /// would write. Our own saves come back through the watcher too.
    pub fn reload_if_changed(&mut self) -> Result<bool, SessionError> {
        let stored = self.storage.get(&self.key)?;
        let ours = serde_json::to_string(&to_document(&self.board))?;
        if stored.as_deref() == Some(ours.as_str()) {
            return Ok(false);
        }
        tracing::info!(key = %self.key, "stored document changed, reloading");
        self.reload()?;
        Ok(true)
    }

    /// Write the full document
    pub fn save(&self) -> Result<(), SessionError> {
        let text = serde_json::to_string(&to_document(&self.board))?;
        if let Err(e) = self.storage.set(&self.key, &text) {
            tracing::error!(error = %e, "save failed");
            if let Some(dir) = self.data_dir() {
                log_recovery(
                    &dir,
                    RecoveryEntry {
                        timestamp: chrono::Utc::now(),
                        category: RecoveryCategory::Write,
                        description: "document write failed".to_string(),
                        fields: vec![("Error".to_string(), e.to_string())],
                        body: text,
                    },
                );
            }
            return Err(e.into());
        }
        tracing::debug!(
            pending = self.board.pending.len(),
            done = self.board.done_count(),
            "saved"
        );
        Ok(())
    }

    fn data_dir(&self) -> Option<PathBuf> {
        self.storage
            .location(&self.key)
            .and_then(|p| p.parent().map(Path::to_path_buf))
    }

    fn saved<T>(&self, value: T) -> Result<T, SessionError> {
        self.save()?;
        Ok(value)
    }

    fn save_if(&self, changed: bool) -> Result<bool, SessionError> {
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn add_simple(&mut self, text: &str) -> Result<Option<TaskId>, SessionError> {
        let id = task_ops::add_simple(&mut self.board, text);
        self.save_if(id.is_some())?;
        Ok(id)
    }

    pub fn add_group(&mut self, title: &str) -> Result<Option<TaskId>, SessionError> {
        let id = task_ops::add_group(&mut self.board, title);
        self.save_if(id.is_some())?;
        Ok(id)
    }

    pub fn toggle_simple(&mut self, id: TaskId) -> Result<bool, SessionError> {
        let now = self.clock.now_ms();
        let done = task_ops::toggle_simple(&mut self.board, id, now)?;
        self.saved(done)
    }

    pub fn edit_text(&mut self, id: TaskId, text: &str) -> Result<bool, SessionError> {
        let changed = task_ops::edit_text(&mut self.board, id, text)?;
        self.save_if(changed)
    }

    pub fn move_pending(&mut self, id: TaskId, to_index: usize) -> Result<bool, SessionError> {
        let changed = task_ops::move_pending(&mut self.board, id, to_index)?;
        self.save_if(changed)
    }

    pub fn delete(&mut self, id: TaskId) -> Result<TaskNode, SessionError> {
        let node = task_ops::delete_node(&mut self.board, id)?;
        self.saved(node)
    }

    // -----------------------------------------------------------------------
    // Group steps
    // -----------------------------------------------------------------------

    pub fn add_subtask(
        &mut self,
        group: TaskId,
        text: &str,
    ) -> Result<Option<(SubtaskId, GroupChange)>, SessionError> {
        let now = self.clock.now_ms();
        let added = group_ops::add_subtask(&mut self.board, group, text, now)?;
        self.save_if(added.is_some())?;
        Ok(added)
    }

    pub fn toggle_subtask(
        &mut self,
        group: TaskId,
        sub: SubtaskId,
    ) -> Result<SubtaskToggle, SessionError> {
        let now = self.clock.now_ms();
        let toggle = group_ops::toggle_subtask(&mut self.board, group, sub, now)?;
        self.saved(toggle)
    }

    pub fn remove_subtask(
        &mut self,
        group: TaskId,
        sub: SubtaskId,
    ) -> Result<GroupChange, SessionError> {
        let now = self.clock.now_ms();
        let change = group_ops::remove_subtask(&mut self.board, group, sub, now)?;
        self.saved(change)
    }

    pub fn edit_subtask(
        &mut self,
        group: TaskId,
        sub: SubtaskId,
        text: &str,
    ) -> Result<bool, SessionError> {
        let changed = group_ops::edit_subtask(&mut self.board, group, sub, text)?;
        self.save_if(changed)
    }

    // -----------------------------------------------------------------------
    // Archive, tally, backups
    // -----------------------------------------------------------------------

    pub fn clear_bucket(&mut self, key: &str) -> Result<Vec<TaskNode>, SessionError> {
        let removed = archive_ops::clear_bucket(&mut self.board, key)?;
        self.saved(removed)
    }

    pub fn reset_stats(&mut self) -> Result<(), SessionError> {
        self.board.stats.reset();
        self.save()
    }

    pub fn export(&self, dest: &Path) -> Result<ExportOutcome, SessionError> {
        Ok(backup::export(&self.storage, &self.key, dest)?)
    }

    /// Replace the stored document with a backup file and reload from it
    pub fn import(&mut self, source: &Path) -> Result<(), SessionError> {
        backup::import(&self.storage, &self.key, source)?;
        self.reload()
    }

    /// Run an action that has been confirmed by the user
    pub fn apply(&mut self, action: ConfirmAction) -> Result<(), SessionError> {
        match action {
            ConfirmAction::DeleteTask { id, .. } => self.delete(id).map(|_| ()),
            ConfirmAction::ClearBucket { key } => self.clear_bucket(&key).map(|_| ()),
            ConfirmAction::ResetStats => self.reset_stats(),
            ConfirmAction::Import { path } => self.import(&path),
        }
    }
}

/// Read the stored board. Text that is not JSON is set aside as
/// `<key>.json.bak` and treated as if nothing had been saved.
pub fn load_board<S: Storage>(storage: &S, key: &str, now: i64) -> Result<Board, StorageError> {
    let Some(text) = storage.get(key)? else {
        tracing::debug!(key, "no stored document, starting empty");
        return Ok(Board::new());
    };
    match parse_document(&text) {
        Ok(doc) => Ok(from_document(doc, now)),
        Err(e) => {
            let location = storage.location(key);
            let backup = location.as_ref().map(|p| p.with_extension("json.bak"));
            if let Some(bak) = &backup
                && let Err(copy_err) = std::fs::write(bak, &text)
            {
                tracing::warn!(error = %copy_err, "could not back up unreadable document");
            }
            if let Some(dir) = location.as_deref().and_then(Path::parent) {
                log_recovery(
                    dir,
                    RecoveryEntry {
                        timestamp: chrono::Utc::now(),
                        category: RecoveryCategory::Corrupt,
                        description: format!("stored document {} is not valid JSON", key),
                        fields: vec![("Error".to_string(), e.to_string())],
                        body: String::new(),
                    },
                );
            }
            tracing::warn!(
                key,
                error = %e,
                backup = ?backup,
                "stored document is unreadable, starting empty"
            );
            Ok(Board::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{FileStorage, MemoryStorage};
    use crate::model::Stats;
    use crate::util::time::{ManualClock, date_key};
    use tempfile::TempDir;

    const KEY: &str = "todoData";
    const T0: i64 = 1_741_348_800_000;

    fn session<'a>(
        storage: &'a MemoryStorage,
        clock: &'a ManualClock,
    ) -> Session<&'a MemoryStorage, &'a ManualClock> {
        Session::open_with_clock(storage, clock, KEY).unwrap()
    }

    #[test]
    fn end_to_end_example() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);

        let milk = s.add_simple("buy milk").unwrap().unwrap();
        assert_eq!(s.board().pending.len(), 1);
        assert!(!s.board().pending[0].is_done());

        s.toggle_simple(milk).unwrap();
        assert!(s.board().pending.is_empty());
        let bucket = s.board().bucket(&date_key(T0)).unwrap();
        assert_eq!(bucket.tasks[0].completed_at, Some(T0));
        assert_eq!(s.board().stats.small, 1);

        let trip = s.add_group("trip").unwrap().unwrap();
        let (pack, _) = s.add_subtask(trip, "pack").unwrap().unwrap();
        let (book, _) = s.add_subtask(trip, "book flight").unwrap().unwrap();
        clock.advance(1_000);
        s.toggle_subtask(trip, pack).unwrap();
        let last = s.toggle_subtask(trip, book).unwrap();
        assert_eq!(last.group, GroupChange::Promoted);
        assert_eq!(s.board().stats, Stats { big: 1, small: 3 });

        // A fresh session over the same storage sees the same state
        let reopened = session(&storage, &clock);
        assert_eq!(reopened.board().stats, Stats { big: 1, small: 3 });
        assert_eq!(reopened.board().done_count(), 2);
        assert!(reopened.board().pending.is_empty());
    }

    #[test]
    fn every_mutation_is_saved() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        let id = s.add_simple("a").unwrap().unwrap();
        assert!(storage.get(KEY).unwrap().unwrap().contains("\"a\""));

        s.edit_text(id, "b").unwrap();
        assert!(storage.get(KEY).unwrap().unwrap().contains("\"b\""));

        s.reset_stats().unwrap();
        s.delete(id).unwrap();
        assert!(!storage.get(KEY).unwrap().unwrap().contains("\"b\""));
    }

    #[test]
    fn ignored_input_does_not_write() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        assert_eq!(s.add_simple("   ").unwrap(), None);
        assert_eq!(storage.get(KEY).unwrap(), None);
    }

    #[test]
    fn store_errors_leave_storage_alone() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        let err = s.toggle_simple(TaskId(42)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::NotFound(TaskId(42)))
        ));
        assert_eq!(storage.get(KEY).unwrap(), None);
    }

    #[test]
    fn apply_confirmed_actions() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        let a = s.add_simple("a").unwrap().unwrap();
        let b = s.add_simple("b").unwrap().unwrap();
        s.toggle_simple(b).unwrap();

        let node = s.board().node(a).unwrap().clone();
        s.apply(ConfirmAction::delete(&node)).unwrap();
        assert!(s.board().pending.is_empty());

        s.apply(ConfirmAction::ClearBucket { key: date_key(T0) })
            .unwrap();
        assert!(s.board().done.is_empty());
        assert_eq!(s.board().stats.small, 1);

        s.apply(ConfirmAction::ResetStats).unwrap();
        assert_eq!(s.board().stats, Stats::default());
    }

    #[test]
    fn import_reloads_and_export_round_trips() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("data"));
        let clock = ManualClock::new(T0);
        let mut s = Session::open_with_clock(&storage, &clock, KEY).unwrap();
        s.add_simple("local").unwrap();

        let src = dir.path().join("backup.json");
        std::fs::write(
            &src,
            format!(
                r#"{{"pending":[{{"type":"simple","text":"imported"}}],"done":[{{"type":"simple","text":"old","completedAt":{},"done":true}}],"stats":{{"big":2,"small":5}}}}"#,
                T0
            ),
        )
        .unwrap();
        s.apply(ConfirmAction::Import { path: src }).unwrap();
        assert_eq!(s.board().pending[0].label(), "imported");
        assert_eq!(s.board().done_count(), 1);
        assert_eq!(s.board().stats, Stats { big: 2, small: 5 });

        let out = dir.path().join("out.json");
        assert_eq!(
            s.export(&out).unwrap(),
            ExportOutcome::Written(out.clone())
        );
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            storage.get(KEY).unwrap().unwrap()
        );
    }

    #[test]
    fn failed_import_keeps_session() {
        let dir = TempDir::new().unwrap();
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        s.add_simple("keep me").unwrap();

        let src = dir.path().join("bad.json");
        std::fs::write(&src, r#"{"done":[]}"#).unwrap();
        assert!(matches!(
            s.import(&src),
            Err(SessionError::Backup(BackupError::MissingKeys))
        ));
        assert_eq!(s.board().pending[0].label(), "keep me");
        assert!(storage.get(KEY).unwrap().unwrap().contains("keep me"));
    }

    #[test]
    fn unreadable_document_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        storage.set(KEY, "not json {{{").unwrap();

        let board = load_board(&storage, KEY, T0).unwrap();
        assert!(board.is_empty());
        let bak = dir.path().join("todoData.json.bak");
        assert_eq!(std::fs::read_to_string(bak).unwrap(), "not json {{{");
    }

    #[test]
    fn reload_only_on_outside_change() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        s.add_simple("mine").unwrap();
        assert!(!s.reload_if_changed().unwrap());

        let mut other = session(&storage, &clock);
        other.add_simple("theirs").unwrap();
        assert!(s.reload_if_changed().unwrap());
        assert_eq!(s.board().pending.len(), 2);
    }

    #[test]
    fn ids_are_stable_across_reloads() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        s.add_simple("a").unwrap();
        let g = s.add_group("g").unwrap().unwrap();
        s.add_subtask(g, "step").unwrap();

        let first = session(&storage, &clock);
        let second = session(&storage, &clock);
        let ids = |s: &Session<&MemoryStorage, &ManualClock>| -> Vec<TaskId> {
            s.board().pending.iter().map(|t| t.id).collect()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(
            first.board().pending[1].subtasks()[0].id,
            second.board().pending[1].subtasks()[0].id
        );
    }

    #[test]
    fn ids_follow_tasks_between_sessions() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        let a = s.add_simple("a").unwrap().unwrap();
        let b = s.add_simple("b").unwrap().unwrap();

        session(&storage, &clock).toggle_simple(a).unwrap();
        // "a" now sits after "b" in the document; "b" keeps its id
        let mut later = session(&storage, &clock);
        assert!(later.toggle_simple(b).unwrap());
        assert!(later.board().pending.is_empty());
        assert_eq!(later.board().done_count(), 2);
    }

    #[test]
    fn moved_task_keeps_its_id() {
        let storage = MemoryStorage::new();
        let clock = ManualClock::new(T0);
        let mut s = session(&storage, &clock);
        s.add_simple("a").unwrap();
        s.add_simple("b").unwrap();
        let c = s.add_simple("c").unwrap().unwrap();

        session(&storage, &clock).move_pending(c, 0).unwrap();
        let mut later = session(&storage, &clock);
        later.edit_text(c, "first").unwrap();
        let labels: Vec<&str> = later.board().pending.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["first", "a", "b"]);
    }
}
