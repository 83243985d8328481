use crate::model::{Board, Location, SubtaskId, TaskId, TaskKind, TaskNode};

/// Error type for board operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("subtask {sub} not found in group {group}")]
    SubtaskNotFound { group: TaskId, sub: SubtaskId },
    #[error("task {0} is a group: toggle its steps instead")]
    NotSimple(TaskId),
    #[error("task {0} is not a group")]
    NotGroup(TaskId),
    #[error("task {0} is archived: only pending tasks can be moved")]
    NotPending(TaskId),
    #[error("no archived tasks for {0}")]
    BucketNotFound(String),
}

/// Trim user input, rejecting empty or whitespace-only text
pub(crate) fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Append a pending simple task. Blank text is ignored.
pub fn add_simple(board: &mut Board, text: &str) -> Option<TaskId> {
    let text = clean_text(text)?;
    let id = board.next_task_id();
    board.pending.push(TaskNode::simple(id, text));
    Some(id)
}

/// Append a pending group with no steps. Blank titles are ignored.
pub fn add_group(board: &mut Board, title: &str) -> Option<TaskId> {
    let title = clean_text(title)?;
    let id = board.next_task_id();
    board.pending.push(TaskNode::group(id, title));
    Some(id)
}

// ---------------------------------------------------------------------------
// State transitions
// ---------------------------------------------------------------------------

/// Flip a simple task between pending and done.
///
/// Completing stamps `completed_at = now`, files the task under its day and
/// adds one to `small`. Reverting clears the stamp, appends the task to the
/// pending list and takes one off `small`. Returns the new done state.
pub fn toggle_simple(board: &mut Board, id: TaskId, now: i64) -> Result<bool, StoreError> {
    let node = board.node(id).ok_or(StoreError::NotFound(id))?;
    if node.is_group() {
        return Err(StoreError::NotSimple(id));
    }
    let mut node = board.take(id).ok_or(StoreError::NotFound(id))?;
    if node.is_done() {
        node.completed_at = None;
        board.pending.push(node);
        board.stats.decrement_small();
        Ok(false)
    } else {
        node.completed_at = Some(now);
        board.archive(node);
        board.stats.increment_small();
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// Replace the text of a simple task or the title of a group.
///
/// Only pending tasks are editable; archived ones and blank text are ignored.
/// Returns whether anything changed.
pub fn edit_text(board: &mut Board, id: TaskId, text: &str) -> Result<bool, StoreError> {
    let node = board.node_mut(id).ok_or(StoreError::NotFound(id))?;
    if node.is_done() {
        return Ok(false);
    }
    let Some(text) = clean_text(text) else {
        return Ok(false);
    };
    let slot = match &mut node.kind {
        TaskKind::Simple { text } => text,
        TaskKind::Group { title, .. } => title,
    };
    if *slot == text {
        return Ok(false);
    }
    *slot = text;
    Ok(true)
}

/// Move a pending task to `to_index` in the pending list (clamped to the end).
pub fn move_pending(board: &mut Board, id: TaskId, to_index: usize) -> Result<bool, StoreError> {
    let from = match board.locate(id) {
        Some(Location::Pending(i)) => i,
        Some(Location::Done { .. }) => return Err(StoreError::NotPending(id)),
        None => return Err(StoreError::NotFound(id)),
    };
    let to = to_index.min(board.pending.len() - 1);
    if from == to {
        return Ok(false);
    }
    let node = board.pending.remove(from);
    board.pending.insert(to, node);
    Ok(true)
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Permanently remove a task from the pending list or the archive.
///
/// The tally is never touched: deleting finished work keeps its credit.
/// An archive bucket left empty is removed.
pub fn delete_node(board: &mut Board, id: TaskId) -> Result<TaskNode, StoreError> {
    board.take(id).ok_or(StoreError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stats;
    use crate::util::time::date_key;

    const T0: i64 = 1_741_348_800_000;

    #[test]
    fn add_simple_appends_pending() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "buy milk").unwrap();
        let b = add_simple(&mut board, "  call mom  ").unwrap();
        assert_eq!(board.pending.len(), 2);
        assert_eq!(board.pending[0].id, a);
        assert_eq!(board.pending[1].id, b);
        assert_eq!(board.pending[1].label(), "call mom");
        assert!(!board.pending[0].is_done());
    }

    #[test]
    fn blank_input_is_ignored() {
        let mut board = Board::new();
        assert!(add_simple(&mut board, "").is_none());
        assert!(add_simple(&mut board, "   \t ").is_none());
        assert!(add_group(&mut board, "\n").is_none());
        assert!(board.is_empty());
    }

    #[test]
    fn add_group_starts_empty() {
        let mut board = Board::new();
        let id = add_group(&mut board, "trip").unwrap();
        let node = board.node(id).unwrap();
        assert!(node.is_group());
        assert!(node.subtasks().is_empty());
        assert_eq!(node.label(), "trip");
    }

    #[test]
    fn toggle_simple_archives_and_counts() {
        let mut board = Board::new();
        let id = add_simple(&mut board, "buy milk").unwrap();
        assert!(toggle_simple(&mut board, id, T0).unwrap());

        assert!(board.pending.is_empty());
        assert_eq!(board.done.len(), 1);
        assert_eq!(board.done[0].key, date_key(T0));
        assert_eq!(board.done[0].tasks[0].completed_at, Some(T0));
        assert_eq!(board.stats, Stats { big: 0, small: 1 });
    }

    #[test]
    fn toggle_simple_twice_restamps_and_nets_zero() {
        let mut board = Board::new();
        let id = add_simple(&mut board, "buy milk").unwrap();
        toggle_simple(&mut board, id, T0).unwrap();
        assert!(!toggle_simple(&mut board, id, T0 + 10).unwrap());

        assert!(board.done.is_empty());
        assert_eq!(board.pending[0].completed_at, None);
        assert_eq!(board.stats.small, 0);

        assert!(toggle_simple(&mut board, id, T0 + 20).unwrap());
        assert_eq!(board.node(id).unwrap().completed_at, Some(T0 + 20));
        assert_eq!(board.stats.small, 1);
    }

    #[test]
    fn reverted_task_goes_to_end_of_pending() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "a").unwrap();
        add_simple(&mut board, "b").unwrap();
        toggle_simple(&mut board, a, T0).unwrap();
        toggle_simple(&mut board, a, T0 + 1).unwrap();
        let labels: Vec<&str> = board.pending.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }

    #[test]
    fn toggle_simple_rejects_group_and_unknown() {
        let mut board = Board::new();
        let g = add_group(&mut board, "trip").unwrap();
        assert_eq!(
            toggle_simple(&mut board, g, T0),
            Err(StoreError::NotSimple(g))
        );
        assert_eq!(
            toggle_simple(&mut board, TaskId(77), T0),
            Err(StoreError::NotFound(TaskId(77)))
        );
        assert!(board.is_pending(g));
    }

    #[test]
    fn delete_done_task_keeps_stats_and_drops_bucket() {
        let mut board = Board::new();
        let id = add_simple(&mut board, "buy milk").unwrap();
        toggle_simple(&mut board, id, T0).unwrap();

        let removed = delete_node(&mut board, id).unwrap();
        assert_eq!(removed.label(), "buy milk");
        assert!(board.done.is_empty());
        assert_eq!(board.stats.small, 1);
    }

    #[test]
    fn delete_keeps_other_bucket_members() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "a").unwrap();
        let b = add_simple(&mut board, "b").unwrap();
        toggle_simple(&mut board, a, T0).unwrap();
        toggle_simple(&mut board, b, T0 + 1).unwrap();
        delete_node(&mut board, a).unwrap();
        assert_eq!(board.done.len(), 1);
        assert_eq!(board.done[0].tasks[0].id, b);
    }

    #[test]
    fn delete_unknown_is_error() {
        let mut board = Board::new();
        assert_eq!(
            delete_node(&mut board, TaskId(3)).unwrap_err(),
            StoreError::NotFound(TaskId(3))
        );
    }

    #[test]
    fn edit_text_on_pending_only() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "draft").unwrap();
        let g = add_group(&mut board, "old title").unwrap();

        assert!(edit_text(&mut board, a, " final ").unwrap());
        assert_eq!(board.node(a).unwrap().label(), "final");
        assert!(edit_text(&mut board, g, "new title").unwrap());
        assert_eq!(board.node(g).unwrap().label(), "new title");

        assert!(!edit_text(&mut board, a, "   ").unwrap());
        assert!(!edit_text(&mut board, a, "final").unwrap());

        toggle_simple(&mut board, a, T0).unwrap();
        assert!(!edit_text(&mut board, a, "changed").unwrap());
        assert_eq!(board.node(a).unwrap().label(), "final");
    }

    #[test]
    fn move_pending_reorders_and_clamps() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "a").unwrap();
        add_simple(&mut board, "b").unwrap();
        add_simple(&mut board, "c").unwrap();

        assert!(move_pending(&mut board, a, 99).unwrap());
        let labels: Vec<&str> = board.pending.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["b", "c", "a"]);

        assert!(move_pending(&mut board, a, 0).unwrap());
        assert_eq!(board.pending[0].id, a);
        assert!(!move_pending(&mut board, a, 0).unwrap());
    }

    #[test]
    fn move_done_task_is_rejected() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "a").unwrap();
        toggle_simple(&mut board, a, T0).unwrap();
        assert_eq!(
            move_pending(&mut board, a, 0),
            Err(StoreError::NotPending(a))
        );
    }
}
