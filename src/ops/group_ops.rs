use crate::model::{Board, Subtask, SubtaskId, TaskId, TaskNode};
use crate::ops::task_ops::{StoreError, clean_text};

/// What a group re-evaluation did to the group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChange {
    /// Placement already matched its steps (or the group has no steps)
    Unchanged,
    /// Every step done: moved from pending to the archive
    Promoted,
    /// A step reopened: moved from the archive back to pending
    Demoted,
}

/// Result of toggling one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskToggle {
    /// New state of the step
    pub done: bool,
    pub group: GroupChange,
}

fn group_mut(board: &mut Board, group: TaskId) -> Result<&mut Vec<Subtask>, StoreError> {
    board
        .node_mut(group)
        .ok_or(StoreError::NotFound(group))?
        .subtasks_mut()
        .ok_or(StoreError::NotGroup(group))
}

/// Append a not-done step to a group, then re-evaluate the group.
/// Blank text is ignored and leaves the board untouched.
pub fn add_subtask(
    board: &mut Board,
    group: TaskId,
    text: &str,
    now: i64,
) -> Result<Option<(SubtaskId, GroupChange)>, StoreError> {
    group_mut(board, group)?;
    let Some(text) = clean_text(text) else {
        return Ok(None);
    };
    let id = board.next_subtask_id();
    group_mut(board, group)?.push(Subtask {
        id,
        text,
        done: false,
    });
    let change = evaluate_group_status(board, group, now)?;
    Ok(Some((id, change)))
}

/// Flip one step. The `small` tally follows the step itself; any group
/// promotion or demotion that results only touches `big`.
pub fn toggle_subtask(
    board: &mut Board,
    group: TaskId,
    sub: SubtaskId,
    now: i64,
) -> Result<SubtaskToggle, StoreError> {
    let step = group_mut(board, group)?
        .iter_mut()
        .find(|s| s.id == sub)
        .ok_or(StoreError::SubtaskNotFound { group, sub })?;
    step.done = !step.done;
    let done = step.done;

    if done {
        board.stats.increment_small();
    } else {
        board.stats.decrement_small();
    }
    let change = evaluate_group_status(board, group, now)?;
    Ok(SubtaskToggle {
        done,
        group: change,
    })
}

/// Delete one step without touching the tally, then re-evaluate the group.
pub fn remove_subtask(
    board: &mut Board,
    group: TaskId,
    sub: SubtaskId,
    now: i64,
) -> Result<GroupChange, StoreError> {
    let subs = group_mut(board, group)?;
    let idx = subs
        .iter()
        .position(|s| s.id == sub)
        .ok_or(StoreError::SubtaskNotFound { group, sub })?;
    subs.remove(idx);
    evaluate_group_status(board, group, now)
}

/// Replace a step's text. Only steps of pending groups are editable;
/// blank text is ignored. Returns whether anything changed.
pub fn edit_subtask(
    board: &mut Board,
    group: TaskId,
    sub: SubtaskId,
    text: &str,
) -> Result<bool, StoreError> {
    let node = board.node_mut(group).ok_or(StoreError::NotFound(group))?;
    let archived = node.is_done();
    let step = node
        .subtasks_mut()
        .ok_or(StoreError::NotGroup(group))?
        .iter_mut()
        .find(|s| s.id == sub)
        .ok_or(StoreError::SubtaskNotFound { group, sub })?;
    if archived {
        return Ok(false);
    }
    let Some(text) = clean_text(text) else {
        return Ok(false);
    };
    if step.text == text {
        return Ok(false);
    }
    step.text = text;
    Ok(true)
}

/// Bring a group's placement in line with its steps.
///
/// A pending group whose steps are all done (and which has at least one)
/// is stamped with `now`, archived and earns one `big`. An archived group
/// with an open step goes back to the end of the pending list and loses one
/// `big` (never below zero). A group with no steps never moves.
pub fn evaluate_group_status(
    board: &mut Board,
    group: TaskId,
    now: i64,
) -> Result<GroupChange, StoreError> {
    let node = board.node(group).ok_or(StoreError::NotFound(group))?;
    if !node.is_group() {
        return Err(StoreError::NotGroup(group));
    }
    if node.subtasks().is_empty() {
        return Ok(GroupChange::Unchanged);
    }
    let complete = node.all_subtasks_done();
    let archived = node.is_done();

    if complete && !archived {
        let mut node = take(board, group)?;
        node.completed_at = Some(now);
        board.archive(node);
        board.stats.increment_big();
        tracing::debug!(group = %group, "group completed");
        Ok(GroupChange::Promoted)
    } else if !complete && archived {
        let mut node = take(board, group)?;
        node.completed_at = None;
        board.pending.push(node);
        board.stats.decrement_big();
        tracing::debug!(group = %group, "group reopened");
        Ok(GroupChange::Demoted)
    } else {
        Ok(GroupChange::Unchanged)
    }
}

fn take(board: &mut Board, id: TaskId) -> Result<TaskNode, StoreError> {
    board.take(id).ok_or(StoreError::NotFound(id))
}
