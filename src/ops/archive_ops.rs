use crate::model::{Board, TaskNode};
use crate::ops::task_ops::StoreError;

/// Delete every archived task of one day, and the day itself.
/// The tally keeps its credit. Returns the removed tasks.
pub fn clear_bucket(board: &mut Board, key: &str) -> Result<Vec<TaskNode>, StoreError> {
    let idx = board
        .done
        .iter()
        .position(|b| b.key == key)
        .ok_or_else(|| StoreError::BucketNotFound(key.to_string()))?;
    Ok(board.done.remove(idx).tasks)
}

/// Archive buckets newest day first, each with its tasks newest first.
/// This is the order the archive is shown in.
pub fn newest_first(board: &Board) -> Vec<(&str, Vec<&TaskNode>)> {
    board
        .done
        .iter()
        .rev()
        .map(|b| (b.key.as_str(), b.tasks.iter().rev().collect()))
        .collect()
}
