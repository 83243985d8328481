use super::stats::Stats;
use super::task::{SubtaskId, TaskId, TaskNode};
use crate::util::time::date_key;

/// All archived tasks completed on one local calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBucket {
    /// Formatted day, e.g. `2025年03月07日`. Bucket identity.
    pub key: String,
    /// Tasks in ascending `completed_at` order
    pub tasks: Vec<TaskNode>,
}

/// Where a task currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Index into the pending list
    Pending(usize),
    /// Bucket index and index inside the bucket
    Done { bucket: usize, index: usize },
}

/// The whole application state: pending work, the dated archive and the tally
#[derive(Debug, Clone, Default)]
pub struct Board {
    /// Pending tasks in user order
    pub pending: Vec<TaskNode>,
    /// Archive buckets in ascending day order
    pub done: Vec<DateBucket>,
    pub stats: Stats,
    next_id: u64,
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn next_task_id(&mut self) -> TaskId {
        self.next_id += 1;
        TaskId(self.next_id)
    }

    pub fn next_subtask_id(&mut self) -> SubtaskId {
        self.next_id += 1;
        SubtaskId(self.next_id)
    }

    /// Make sure ids handed out from now on are above `highest`
    pub fn reserve_ids(&mut self, highest: u64) {
        self.next_id = self.next_id.max(highest);
    }

    pub fn locate(&self, id: TaskId) -> Option<Location> {
        if let Some(i) = self.pending.iter().position(|t| t.id == id) {
            return Some(Location::Pending(i));
        }
        for (b, bucket) in self.done.iter().enumerate() {
            if let Some(i) = bucket.tasks.iter().position(|t| t.id == id) {
                return Some(Location::Done {
                    bucket: b,
                    index: i,
                });
            }
        }
        None
    }

    pub fn node(&self, id: TaskId) -> Option<&TaskNode> {
        match self.locate(id)? {
            Location::Pending(i) => self.pending.get(i),
            Location::Done { bucket, index } => self.done.get(bucket)?.tasks.get(index),
        }
    }

    pub fn node_mut(&mut self, id: TaskId) -> Option<&mut TaskNode> {
        match self.locate(id)? {
            Location::Pending(i) => self.pending.get_mut(i),
            Location::Done { bucket, index } => self.done.get_mut(bucket)?.tasks.get_mut(index),
        }
    }

    /// Remove a task from wherever it lives. A bucket left empty is dropped.
    pub fn take(&mut self, id: TaskId) -> Option<TaskNode> {
        match self.locate(id)? {
            Location::Pending(i) => Some(self.pending.remove(i)),
            Location::Done { bucket, index } => {
                let node = self.done[bucket].tasks.remove(index);
                if self.done[bucket].tasks.is_empty() {
                    self.done.remove(bucket);
                }
                Some(node)
            }
        }
    }

    /// File a done task under the bucket for its completion day,
    /// creating the bucket if this is the first task of that day.
    /// The node must carry `completed_at`.
    pub fn archive(&mut self, node: TaskNode) {
        let Some(ts) = node.completed_at else {
            self.pending.push(node);
            return;
        };
        let key = date_key(ts);
        let b = match self.done.iter().position(|bk| bk.key == key) {
            Some(b) => b,
            None => {
                let pos = self
                    .done
                    .iter()
                    .position(|bk| bk.key > key)
                    .unwrap_or(self.done.len());
                self.done.insert(
                    pos,
                    DateBucket {
                        key,
                        tasks: Vec::new(),
                    },
                );
                pos
            }
        };
        let tasks = &mut self.done[b].tasks;
        let idx = tasks
            .iter()
            .position(|t| t.completed_at.is_some_and(|c| c > ts))
            .unwrap_or(tasks.len());
        tasks.insert(idx, node);
    }

    pub fn bucket(&self, key: &str) -> Option<&DateBucket> {
        self.done.iter().find(|b| b.key == key)
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        matches!(self.locate(id), Some(Location::Pending(_)))
    }

    /// All archived tasks, oldest bucket first
    pub fn done_tasks(&self) -> impl Iterator<Item = &TaskNode> {
        self.done.iter().flat_map(|b| b.tasks.iter())
    }

    pub fn done_count(&self) -> usize {
        self.done.iter().map(|b| b.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.done.is_empty()
    }
}
