use std::fmt;

/// Identifier of a top-level task (simple or group)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Identifier of a subtask inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubtaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A step inside a group task. Owned by its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    pub id: SubtaskId,
    pub text: String,
    pub done: bool,
}

/// The two shapes a task can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// A single line item
    Simple { text: String },
    /// A titled list of steps; completes when every step is done
    Group { title: String, subtasks: Vec<Subtask> },
}

/// A task on the board, either pending or archived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub id: TaskId,
    pub kind: TaskKind,
    /// Epoch milliseconds of the last transition to done.
    /// `Some` exactly while the node sits in the archive.
    pub completed_at: Option<i64>,
}

impl TaskNode {
    pub fn simple(id: TaskId, text: String) -> Self {
        TaskNode {
            id,
            kind: TaskKind::Simple { text },
            completed_at: None,
        }
    }

    pub fn group(id: TaskId, title: String) -> Self {
        TaskNode {
            id,
            kind: TaskKind::Group {
                title,
                subtasks: Vec::new(),
            },
            completed_at: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, TaskKind::Group { .. })
    }

    /// The text of a simple task or the title of a group
    pub fn label(&self) -> &str {
        match &self.kind {
            TaskKind::Simple { text } => text,
            TaskKind::Group { title, .. } => title,
        }
    }

    pub fn subtasks(&self) -> &[Subtask] {
        match &self.kind {
            TaskKind::Simple { .. } => &[],
            TaskKind::Group { subtasks, .. } => subtasks,
        }
    }

    pub fn subtasks_mut(&mut self) -> Option<&mut Vec<Subtask>> {
        match &mut self.kind {
            TaskKind::Simple { .. } => None,
            TaskKind::Group { subtasks, .. } => Some(subtasks),
        }
    }

    pub fn subtask(&self, sub: SubtaskId) -> Option<&Subtask> {
        self.subtasks().iter().find(|s| s.id == sub)
    }

    /// True when the group has at least one step and all steps are done.
    /// Always false for simple tasks and empty groups.
    pub fn all_subtasks_done(&self) -> bool {
        let subs = self.subtasks();
        !subs.is_empty() && subs.iter().all(|s| s.done)
    }
}
