use std::path::PathBuf;

use crate::model::{TaskId, TaskNode, UiConfig};

/// A destructive action waiting for the user's yes/no
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteTask {
        id: TaskId,
        label: String,
        group: bool,
    },
    ClearBucket {
        key: String,
    },
    ResetStats,
    Import {
        path: PathBuf,
    },
}

impl ConfirmAction {
    pub fn delete(node: &TaskNode) -> Self {
        ConfirmAction::DeleteTask {
            id: node.id,
            label: node.label().to_string(),
            group: node.is_group(),
        }
    }

    /// The question shown to the user
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::DeleteTask { label, group, .. } => {
                if *group {
                    format!("Delete group \"{}\"?", label)
                } else {
                    format!("Delete task \"{}\"?", label)
                }
            }
            ConfirmAction::ClearBucket { key } => format!("Clear all records for {}?", key),
            ConfirmAction::ResetStats => "Reset the tally to zero?".to_string(),
            ConfirmAction::Import { path } => format!(
                "Replace all tasks and the tally with {}?",
                path.display()
            ),
        }
    }
}

/// Holds at most one requested action until it is confirmed or cancelled.
///
/// `confirm` hands the action out exactly once; a repeated confirm (or a
/// confirm after cancel) yields nothing.
#[derive(Debug, Default)]
pub struct PendingConfirm {
    action: Option<ConfirmAction>,
}

impl PendingConfirm {
    /// Ask for confirmation, replacing any earlier unanswered request
    pub fn request(&mut self, action: ConfirmAction) {
        self.action = Some(action);
    }

    pub fn current(&self) -> Option<&ConfirmAction> {
        self.action.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.action.is_some()
    }

    pub fn confirm(&mut self) -> Option<ConfirmAction> {
        self.action.take()
    }

    pub fn cancel(&mut self) {
        self.action = None;
    }
}

/// Whether deleting this task goes through a confirmation step.
/// Pending tasks always ask; archived ones only when configured to.
pub fn delete_needs_confirm(node: &TaskNode, ui: &UiConfig) -> bool {
    !node.is_done() || ui.confirm_done_delete
}
