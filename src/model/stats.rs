use serde::{Deserialize, Serialize};

/// Running tally of completed work.
///
/// `big` counts completed groups, `small` counts completed simple tasks and
/// completed subtasks. The counters are not derived from the board: deleting
/// archived tasks keeps the credit, and resetting the tally keeps the tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub big: u64,
    pub small: u64,
}

impl Stats {
    pub fn increment_big(&mut self) {
        self.big += 1;
    }

    pub fn increment_small(&mut self) {
        self.small += 1;
    }

    /// Decrement `big`, never below zero
    pub fn decrement_big(&mut self) {
        self.big = self.big.saturating_sub(1);
    }

    /// Decrement `small`, never below zero
    pub fn decrement_small(&mut self) {
        self.small = self.small.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        *self = Stats::default();
    }
}
