use crate::model::{SubtaskId, TaskId};
use crate::ops::task_ops::clean_text;
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary};

/// What a text entry will change once committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    NewSimple,
    NewGroup,
    NewSubtask { group: TaskId },
    Task(TaskId),
    Subtask { group: TaskId, sub: SubtaskId },
}

/// One in-progress text entry.
///
/// A session ends exactly once: whichever of `commit` or `cancel` runs first
/// wins, and every later call is a no-op. Losing focus and pressing Enter in
/// the same tick therefore cannot save twice.
#[derive(Debug, Clone)]
pub struct EditSession {
    pub target: EditTarget,
    pub buffer: String,
    /// Byte offset of the cursor in `buffer`
    pub cursor: usize,
    finished: bool,
}

impl EditSession {
    pub fn new(target: EditTarget, initial: &str) -> Self {
        EditSession {
            target,
            buffer: initial.to_string(),
            cursor: initial.len(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// End the session and hand out the trimmed text, if any.
    /// Returns `None` when already finished or when the text is blank.
    pub fn commit(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        self.finished = true;
        clean_text(&self.buffer)
    }

    /// End the session without saving. Returns whether this call ended it.
    pub fn cancel(&mut self) -> bool {
        if self.finished {
            return false;
        }
        self.finished = true;
        true
    }

    pub fn insert(&mut self, c: char) {
        if self.finished {
            return;
        }
        self.buffer.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete the grapheme before the cursor
    pub fn backspace(&mut self) {
        if self.finished {
            return;
        }
        if let Some(prev) = prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.buffer.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = prev_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = next_grapheme_boundary(&self.buffer, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_runs_once() {
        let mut s = EditSession::new(EditTarget::NewSimple, "  buy milk ");
        assert_eq!(s.commit(), Some("buy milk".to_string()));
        assert_eq!(s.commit(), None);
        assert!(!s.cancel());
        assert!(s.is_finished());
    }

    #[test]
    fn cancel_then_commit_saves_nothing() {
        let mut s = EditSession::new(EditTarget::Task(TaskId(1)), "draft");
        assert!(s.cancel());
        assert_eq!(s.commit(), None);
    }

    #[test]
    fn blank_commit_finishes_without_text() {
        let mut s = EditSession::new(EditTarget::NewGroup, "   ");
        assert_eq!(s.commit(), None);
        assert!(s.is_finished());
    }

    #[test]
    fn typing_and_backspace_respect_graphemes() {
        let mut s = EditSession::new(EditTarget::NewSimple, "");
        for c in "买牛奶".chars() {
            s.insert(c);
        }
        s.backspace();
        assert_eq!(s.buffer, "买牛");
        s.move_left();
        s.insert('x');
        assert_eq!(s.buffer, "买x牛");
        s.move_home();
        s.backspace();
        assert_eq!(s.buffer, "买x牛");
        s.move_end();
        assert_eq!(s.cursor, s.buffer.len());
    }

    #[test]
    fn finished_session_ignores_input() {
        let mut s = EditSession::new(EditTarget::NewSimple, "a");
        s.cancel();
        s.insert('b');
        s.backspace();
        assert_eq!(s.buffer, "a");
    }
}
