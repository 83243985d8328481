use serde::Serialize;

use crate::model::{Board, Stats, TaskKind, TaskNode};
use crate::ops::archive_ops::newest_first;
use crate::util::time::time_tag;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubtaskJson>,
}

#[derive(Serialize)]
pub struct SubtaskJson {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

#[derive(Serialize)]
pub struct BucketJson {
    pub date: String,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub pending: Vec<TaskJson>,
    /// Newest day first, newest task first within a day
    pub done: Vec<BucketJson>,
    pub stats: StatsJson,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub big: u64,
    pub small: u64,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(node: &TaskNode) -> TaskJson {
    let (kind, text, subtasks) = match &node.kind {
        TaskKind::Simple { text } => ("simple", text.clone(), Vec::new()),
        TaskKind::Group { title, subtasks } => (
            "group",
            title.clone(),
            subtasks
                .iter()
                .map(|s| SubtaskJson {
                    id: s.id.0,
                    text: s.text.clone(),
                    done: s.done,
                })
                .collect(),
        ),
    };
    TaskJson {
        id: node.id.0,
        kind,
        text,
        done: node.is_done(),
        completed_at: node.completed_at,
        time: node.completed_at.map(time_tag),
        subtasks,
    }
}

pub fn stats_to_json(stats: &Stats) -> StatsJson {
    StatsJson {
        big: stats.big,
        small: stats.small,
    }
}

pub fn board_to_json(board: &Board) -> ListJson {
    ListJson {
        pending: board.pending.iter().map(task_to_json).collect(),
        done: newest_first(board)
            .into_iter()
            .map(|(date, tasks)| BucketJson {
                date: date.to_string(),
                tasks: tasks.into_iter().map(task_to_json).collect(),
            })
            .collect(),
        stats: stats_to_json(&board.stats),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn check_char(done: bool) -> char {
    if done { 'x' } else { ' ' }
}

/// One line for the task, then one indented line per step
pub fn format_task(node: &TaskNode) -> Vec<String> {
    let time = node
        .completed_at
        .map(|ts| format!(" ({})", time_tag(ts)))
        .unwrap_or_default();
    let mut lines = match &node.kind {
        TaskKind::Simple { text } => vec![format!(
            "[{}] #{} {}{}",
            check_char(node.is_done()),
            node.id,
            text,
            time
        )],
        TaskKind::Group { title, subtasks } => {
            let done = subtasks.iter().filter(|s| s.done).count();
            vec![format!(
                "[{}] #{} {} [{}/{}]{}",
                check_char(node.is_done()),
                node.id,
                title,
                done,
                subtasks.len(),
                time
            )]
        }
    };
    for sub in node.subtasks() {
        lines.push(format!("    [{}] #{} {}", check_char(sub.done), sub.id, sub.text));
    }
    lines
}

pub fn format_stats(stats: &Stats) -> String {
    format!("groups: {}  items: {}", stats.big, stats.small)
}

/// The whole board: pending first, then the archive newest day first
pub fn format_board(board: &Board) -> Vec<String> {
    let mut lines = vec!["== Pending ==".to_string()];
    if board.pending.is_empty() {
        lines.push("(nothing to do)".to_string());
    }
    for node in &board.pending {
        lines.extend(format_task(node));
    }
    for (date, tasks) in newest_first(board) {
        lines.push(String::new());
        lines.push(format!("== {} ==", date));
        for node in tasks {
            lines.extend(format_task(node));
        }
    }
    lines.push(String::new());
    lines.push(format_stats(&board.stats));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::group_ops::{add_subtask, toggle_subtask};
    use crate::ops::task_ops::{add_group, add_simple, toggle_simple};
    use crate::util::time::date_key;
    use pretty_assertions::assert_eq;

    const T0: i64 = 1_741_348_800_000;

    #[test]
    fn group_line_shows_progress() {
        let mut board = Board::new();
        let g = add_group(&mut board, "trip").unwrap();
        let (s1, _) = add_subtask(&mut board, g, "pack", T0).unwrap().unwrap();
        add_subtask(&mut board, g, "book", T0).unwrap();
        toggle_subtask(&mut board, g, s1, T0).unwrap();

        let lines = format_task(&board.pending[0]);
        assert_eq!(lines[0], format!("[ ] #{} trip [1/2]", g));
        assert_eq!(lines[1], format!("    [x] #{} pack", s1));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn board_lists_archive_after_pending() {
        let mut board = Board::new();
        add_simple(&mut board, "open").unwrap();
        let done = add_simple(&mut board, "finished").unwrap();
        toggle_simple(&mut board, done, T0).unwrap();

        let lines = format_board(&board);
        assert_eq!(lines[0], "== Pending ==");
        assert!(lines[1].ends_with("open"));
        assert_eq!(lines[3], format!("== {} ==", date_key(T0)));
        assert!(lines[4].starts_with("[x]"));
        assert!(lines[4].ends_with(&format!("finished ({})", time_tag(T0))));
        assert_eq!(lines.last().unwrap(), "groups: 0  items: 1");
    }

    #[test]
    fn json_shape() {
        let mut board = Board::new();
        let id = add_simple(&mut board, "a").unwrap();
        toggle_simple(&mut board, id, T0).unwrap();
        let value = serde_json::to_value(board_to_json(&board)).unwrap();
        assert_eq!(value["pending"], serde_json::json!([]));
        assert_eq!(value["done"][0]["date"], date_key(T0));
        assert_eq!(value["done"][0]["tasks"][0]["type"], "simple");
        assert_eq!(value["done"][0]["tasks"][0]["completed_at"], T0);
        assert_eq!(value["stats"]["small"], 1);
    }
}
