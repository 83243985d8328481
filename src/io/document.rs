//! The persisted document: the whole board as one JSON record.
//!
//! ```text
//! { "pending": [ {type:"simple", id, text, completedAt:null, done:false}
//!              | {type:"group", id, title, subtasks:[{id, text, done}], completedAt:null, done:false} ],
//!   "done":    [ same shapes with done:true and completedAt:<epoch ms> ],
//!   "stats":   { "big": n, "small": n } }
//! ```
//!
//! Reading is lenient: items that do not parse are skipped, missing fields
//! take defaults, and only text that is not JSON at all is an error.
//! Documents written before ids were stored load with fresh ids.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{Board, Stats, Subtask, SubtaskId, TaskId, TaskKind, TaskNode};

/// Accept any JSON for an id; only a positive integer counts
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_u64()
        .filter(|&id| id != 0))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSubtask {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredTask {
    Simple {
        #[serde(
            default,
            deserialize_with = "lenient_id",
            skip_serializing_if = "Option::is_none"
        )]
        id: Option<u64>,
        #[serde(default)]
        text: String,
        #[serde(rename = "completedAt", default)]
        completed_at: Option<i64>,
        #[serde(default)]
        done: bool,
    },
    Group {
        #[serde(
            default,
            deserialize_with = "lenient_id",
            skip_serializing_if = "Option::is_none"
        )]
        id: Option<u64>,
        #[serde(default)]
        title: String,
        #[serde(default)]
        subtasks: Vec<StoredSubtask>,
        #[serde(rename = "completedAt", default)]
        completed_at: Option<i64>,
        #[serde(default)]
        done: bool,
    },
}

impl StoredTask {
    fn id(&self) -> Option<u64> {
        match self {
            StoredTask::Simple { id, .. } | StoredTask::Group { id, .. } => *id,
        }
    }

    fn subtask_ids(&self) -> impl Iterator<Item = u64> + '_ {
        let subtasks: &[StoredSubtask] = match self {
            StoredTask::Simple { .. } => &[],
            StoredTask::Group { subtasks, .. } => subtasks,
        };
        subtasks.iter().filter_map(|s| s.id)
    }

    fn completed_at(&self) -> Option<i64> {
        match self {
            StoredTask::Simple { completed_at, .. } | StoredTask::Group { completed_at, .. } => {
                *completed_at
            }
        }
    }
}

/// Counters as stored. Signed so that bad data can be clamped instead of rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredStats {
    #[serde(default)]
    pub big: i64,
    #[serde(default)]
    pub small: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub pending: Vec<StoredTask>,
    pub done: Vec<StoredTask>,
    pub stats: StoredStats,
}

/// Parse document text. Fails only when the text is not JSON.
pub fn parse_document(text: &str) -> Result<Document, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(document_from_value(&value))
}

/// Build a document from any JSON value, keeping whatever parses
pub fn document_from_value(value: &Value) -> Document {
    let items = |key: &str| -> Vec<StoredTask> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    };
    let stats = value
        .get("stats")
        .and_then(|s| serde_json::from_value(s.clone()).ok())
        .unwrap_or_default();
    Document {
        pending: items("pending"),
        done: items("done"),
        stats,
    }
}

fn store_task(node: &TaskNode, done: bool) -> StoredTask {
    match &node.kind {
        TaskKind::Simple { text } => StoredTask::Simple {
            id: Some(node.id.0),
            text: text.clone(),
            completed_at: node.completed_at,
            done,
        },
        TaskKind::Group { title, subtasks } => StoredTask::Group {
            id: Some(node.id.0),
            title: title.clone(),
            subtasks: subtasks
                .iter()
                .map(|s| StoredSubtask {
                    id: Some(s.id.0),
                    text: s.text.clone(),
                    done: s.done,
                })
                .collect(),
            completed_at: node.completed_at,
            done,
        },
    }
}

/// Snapshot the whole board
pub fn to_document(board: &Board) -> Document {
    Document {
        pending: board.pending.iter().map(|t| store_task(t, false)).collect(),
        done: board.done_tasks().map(|t| store_task(t, true)).collect(),
        stats: StoredStats {
            big: i64::try_from(board.stats.big).unwrap_or(i64::MAX),
            small: i64::try_from(board.stats.small).unwrap_or(i64::MAX),
        },
    }
}

/// Ids already handed out while loading one document
struct IdClaims {
    used: HashSet<u64>,
}

impl IdClaims {
    /// Keep the stored id unless it is missing or already taken
    fn claim(&mut self, board: &mut Board, stored: Option<u64>) -> u64 {
        match stored {
            Some(id) if self.used.insert(id) => id,
            _ => {
                let id = board.next_task_id().0;
                self.used.insert(id);
                id
            }
        }
    }
}

fn restore_task(
    board: &mut Board,
    claims: &mut IdClaims,
    stored: StoredTask,
    completed_at: Option<i64>,
) -> TaskNode {
    let id = TaskId(claims.claim(board, stored.id()));
    let kind = match stored {
        StoredTask::Simple { text, .. } => TaskKind::Simple { text },
        StoredTask::Group {
            title, subtasks, ..
        } => TaskKind::Group {
            title,
            subtasks: subtasks
                .into_iter()
                .map(|s| Subtask {
                    id: SubtaskId(claims.claim(board, s.id)),
                    text: s.text,
                    done: s.done,
                })
                .collect(),
        },
    };
    TaskNode {
        id,
        kind,
        completed_at,
    }
}

/// Rebuild a board from a document.
///
/// Pending items come back not done, in stored order. Done items are sorted
/// by ascending completion time and filed under their day; an item with no
/// (or a zero) completion time is stamped with `now`.
///
/// Stored ids are kept. Items without one (or with a duplicate) get a fresh
/// id above every stored id, handed out in load order, so loading the same
/// document twice yields the same ids.
pub fn from_document(doc: Document, now: i64) -> Board {
    let highest = doc
        .pending
        .iter()
        .chain(&doc.done)
        .flat_map(|t| t.id().into_iter().chain(t.subtask_ids()))
        .max()
        .unwrap_or(0);
    let mut board = Board::new();
    board.reserve_ids(highest);
    let mut claims = IdClaims {
        used: HashSet::new(),
    };

    for stored in doc.pending {
        let node = restore_task(&mut board, &mut claims, stored, None);
        board.pending.push(node);
    }

    let mut done = doc.done;
    done.sort_by_key(|t| t.completed_at().unwrap_or(0));
    for stored in done {
        let ts = stored.completed_at().filter(|&t| t != 0).unwrap_or(now);
        let node = restore_task(&mut board, &mut claims, stored, Some(ts));
        board.archive(node);
    }

    board.stats = Stats {
        big: u64::try_from(doc.stats.big).unwrap_or(0),
        small: u64::try_from(doc.stats.small).unwrap_or(0),
    };
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use crate::ops::group_ops::{add_subtask, toggle_subtask};
    use crate::ops::task_ops::{add_group, add_simple, toggle_simple};
    use crate::util::time::date_key;
    use pretty_assertions::assert_eq;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const T0: i64 = 1_741_348_800_000;

    #[test]
    fn serialized_shape() {
        let mut board = Board::new();
        add_simple(&mut board, "buy milk").unwrap();
        let g = add_group(&mut board, "trip").unwrap();
        add_subtask(&mut board, g, "pack", T0).unwrap();
        let done = add_simple(&mut board, "call mom").unwrap();
        toggle_simple(&mut board, done, T0).unwrap();

        let json = serde_json::to_string_pretty(&to_document(&board)).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "pending": [
            {
              "type": "simple",
              "id": 1,
              "text": "buy milk",
              "completedAt": null,
              "done": false
            },
            {
              "type": "group",
              "id": 2,
              "title": "trip",
              "subtasks": [
                {
                  "id": 3,
                  "text": "pack",
                  "done": false
                }
              ],
              "completedAt": null,
              "done": false
            }
          ],
          "done": [
            {
              "type": "simple",
              "id": 4,
              "text": "call mom",
              "completedAt": 1741348800000,
              "done": true
            }
          ],
          "stats": {
            "big": 0,
            "small": 1
          }
        }
        "#);
    }

    #[test]
    fn round_trip_preserves_order_buckets_and_stats() {
        let mut board = Board::new();
        add_simple(&mut board, "first").unwrap();
        let g = add_group(&mut board, "trip").unwrap();
        let (a, _) = add_subtask(&mut board, g, "pack", T0).unwrap().unwrap();
        add_subtask(&mut board, g, "book", T0).unwrap();
        toggle_subtask(&mut board, g, a, T0).unwrap();
        add_simple(&mut board, "third").unwrap();
        for (text, at) in [("x", T0 + 2 * DAY_MS), ("y", T0), ("z", T0 + 60_000)] {
            let id = add_simple(&mut board, text).unwrap();
            toggle_simple(&mut board, id, at).unwrap();
        }

        let text = serde_json::to_string(&to_document(&board)).unwrap();
        let loaded = from_document(parse_document(&text).unwrap(), T0 + 9 * DAY_MS);

        let labels = |b: &Board| -> Vec<String> {
            b.pending.iter().map(|t| t.label().to_string()).collect()
        };
        assert_eq!(labels(&loaded), labels(&board));
        assert_eq!(loaded.pending[1].subtasks().len(), 2);
        assert!(loaded.pending[1].subtasks()[0].done);
        assert!(!loaded.pending[1].subtasks()[1].done);

        let buckets = |b: &Board| -> Vec<(String, Vec<(String, Option<i64>)>)> {
            b.done
                .iter()
                .map(|bk| {
                    (
                        bk.key.clone(),
                        bk.tasks
                            .iter()
                            .map(|t| (t.label().to_string(), t.completed_at))
                            .collect(),
                    )
                })
                .collect()
        };
        assert_eq!(buckets(&loaded), buckets(&board));
        assert_eq!(loaded.stats, board.stats);
    }

    #[test]
    fn done_items_sorted_before_bucketing() {
        let text = format!(
            r#"{{"pending":[],"done":[
                {{"type":"simple","text":"late","completedAt":{late},"done":true}},
                {{"type":"simple","text":"early","completedAt":{early},"done":true}}
            ],"stats":{{"big":0,"small":2}}}}"#,
            late = T0 + 1_000,
            early = T0
        );
        let board = from_document(parse_document(&text).unwrap(), T0);
        let labels: Vec<&str> = board.done[0].tasks.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["early", "late"]);
        // ids follow the sorted order
        assert!(board.done[0].tasks[0].id < board.done[0].tasks[1].id);
    }

    #[test]
    fn missing_completion_time_is_stamped_with_now() {
        let text = r#"{"pending":[],"done":[{"type":"simple","text":"old"}]}"#;
        let board = from_document(parse_document(text).unwrap(), T0 + 5 * DAY_MS);
        assert_eq!(board.done[0].key, date_key(T0 + 5 * DAY_MS));
        assert_eq!(board.done[0].tasks[0].completed_at, Some(T0 + 5 * DAY_MS));
    }

    #[test]
    fn pending_items_lose_stale_completion_times() {
        let text = r#"{"pending":[{"type":"simple","text":"a","completedAt":5,"done":true}],"done":[]}"#;
        let board = from_document(parse_document(text).unwrap(), T0);
        assert_eq!(board.pending[0].completed_at, None);
        assert!(matches!(
            board.locate(board.pending[0].id),
            Some(Location::Pending(0))
        ));
    }

    #[test]
    fn lenient_about_bad_items_and_stats() {
        let text = r#"{
            "pending": [
                {"type":"simple","text":"keep"},
                {"type":"mystery","text":"skip"},
                42,
                {"type":"group","title":"g","subtasks":[{"text":"s"}]},
                {"type":"simple"}
            ],
            "stats": {"big": -3, "small": 7}
        }"#;
        let board = from_document(parse_document(text).unwrap(), T0);
        let labels: Vec<&str> = board.pending.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["keep", "g", ""]);
        assert!(!board.pending[1].subtasks()[0].done);
        assert!(board.done.is_empty());
        assert_eq!(board.stats, Stats { big: 0, small: 7 });
    }

    #[test]
    fn stored_ids_survive_reordering() {
        let mut board = Board::new();
        let a = add_simple(&mut board, "a").unwrap();
        let b = add_simple(&mut board, "b").unwrap();
        let g = add_group(&mut board, "g").unwrap();
        let (step, _) = add_subtask(&mut board, g, "step", T0).unwrap().unwrap();

        // Finishing "a" moves it behind everything else in the document
        toggle_simple(&mut board, a, T0).unwrap();
        let text = serde_json::to_string(&to_document(&board)).unwrap();
        let mut loaded = from_document(parse_document(&text).unwrap(), T0);

        assert_eq!(loaded.node(a).unwrap().label(), "a");
        assert!(loaded.node(a).unwrap().is_done());
        assert_eq!(loaded.node(b).unwrap().label(), "b");
        assert_eq!(loaded.node(g).unwrap().subtask(step).unwrap().text, "step");

        // New ids continue above the stored ones
        let fresh = add_simple(&mut loaded, "c").unwrap();
        assert!(fresh.0 > step.0);
    }

    #[test]
    fn missing_and_duplicate_ids_get_fresh_ones() {
        let text = r#"{"pending":[
            {"type":"simple","id":7,"text":"kept"},
            {"type":"simple","text":"legacy"},
            {"type":"simple","id":7,"text":"copy"},
            {"type":"group","id":"x","title":"g","subtasks":[{"id":9,"text":"s"},{"text":"t"}]}
        ],"done":[]}"#;
        let board = from_document(parse_document(text).unwrap(), T0);
        let ids: Vec<u64> = board.pending.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![7, 10, 11, 12]);
        let steps: Vec<u64> = board.pending[3].subtasks().iter().map(|s| s.id.0).collect();
        assert_eq!(steps, vec![9, 13]);

        // Same document, same ids
        let again = from_document(parse_document(text).unwrap(), T0);
        let again_ids: Vec<u64> = again.pending.iter().map(|t| t.id.0).collect();
        assert_eq!(again_ids, ids);
    }

    #[test]
    fn missing_keys_yield_empty_board() {
        let board = from_document(parse_document("{}").unwrap(), T0);
        assert!(board.is_empty());
        assert_eq!(board.stats, Stats::default());
    }

    #[test]
    fn non_json_is_an_error() {
        assert!(parse_document("not json {{{").is_err());
    }
}
