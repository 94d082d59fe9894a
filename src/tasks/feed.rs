//! The document a task source yields, decoded record by record.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::model::{Member, Project, Space, Task};
use crate::error::SourceError;

/// Everything the aggregator needs from a task source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFeed {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub spaces: Vec<Space>,
    /// Records dropped while decoding because they were malformed.
    #[serde(default)]
    pub skipped_records: usize,
}

impl TaskFeed {
    /// Build a feed from tasks alone.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Default::default()
        }
    }

    /// Decode a JSON document: either a bare array of tasks or an object with
    /// `tasks`, `members`, `projects` and `spaces` arrays.
    ///
    /// Each record is decoded on its own. A malformed record is skipped and
    /// counted; only a document that is not JSON at all is an error.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SourceError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, SourceError> {
        let mut feed = TaskFeed::default();
        match value {
            Value::Array(records) => {
                feed.tasks = decode_records(records, "task", &mut feed.skipped_records);
            }
            Value::Object(mut doc) => {
                feed.tasks = decode_records(
                    take_array(&mut doc, "tasks"),
                    "task",
                    &mut feed.skipped_records,
                );
                feed.members = decode_records(
                    take_array(&mut doc, "members"),
                    "member",
                    &mut feed.skipped_records,
                );
                feed.projects = decode_records(
                    take_array(&mut doc, "projects"),
                    "project",
                    &mut feed.skipped_records,
                );
                feed.spaces = decode_records(
                    take_array(&mut doc, "spaces"),
                    "space",
                    &mut feed.skipped_records,
                );
            }
            other => {
                return Err(SourceError::Parse(format!(
                    "expected an array or object, got {}",
                    json_kind(&other)
                )));
            }
        }

        debug!(
            tasks = feed.tasks.len(),
            members = feed.members.len(),
            projects = feed.projects.len(),
            spaces = feed.spaces.len(),
            skipped = feed.skipped_records,
            "Decoded task feed"
        );
        Ok(feed)
    }

    /// Distinct status labels seen on tasks.
    pub fn statuses(&self) -> BTreeSet<String> {
        self.tasks.iter().filter_map(|t| t.status.clone()).collect()
    }

    /// Known members: the roster plus anyone assigned to a task.
    pub fn member_names(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .map(|m| m.username.clone())
            .chain(self.tasks.iter().flat_map(|t| t.assignees.iter().cloned()))
            .collect()
    }

    /// Known spaces: declared spaces, project spaces and task spaces.
    pub fn space_ids(&self) -> BTreeSet<String> {
        self.spaces
            .iter()
            .map(|s| s.id.clone())
            .chain(self.projects.iter().map(|p| p.space_id.clone()))
            .chain(self.tasks.iter().filter_map(|t| t.space_id.clone()))
            .collect()
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }
}

fn take_array(doc: &mut serde_json::Map<String, Value>, key: &str) -> Vec<Value> {
    match doc.remove(key) {
        Some(Value::Array(records)) => records,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(key, kind = json_kind(&other), "Expected an array in task feed, ignoring");
            Vec::new()
        }
    }
}

fn decode_records<T: DeserializeOwned>(
    records: Vec<Value>,
    kind: &str,
    skipped: &mut usize,
) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<T>(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(kind, index, error = %e, "Skipping malformed record");
                *skipped += 1;
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_task_array() {
        let feed = TaskFeed::from_json(
            r#"[{"id": "t1", "name": "one"}, {"id": "t2", "name": "two"}]"#,
        )
        .unwrap();
        assert_eq!(feed.tasks.len(), 2);
        assert_eq!(feed.skipped_records, 0);
    }

    #[test]
    fn skips_malformed_records_without_failing() {
        let feed = TaskFeed::from_json(
            r#"{
                "tasks": [
                    {"id": "t1", "name": "ok"},
                    {"name": "no id"},
                    42,
                    {"id": "t2", "name": "ok too", "status": "to do"}
                ],
                "members": [{"username": "alice"}, {"nope": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(feed.tasks.len(), 2);
        assert_eq!(feed.members.len(), 1);
        assert_eq!(feed.skipped_records, 3);
    }

    #[test]
    fn odd_time_estimates_keep_the_task() {
        let feed = TaskFeed::from_json(
            r#"[
                {"id": "t1", "name": "a", "status": "to do", "assignees": ["A"], "space_id": "s1", "time_estimate": 90.5},
                {"id": "t2", "name": "b", "status": "to do", "assignees": ["A"], "space_id": "s1", "time_estimate": -30},
                {"id": "t3", "name": "c", "status": "to do", "assignees": ["A"], "space_id": "s1", "time_estimate": 30}
            ]"#,
        )
        .unwrap();
        assert_eq!(feed.tasks.len(), 3);
        assert_eq!(feed.skipped_records, 0);
        let estimates: Vec<Option<u64>> = feed.tasks.iter().map(|t| t.time_estimate).collect();
        assert_eq!(estimates, vec![Some(91), None, Some(30)]);
    }

    #[test]
    fn rejects_non_document() {
        assert!(matches!(
            TaskFeed::from_json("\"just a string\""),
            Err(SourceError::Parse(_))
        ));
        assert!(matches!(TaskFeed::from_json("{not json"), Err(SourceError::Parse(_))));
    }

    #[test]
    fn non_array_section_is_ignored() {
        let feed = TaskFeed::from_json(r#"{"tasks": {"id": "t1"}, "spaces": null}"#).unwrap();
        assert!(feed.tasks.is_empty());
        assert!(feed.spaces.is_empty());
    }

    #[test]
    fn collects_known_keys() {
        let feed = TaskFeed::from_json(
            r#"{
                "tasks": [
                    {"id": "t1", "name": "a", "status": "to do", "assignees": ["bob"], "space_id": "s2"},
                    {"id": "t2", "name": "b", "status": "complete", "assignees": ["alice"]}
                ],
                "members": [{"username": "carol"}],
                "projects": [{"id": "p1", "name": "Web", "space_id": "s1"}],
                "spaces": [{"id": "s3", "name": "Ops"}]
            }"#,
        )
        .unwrap();

        let statuses: Vec<_> = feed.statuses().into_iter().collect();
        assert_eq!(statuses, vec!["complete", "to do"]);

        let members: Vec<_> = feed.member_names().into_iter().collect();
        assert_eq!(members, vec!["alice", "bob", "carol"]);

        let spaces: Vec<_> = feed.space_ids().into_iter().collect();
        assert_eq!(spaces, vec!["s1", "s2", "s3"]);

        assert_eq!(feed.project("p1").map(|p| p.name.as_str()), Some("Web"));
        assert!(feed.project("p9").is_none());
    }
}
