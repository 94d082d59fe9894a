//! Task data model: tasks, priorities, members, projects and spaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Task priority. Unknown labels decode as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Display color used by the dashboard when the source omits one.
    pub fn default_color(&self) -> &'static str {
        match self {
            Self::Urgent => "#f50000",
            Self::High => "#ffcc00",
            Self::Normal => "#6fddff",
            Self::Low => "#d8d8d8",
        }
    }
}

impl From<String> for Priority {
    fn from(label: String) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "urgent" => Self::Urgent,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Normal,
        }
    }
}

/// Priority as delivered by the task source: a level plus a display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPriority {
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TaskPriority {
    pub fn new(priority: Priority) -> Self {
        Self {
            priority,
            color: None,
        }
    }

    pub fn color(&self) -> &str {
        self.color
            .as_deref()
            .unwrap_or_else(|| self.priority.default_color())
    }
}

/// A single unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Open-ended status label. Missing in malformed records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Usernames of assigned members, in source order.
    #[serde(default, deserialize_with = "assignee_usernames")]
    pub assignees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        with = "timestamp_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "timestamp_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Estimated minutes of work left. Fractions round to the nearest
    /// minute; negative or non-numeric estimates decode to `None`.
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_estimate: Option<u64>,
}

impl Task {
    /// Create a task with no status, assignees or location.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: None,
            assignees: Vec::new(),
            priority: None,
            due_date: None,
            start_date: None,
            project_id: None,
            project_name: None,
            space_id: None,
            time_estimate: None,
        }
    }

    /// Builder: set status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder: add an assignee.
    pub fn with_assignee(mut self, username: impl Into<String>) -> Self {
        self.assignees.push(username.into());
        self
    }

    /// Builder: set priority level.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(TaskPriority::new(priority));
        self
    }

    /// Builder: set due date.
    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Builder: set project (id and display name).
    pub fn with_project(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.project_id = Some(id.into());
        self.project_name = Some(name.into());
        self
    }

    /// Builder: set space.
    pub fn with_space(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = Some(space_id.into());
        self
    }

    /// Builder: set time estimate in minutes.
    pub fn with_time_estimate(mut self, minutes: u64) -> Self {
        self.time_estimate = Some(minutes);
        self
    }

    /// Effective priority; absent means normal.
    pub fn priority_level(&self) -> Priority {
        self.priority
            .as_ref()
            .map(|p| p.priority)
            .unwrap_or(Priority::Normal)
    }

    /// Source color of the priority, else the level's default.
    pub fn priority_color(&self) -> &str {
        match &self.priority {
            Some(p) => p.color(),
            None => Priority::Normal.default_color(),
        }
    }

    pub fn is_urgent(&self) -> bool {
        self.priority_level() == Priority::Urgent
    }

    pub fn is_unassigned(&self) -> bool {
        self.assignees.is_empty()
    }
}

/// A team member. `username` is the key used everywhere in aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub username: String,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A project. Always belongs to exactly one space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub space_id: String,
}

/// Top-level grouping of projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

/// Parse a millisecond epoch timestamp given as a numeric string.
///
/// Returns `None` for anything that is not a representable integer.
pub fn parse_timestamp_ms(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

fn timestamp_from_value(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp_ms(s),
        serde_json::Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn minutes_from_value(value: &serde_json::Value) -> Option<u64> {
    let minutes = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    // `as` saturates at u64::MAX.
    Some(minutes.round() as u64)
}

fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(minutes_from_value))
}

/// Millisecond timestamps as numeric strings. Invalid input decodes to `None`.
mod timestamp_ms {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.timestamp_millis().to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(raw.as_ref().and_then(super::timestamp_from_value))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

/// Assignees arrive either as usernames or as member objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum AssigneeRecord {
    Username(String),
    Member { username: String },
}

fn assignee_usernames<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let records = Option::<Vec<AssigneeRecord>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(records
        .into_iter()
        .map(|r| match r {
            AssigneeRecord::Username(name) | AssigneeRecord::Member { username: name } => name,
        })
        .collect())
}
