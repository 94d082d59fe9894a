//! Per-member grouping and scoring.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::{WorkloadStatus, workload_score};
use crate::config::PulseConfig;
use crate::tasks::{Priority, Task};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A project touched by a member's active tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub project_id: String,
    pub name: String,
    /// Earliest known due date among the member's tasks in this project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub due_soon: bool,
}

/// The slice of a task a summary keeps around (for transfer suggestions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberTask {
    pub id: String,
    pub name: String,
    pub priority: Priority,
    /// Effective display color of the priority.
    pub priority_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<u64>,
}

impl MemberTask {
    fn from_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            name: task.name.clone(),
            priority: task.priority_level(),
            priority_color: task.priority_color().to_string(),
            due_date: task.due_date,
            time_estimate: task.time_estimate,
        }
    }
}

/// Workload of one member over the in-scope tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub username: String,
    pub active_tasks: u32,
    pub urgent_tasks: u32,
    pub due_soon_tasks: u32,
    pub overdue_tasks: u32,
    /// Minutes of estimated work left on active tasks.
    pub remaining_time: u64,
    pub workload_score: u32,
    pub status: WorkloadStatus,
    pub projects: Vec<ProjectRef>,
    pub tasks: Vec<MemberTask>,
}

impl WorkloadSummary {
    fn empty(username: &str) -> Self {
        Self {
            username: username.to_string(),
            active_tasks: 0,
            urgent_tasks: 0,
            due_soon_tasks: 0,
            overdue_tasks: 0,
            remaining_time: 0,
            workload_score: 0,
            status: WorkloadStatus::Light,
            projects: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn is_overloaded(&self) -> bool {
        self.status == WorkloadStatus::Overloaded
    }
}

/// Where a due date sits relative to `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    Overdue,
    DueSoon,
    Later,
    Unknown,
}

/// Classify a due date: overdue when strictly before `now`, due soon when
/// `due - now` is at most `window`.
pub fn due_state(due: Option<DateTime<Utc>>, now: DateTime<Utc>, window: chrono::Duration) -> DueState {
    match due {
        None => DueState::Unknown,
        Some(due) if due < now => DueState::Overdue,
        Some(due) if due - now <= window => DueState::DueSoon,
        Some(_) => DueState::Later,
    }
}

/// Whole days until `due`, rounded up. Negative when overdue.
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due - now).num_milliseconds();
    (millis + MILLIS_PER_DAY - 1).div_euclid(MILLIS_PER_DAY)
}

/// Group in-scope tasks by assignee and score each member.
///
/// A task with several assignees counts fully for each of them. Tasks in a
/// terminal status are ignored, and members left without an active task are
/// omitted from the result.
pub fn summarize_members(
    tasks: &[&Task],
    config: &PulseConfig,
    now: DateTime<Utc>,
) -> BTreeMap<String, WorkloadSummary> {
    let mut summaries: BTreeMap<String, WorkloadSummary> = BTreeMap::new();
    let mut project_dues: BTreeMap<String, BTreeMap<String, ProjectRef>> = BTreeMap::new();

    for task in tasks {
        // In-scope tasks always carry a status; anything else is ignored here.
        let Some(status) = task.status.as_deref() else {
            continue;
        };
        if config.is_terminal(status) {
            continue;
        }

        let due = due_state(task.due_date, now, config.due_soon_window);
        for username in &task.assignees {
            let summary = summaries
                .entry(username.clone())
                .or_insert_with(|| WorkloadSummary::empty(username));

            summary.active_tasks += 1;
            if task.is_urgent() {
                summary.urgent_tasks += 1;
            }
            match due {
                DueState::DueSoon => summary.due_soon_tasks += 1,
                DueState::Overdue => summary.overdue_tasks += 1,
                DueState::Later | DueState::Unknown => {}
            }
            summary.remaining_time = summary
                .remaining_time
                .saturating_add(task.time_estimate.unwrap_or(0));
            summary.tasks.push(MemberTask::from_task(task));

            if let Some(project_id) = task.project_id.as_deref() {
                let entry = project_dues
                    .entry(username.clone())
                    .or_default()
                    .entry(project_id.to_string())
                    .or_insert_with(|| ProjectRef {
                        project_id: project_id.to_string(),
                        name: task
                            .project_name
                            .clone()
                            .unwrap_or_else(|| project_id.to_string()),
                        due_date: None,
                        due_soon: false,
                    });
                entry.due_date = match (entry.due_date, task.due_date) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
        }
    }

    for summary in summaries.values_mut() {
        summary.workload_score = workload_score(
            &config.weights,
            summary.active_tasks,
            summary.urgent_tasks,
            summary.overdue_tasks,
        );
        summary.status = WorkloadStatus::from_score(summary.workload_score);

        if let Some(projects) = project_dues.remove(&summary.username) {
            summary.projects = projects
                .into_values()
                .map(|mut project| {
                    project.due_soon = project
                        .due_date
                        .is_some_and(|due| days_until(due, now) <= config.project_due_soon_days);
                    project
                })
                .collect();
        }
    }

    debug!(
        in_scope = tasks.len(),
        members = summaries.len(),
        "Summarized member workloads"
    );
    summaries
}

/// Display order: score descending, then username ascending.
pub fn ranked(summaries: &BTreeMap<String, WorkloadSummary>) -> Vec<&WorkloadSummary> {
    let mut ordered: Vec<&WorkloadSummary> = summaries.values().collect();
    ordered.sort_by(|a, b| {
        b.workload_score
            .cmp(&a.workload_score)
            .then_with(|| a.username.cmp(&b.username))
    });
    ordered
}
