//! The JSON document served to the dashboard.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::insights::{LoadBalanceInsights, derive_insights};
use super::rules::{Recommendation, derive_recommendations};
use super::summary::{DueState, WorkloadSummary, due_state, ranked, summarize_members};
use crate::config::PulseConfig;
use crate::filters::{FilterSet, filter_tasks};
use crate::tasks::{Task, TaskFeed};

/// Derived per-project figures. Not authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAnalytics {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    pub total_tasks: u32,
    pub active_tasks: u32,
    pub completed_tasks: u32,
    pub assigned_members: Vec<String>,
    /// Minutes estimated across active tasks.
    pub total_time_estimate: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_tasks: usize,
    pub in_scope_tasks: usize,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub urgent_tasks: usize,
    pub overdue_tasks: usize,
    pub due_soon_tasks: usize,
    pub unassigned_tasks: usize,
    pub members_with_work: usize,
    pub total_remaining_time: u64,
    pub average_workload_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub generated_at: DateTime<Utc>,
    /// Increases with every report a server builds; clients drop responses
    /// older than the newest one they have seen.
    pub generation: u64,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    pub reference_time: DateTime<Utc>,
    pub filters: FilterSet,
    pub skipped_records: usize,
    pub terminal_statuses: BTreeSet<String>,
}

/// Per-request context that does not affect the aggregation itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub generation: u64,
    pub generated_at: DateTime<Utc>,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseReport {
    /// Member summaries, highest score first.
    pub member_workloads: Vec<WorkloadSummary>,
    pub project_analytics: Vec<ProjectAnalytics>,
    pub load_balance_insights: LoadBalanceInsights,
    pub recommendations: Vec<Recommendation>,
    pub overview_stats: OverviewStats,
    pub cache_info: CacheInfo,
    pub debug_info: DebugInfo,
    pub data_source: String,
}

/// Run the full pipeline over a feed.
pub fn build_report(
    feed: &TaskFeed,
    filters: &FilterSet,
    config: &PulseConfig,
    now: DateTime<Utc>,
    meta: ReportMeta,
) -> PulseReport {
    let in_scope = filter_tasks(&feed.tasks, filters);
    let summaries = summarize_members(&in_scope, config, now);
    let insights = derive_insights(&summaries);
    let recommendations = derive_recommendations(&summaries, &insights, config);

    let project_analytics = project_analytics(feed, &in_scope, config);
    let overview_stats = overview_stats(feed, &in_scope, &summaries, config, now);

    info!(
        generation = meta.generation,
        tasks = feed.tasks.len(),
        in_scope = in_scope.len(),
        members = summaries.len(),
        recommendations = recommendations.len(),
        "Built pulse report"
    );

    PulseReport {
        member_workloads: ranked(&summaries).into_iter().cloned().collect(),
        project_analytics,
        load_balance_insights: insights,
        recommendations,
        overview_stats,
        cache_info: CacheInfo {
            generated_at: meta.generated_at,
            generation: meta.generation,
            cached: false,
        },
        debug_info: DebugInfo {
            reference_time: now,
            filters: filters.clone(),
            skipped_records: feed.skipped_records,
            terminal_statuses: config.terminal_statuses.clone(),
        },
        data_source: meta.data_source,
    }
}

fn is_active(task: &Task, config: &PulseConfig) -> bool {
    task.status.as_deref().is_some_and(|s| !config.is_terminal(s))
}

/// One entry per project touched by an in-scope task; busiest first.
pub fn project_analytics(
    feed: &TaskFeed,
    in_scope: &[&Task],
    config: &PulseConfig,
) -> Vec<ProjectAnalytics> {
    let mut by_project: BTreeMap<&str, (ProjectAnalytics, BTreeSet<&str>)> = BTreeMap::new();

    for task in in_scope {
        let Some(project_id) = task.project_id.as_deref() else {
            continue;
        };
        let (entry, members) = by_project.entry(project_id).or_insert_with(|| {
            let catalog = feed.project(project_id);
            let name = catalog
                .map(|p| p.name.clone())
                .or_else(|| task.project_name.clone())
                .unwrap_or_else(|| project_id.to_string());
            let space_id = catalog
                .map(|p| p.space_id.clone())
                .or_else(|| task.space_id.clone());
            (
                ProjectAnalytics {
                    id: project_id.to_string(),
                    name,
                    space_id,
                    total_tasks: 0,
                    active_tasks: 0,
                    completed_tasks: 0,
                    assigned_members: Vec::new(),
                    total_time_estimate: 0,
                },
                BTreeSet::new(),
            )
        });

        entry.total_tasks += 1;
        if is_active(task, config) {
            entry.active_tasks += 1;
            entry.total_time_estimate = entry
                .total_time_estimate
                .saturating_add(task.time_estimate.unwrap_or(0));
            members.extend(task.assignees.iter().map(String::as_str));
        } else {
            entry.completed_tasks += 1;
        }
    }

    let mut projects: Vec<ProjectAnalytics> = by_project
        .into_values()
        .map(|(mut project, members)| {
            project.assigned_members = members.into_iter().map(str::to_string).collect();
            project
        })
        .collect();
    projects.sort_by(|a, b| b.active_tasks.cmp(&a.active_tasks).then_with(|| a.id.cmp(&b.id)));
    projects
}

/// Team-wide counts over the in-scope tasks.
pub fn overview_stats(
    feed: &TaskFeed,
    in_scope: &[&Task],
    summaries: &BTreeMap<String, WorkloadSummary>,
    config: &PulseConfig,
    now: DateTime<Utc>,
) -> OverviewStats {
    let mut stats = OverviewStats {
        total_tasks: feed.tasks.len(),
        in_scope_tasks: in_scope.len(),
        members_with_work: summaries.len(),
        ..Default::default()
    };

    for task in in_scope {
        if !is_active(task, config) {
            stats.completed_tasks += 1;
            continue;
        }
        stats.active_tasks += 1;
        stats.total_remaining_time = stats
            .total_remaining_time
            .saturating_add(task.time_estimate.unwrap_or(0));
        if task.is_urgent() {
            stats.urgent_tasks += 1;
        }
        if task.is_unassigned() {
            stats.unassigned_tasks += 1;
        }
        match due_state(task.due_date, now, config.due_soon_window) {
            DueState::Overdue => stats.overdue_tasks += 1,
            DueState::DueSoon => stats.due_soon_tasks += 1,
            DueState::Later | DueState::Unknown => {}
        }
    }

    if !summaries.is_empty() {
        let total: u32 = summaries.values().map(|s| s.workload_score).sum();
        let average = f64::from(total) / summaries.len() as f64;
        stats.average_workload_score = (average * 10.0).round() / 10.0;
    }

    stats
}
