//! Cross-member load-balance insights.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::WorkloadStatus;
use super::summary::{MemberTask, WorkloadSummary, ranked};

/// A member's position in the load ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLoad {
    pub username: String,
    pub workload_score: u32,
    pub status: WorkloadStatus,
    pub active_tasks: u32,
}

impl MemberLoad {
    fn from_summary(summary: &WorkloadSummary) -> Self {
        Self {
            username: summary.username.clone(),
            workload_score: summary.workload_score,
            status: summary.status,
            active_tasks: summary.active_tasks,
        }
    }
}

/// A proposal to move one task off an overloaded member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSuggestion {
    pub from: String,
    pub to: String,
    pub task_id: String,
    pub task_name: String,
    pub score_gap: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalanceInsights {
    pub highest_workload: Option<MemberLoad>,
    pub lowest_workload: Option<MemberLoad>,
    /// Overloaded members, highest score first.
    pub overloaded_members: Vec<MemberLoad>,
    /// Highest score minus lowest score.
    pub workload_spread: u32,
    pub transfer_suggestions: Vec<TransferSuggestion>,
}

/// Compare cross-member load and propose transfers.
///
/// All overloaded members share one target: the lowest-scoring member that is
/// not overloaded. Each overloaded member gets at most one suggestion.
pub fn derive_insights(summaries: &BTreeMap<String, WorkloadSummary>) -> LoadBalanceInsights {
    let ordered = ranked(summaries);

    let highest = ordered.first().copied();
    let lowest = ordered.iter().copied().min_by(|a, b| by_load(a, b));

    let overloaded: Vec<&WorkloadSummary> =
        ordered.iter().copied().filter(|s| s.is_overloaded()).collect();

    let target = ordered
        .iter()
        .copied()
        .filter(|s| !s.is_overloaded())
        .min_by(|a, b| by_load(a, b));

    let transfer_suggestions = match target {
        Some(target) => overloaded
            .iter()
            .filter_map(|source| suggest_transfer(source, target))
            .collect(),
        None => Vec::new(),
    };

    let workload_spread = match (highest, lowest) {
        (Some(h), Some(l)) => h.workload_score - l.workload_score,
        _ => 0,
    };

    debug!(
        members = summaries.len(),
        overloaded = overloaded.len(),
        suggestions = transfer_suggestions.len(),
        "Derived load-balance insights"
    );

    LoadBalanceInsights {
        highest_workload: highest.map(MemberLoad::from_summary),
        lowest_workload: lowest.map(MemberLoad::from_summary),
        overloaded_members: overloaded.into_iter().map(MemberLoad::from_summary).collect(),
        workload_spread,
        transfer_suggestions,
    }
}

/// Ascending score, ties by username.
fn by_load(a: &WorkloadSummary, b: &WorkloadSummary) -> Ordering {
    a.workload_score
        .cmp(&b.workload_score)
        .then_with(|| a.username.cmp(&b.username))
}

fn suggest_transfer(source: &WorkloadSummary, target: &WorkloadSummary) -> Option<TransferSuggestion> {
    let task = transfer_candidate(&source.tasks)?;
    let score_gap = source.workload_score.saturating_sub(target.workload_score);
    Some(TransferSuggestion {
        from: source.username.clone(),
        to: target.username.clone(),
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        score_gap,
        reason: format!(
            "{} is {} (score {}) while {} is {} (score {}); moving \"{}\" narrows a {}-point gap",
            source.username,
            source.status,
            source.workload_score,
            target.username,
            target.status,
            target.workload_score,
            task.name,
            score_gap,
        ),
    })
}

/// Least urgent first, then soonest due (dated before undated), then id.
fn transfer_candidate(tasks: &[MemberTask]) -> Option<&MemberTask> {
    tasks.iter().min_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.id.cmp(&b.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::Priority;
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: &str, priority: Priority, due_in_days: Option<i64>) -> MemberTask {
        let base = Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap();
        MemberTask {
            id: id.into(),
            name: format!("Task {id}"),
            priority,
            priority_color: priority.default_color().to_string(),
            due_date: due_in_days.map(|d| base + Duration::days(d)),
            time_estimate: None,
        }
    }

    fn summary(username: &str, score: u32, tasks: Vec<MemberTask>) -> WorkloadSummary {
        WorkloadSummary {
            username: username.into(),
            active_tasks: tasks.len() as u32,
            urgent_tasks: 0,
            due_soon_tasks: 0,
            overdue_tasks: 0,
            remaining_time: 0,
            workload_score: score,
            status: WorkloadStatus::from_score(score),
            projects: Vec::new(),
            tasks,
        }
    }

    fn map(items: Vec<WorkloadSummary>) -> BTreeMap<String, WorkloadSummary> {
        items.into_iter().map(|s| (s.username.clone(), s)).collect()
    }

    #[test]
    fn empty_input_has_no_insights() {
        let insights = derive_insights(&BTreeMap::new());
        assert!(insights.highest_workload.is_none());
        assert!(insights.lowest_workload.is_none());
        assert!(insights.overloaded_members.is_empty());
        assert!(insights.transfer_suggestions.is_empty());
        assert_eq!(insights.workload_spread, 0);
    }

    #[test]
    fn single_member_is_both_highest_and_lowest() {
        let insights = derive_insights(&map(vec![summary(
            "A",
            95,
            vec![task("t1", Priority::Normal, None)],
        )]));
        assert_eq!(insights.highest_workload, insights.lowest_workload);
        assert_eq!(insights.highest_workload.unwrap().username, "A");
        assert_eq!(insights.overloaded_members.len(), 1);
        assert!(insights.transfer_suggestions.is_empty());
    }

    #[test]
    fn overloaded_member_transfers_to_light_member() {
        let insights = derive_insights(&map(vec![
            summary(
                "A",
                95,
                vec![
                    task("t1", Priority::Urgent, Some(1)),
                    task("t2", Priority::Low, Some(5)),
                    task("t3", Priority::Low, Some(2)),
                ],
            ),
            summary("B", 10, vec![task("b1", Priority::Normal, None)]),
        ]));

        let overloaded: Vec<&str> = insights
            .overloaded_members
            .iter()
            .map(|m| m.username.as_str())
            .collect();
        assert_eq!(overloaded, vec!["A"]);

        assert_eq!(insights.transfer_suggestions.len(), 1);
        let suggestion = &insights.transfer_suggestions[0];
        assert_eq!(suggestion.from, "A");
        assert_eq!(suggestion.to, "B");
        assert_eq!(suggestion.task_id, "t3");
        assert_eq!(suggestion.score_gap, 85);
        assert!(suggestion.reason.contains("85-point gap"));
        assert_eq!(insights.workload_spread, 85);
    }

    #[test]
    fn all_overloaded_means_no_suggestions() {
        let insights = derive_insights(&map(vec![
            summary("A", 100, vec![task("t1", Priority::Low, None)]),
            summary("B", 92, vec![task("t2", Priority::Low, None)]),
        ]));
        assert_eq!(insights.overloaded_members.len(), 2);
        assert_eq!(insights.overloaded_members[0].username, "A");
        assert!(insights.transfer_suggestions.is_empty());
    }

    #[test]
    fn one_suggestion_per_overloaded_member_to_single_target() {
        let insights = derive_insights(&map(vec![
            summary("A", 95, vec![task("a1", Priority::Normal, None)]),
            summary("B", 90, vec![task("b1", Priority::High, None), task("b2", Priority::High, None)]),
            summary("C", 30, vec![]),
            summary("D", 50, vec![]),
        ]));
        let pairs: Vec<(&str, &str, &str)> = insights
            .transfer_suggestions
            .iter()
            .map(|s| (s.from.as_str(), s.to.as_str(), s.task_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "C", "a1"), ("B", "C", "b1")]);
    }

    #[test]
    fn overloaded_member_without_tasks_gets_no_suggestion() {
        let insights = derive_insights(&map(vec![
            summary("A", 95, vec![]),
            summary("B", 10, vec![]),
        ]));
        assert_eq!(insights.overloaded_members.len(), 1);
        assert!(insights.transfer_suggestions.is_empty());
    }

    #[test]
    fn ties_break_by_username() {
        let insights = derive_insights(&map(vec![
            summary("zed", 40, vec![]),
            summary("amy", 40, vec![]),
        ]));
        assert_eq!(insights.highest_workload.unwrap().username, "amy");
        assert_eq!(insights.lowest_workload.unwrap().username, "amy");
    }

    #[test]
    fn candidate_prefers_dated_over_undated() {
        let tasks = vec![
            task("t1", Priority::Low, None),
            task("t2", Priority::Low, Some(10)),
        ];
        assert_eq!(transfer_candidate(&tasks).unwrap().id, "t2");
        assert!(transfer_candidate(&[]).is_none());
    }
}
