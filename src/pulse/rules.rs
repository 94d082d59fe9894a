//! Recommendation rules engine.
//!
//! Rules run in a fixed order and never see each other's output:
//! 1. overload: one recommendation per overloaded member
//! 2. imbalance: score spread above the configured threshold
//! 3. idle: members without active work while others are overloaded
//!
//! Output order is rule order, not severity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::insights::LoadBalanceInsights;
use super::summary::WorkloadSummary;
use crate::config::PulseConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Overload,
    Imbalance,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
    pub message: String,
    /// Short imperative the dashboard shows as a button label.
    pub action: String,
}

/// One independent recommendation rule.
pub trait RecommendationRule: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        summaries: &BTreeMap<String, WorkloadSummary>,
        insights: &LoadBalanceInsights,
    ) -> Vec<Recommendation>;
}

/// Flags every overloaded member.
pub struct OverloadRule;

impl RecommendationRule for OverloadRule {
    fn name(&self) -> &str {
        "overload"
    }

    fn evaluate(
        &self,
        summaries: &BTreeMap<String, WorkloadSummary>,
        insights: &LoadBalanceInsights,
    ) -> Vec<Recommendation> {
        insights
            .overloaded_members
            .iter()
            .map(|member| {
                let active = summaries
                    .get(&member.username)
                    .map(|s| s.active_tasks)
                    .unwrap_or(member.active_tasks);
                Recommendation {
                    kind: RecommendationKind::Overload,
                    priority: RecommendationPriority::High,
                    message: format!(
                        "{} is overloaded with {} active tasks (score {})",
                        member.username, active, member.workload_score
                    ),
                    action: format!("Reassign work from {}", member.username),
                }
            })
            .collect()
    }
}

/// Fires when the gap between the most and least loaded member is too wide.
pub struct ImbalanceRule {
    pub threshold: u32,
}

impl RecommendationRule for ImbalanceRule {
    fn name(&self) -> &str {
        "imbalance"
    }

    fn evaluate(
        &self,
        _summaries: &BTreeMap<String, WorkloadSummary>,
        insights: &LoadBalanceInsights,
    ) -> Vec<Recommendation> {
        let (Some(highest), Some(lowest)) = (&insights.highest_workload, &insights.lowest_workload)
        else {
            return Vec::new();
        };
        let gap = highest.workload_score.saturating_sub(lowest.workload_score);
        if gap <= self.threshold {
            return Vec::new();
        }
        vec![Recommendation {
            kind: RecommendationKind::Imbalance,
            priority: RecommendationPriority::Medium,
            message: format!(
                "Workload is unbalanced: {} (score {}) vs {} (score {}), a gap of {} points",
                highest.username, highest.workload_score, lowest.username, lowest.workload_score, gap
            ),
            action: format!("Rebalance tasks from {} to {}", highest.username, lowest.username),
        }]
    }
}

/// Fires when someone has nothing active while others are overloaded.
///
/// `summarize_members` omits members without active tasks, so this only
/// triggers when the caller adds idle members to the summaries itself.
pub struct IdleRule;

impl RecommendationRule for IdleRule {
    fn name(&self) -> &str {
        "idle"
    }

    fn evaluate(
        &self,
        summaries: &BTreeMap<String, WorkloadSummary>,
        insights: &LoadBalanceInsights,
    ) -> Vec<Recommendation> {
        if insights.overloaded_members.is_empty() {
            return Vec::new();
        }
        let idle: Vec<&str> = summaries
            .values()
            .filter(|s| s.active_tasks == 0)
            .map(|s| s.username.as_str())
            .collect();
        if idle.is_empty() {
            return Vec::new();
        }
        vec![Recommendation {
            kind: RecommendationKind::Idle,
            priority: RecommendationPriority::Medium,
            message: format!(
                "{} {} no active tasks while {} {} overloaded",
                idle.join(", "),
                if idle.len() == 1 { "has" } else { "have" },
                insights.overloaded_members.len(),
                if insights.overloaded_members.len() == 1 {
                    "member is"
                } else {
                    "members are"
                },
            ),
            action: format!("Redistribute work to {}", idle.join(", ")),
        }]
    }
}

/// Ordered collection of rules.
pub struct RecommendationEngine {
    rules: Vec<Box<dyn RecommendationRule>>,
}

impl RecommendationEngine {
    /// Overload, imbalance, idle, in that order.
    pub fn default_rules(config: &PulseConfig) -> Self {
        Self {
            rules: vec![
                Box::new(OverloadRule),
                Box::new(ImbalanceRule {
                    threshold: config.imbalance_threshold,
                }),
                Box::new(IdleRule),
            ],
        }
    }

    /// An engine with no rules (for testing).
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; it runs after the existing ones.
    pub fn add_rule(&mut self, rule: Box<dyn RecommendationRule>) {
        self.rules.push(rule);
    }

    pub fn evaluate(
        &self,
        summaries: &BTreeMap<String, WorkloadSummary>,
        insights: &LoadBalanceInsights,
    ) -> Vec<Recommendation> {
        let mut out = Vec::new();
        for rule in &self.rules {
            let produced = rule.evaluate(summaries, insights);
            if !produced.is_empty() {
                debug!(rule = rule.name(), count = produced.len(), "Rule produced recommendations");
            }
            out.extend(produced);
        }
        out
    }
}

/// Run the default rule set.
pub fn derive_recommendations(
    summaries: &BTreeMap<String, WorkloadSummary>,
    insights: &LoadBalanceInsights,
    config: &PulseConfig,
) -> Vec<Recommendation> {
    RecommendationEngine::default_rules(config).evaluate(summaries, insights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::insights::derive_insights;
    use crate::pulse::scoring::WorkloadStatus;

    fn summary(username: &str, score: u32, active: u32) -> WorkloadSummary {
        WorkloadSummary {
            username: username.into(),
            active_tasks: active,
            urgent_tasks: 0,
            due_soon_tasks: 0,
            overdue_tasks: 0,
            remaining_time: 0,
            workload_score: score,
            status: WorkloadStatus::from_score(score),
            projects: Vec::new(),
            tasks: Vec::new(),
        }
    }

    fn map(items: Vec<WorkloadSummary>) -> BTreeMap<String, WorkloadSummary> {
        items.into_iter().map(|s| (s.username.clone(), s)).collect()
    }

    fn run(summaries: &BTreeMap<String, WorkloadSummary>) -> Vec<Recommendation> {
        let insights = derive_insights(summaries);
        derive_recommendations(summaries, &insights, &PulseConfig::default())
    }

    fn kinds(recs: &[Recommendation]) -> Vec<RecommendationKind> {
        recs.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn nothing_to_say_for_empty_team() {
        assert!(run(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn balanced_team_gets_no_recommendations() {
        let summaries = map(vec![summary("A", 50, 5), summary("B", 30, 3)]);
        assert!(run(&summaries).is_empty());
    }

    #[test]
    fn overload_emits_one_per_member_before_imbalance() {
        let summaries = map(vec![
            summary("A", 95, 8),
            summary("B", 92, 7),
            summary("C", 10, 1),
        ]);
        let recs = run(&summaries);
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::Overload,
                RecommendationKind::Overload,
                RecommendationKind::Imbalance,
            ]
        );
        assert!(recs[0].message.starts_with("A is overloaded with 8 active tasks"));
        assert!(recs[1].message.starts_with("B is overloaded"));
        assert_eq!(recs[0].priority, RecommendationPriority::High);
        assert_eq!(recs[2].action, "Rebalance tasks from A to C");
    }

    #[test]
    fn imbalance_threshold_is_strict() {
        let summaries = map(vec![summary("A", 50, 5), summary("B", 10, 1)]);
        assert!(run(&summaries).is_empty());

        let summaries = map(vec![summary("A", 51, 5), summary("B", 10, 1)]);
        assert_eq!(kinds(&run(&summaries)), vec![RecommendationKind::Imbalance]);
    }

    #[test]
    fn idle_members_reported_when_others_overloaded() {
        let summaries = map(vec![
            summary("A", 95, 9),
            summary("B", 0, 0),
            summary("C", 0, 0),
        ]);
        let recs = run(&summaries);
        assert_eq!(
            kinds(&recs),
            vec![
                RecommendationKind::Overload,
                RecommendationKind::Imbalance,
                RecommendationKind::Idle,
            ]
        );
        assert_eq!(recs[2].message, "B, C have no active tasks while 1 member is overloaded");
        assert_eq!(recs[2].action, "Redistribute work to B, C");
    }

    #[test]
    fn idle_rule_needs_overload() {
        let summaries = map(vec![summary("A", 30, 3), summary("B", 0, 0)]);
        assert!(IdleRule
            .evaluate(&summaries, &derive_insights(&summaries))
            .is_empty());
    }

    #[test]
    fn custom_rule_runs_after_defaults() {
        struct Always;
        impl RecommendationRule for Always {
            fn name(&self) -> &str {
                "always"
            }
            fn evaluate(
                &self,
                _summaries: &BTreeMap<String, WorkloadSummary>,
                _insights: &LoadBalanceInsights,
            ) -> Vec<Recommendation> {
                vec![Recommendation {
                    kind: RecommendationKind::Imbalance,
                    priority: RecommendationPriority::Low,
                    message: "custom".into(),
                    action: "none".into(),
                }]
            }
        }

        let mut engine = RecommendationEngine::empty();
        engine.add_rule(Box::new(Always));
        let summaries = map(vec![summary("A", 10, 1)]);
        let recs = engine.evaluate(&summaries, &derive_insights(&summaries));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].message, "custom");
    }

    #[test]
    fn recommendation_serde_shape() {
        let rec = Recommendation {
            kind: RecommendationKind::Overload,
            priority: RecommendationPriority::High,
            message: "m".into(),
            action: "a".into(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "overload");
        assert_eq!(json["priority"], "high");
    }
}
