//! Workload score and status buckets.

use serde::{Deserialize, Serialize};

/// Upper bound of every workload score.
pub const MAX_SCORE: u32 = 100;

const BALANCED_FROM: u32 = 40;
const BUSY_FROM: u32 = 70;
const OVERLOADED_FROM: u32 = 90;

/// Points contributed by each counted task.
///
/// Weights are unsigned, so the score never decreases when a count grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub active: u32,
    pub urgent: u32,
    pub overdue: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            active: 10,
            urgent: 15,
            overdue: 20,
        }
    }
}

/// `active·W1 + urgent·W2 + overdue·W3`, clamped to `[0, 100]`.
pub fn workload_score(weights: &ScoringWeights, active: u32, urgent: u32, overdue: u32) -> u32 {
    active
        .saturating_mul(weights.active)
        .saturating_add(urgent.saturating_mul(weights.urgent))
        .saturating_add(overdue.saturating_mul(weights.overdue))
        .min(MAX_SCORE)
}

/// Categorical load label derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    Light,
    Balanced,
    Busy,
    Overloaded,
}

impl WorkloadStatus {
    /// `<40` light, `<70` balanced, `<90` busy, otherwise overloaded.
    pub fn from_score(score: u32) -> Self {
        if score < BALANCED_FROM {
            Self::Light
        } else if score < BUSY_FROM {
            Self::Balanced
        } else if score < OVERLOADED_FROM {
            Self::Busy
        } else {
            Self::Overloaded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Balanced => "balanced",
            Self::Busy => "busy",
            Self::Overloaded => "overloaded",
        }
    }
}

impl std::fmt::Display for WorkloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
