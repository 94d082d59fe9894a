//! Pulse aggregation pipeline.
//!
//! Every report is computed from scratch:
//! 1. `filter_tasks()`: status, member and space
//! 2. `summarize_members()`: per-member counts and workload score
//! 3. `derive_insights()`: highest/lowest load, overload, transfer suggestions
//! 4. `derive_recommendations()`: ordered rule output
//!
//! All stages are pure functions over borrowed input; nothing is cached.

pub mod insights;
pub mod report;
pub mod rules;
pub mod scoring;
pub mod summary;

pub use insights::{LoadBalanceInsights, MemberLoad, TransferSuggestion, derive_insights};
pub use report::{PulseReport, ReportMeta, build_report};
pub use rules::{Recommendation, RecommendationEngine, derive_recommendations};
pub use scoring::{ScoringWeights, WorkloadStatus, workload_score};
pub use summary::{WorkloadSummary, ranked, summarize_members};
