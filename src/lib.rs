//! Workload aggregation for the team dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod pulse;
pub mod source;
pub mod tasks;
