//! HTTP surface for the dashboard.

pub mod query;
pub mod routes;

pub use query::PulseQuery;
pub use routes::{PulseState, pulse_routes};
