//! The task records the aggregator consumes.
//!
//! Sources hand over a `TaskFeed`; everything downstream borrows from it.

pub mod feed;
pub mod model;

pub use feed::TaskFeed;
pub use model::{Member, Priority, Project, Space, Task, TaskPriority, parse_timestamp_ms};
