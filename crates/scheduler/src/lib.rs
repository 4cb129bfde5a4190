//! Worker pool scheduler.
//!
//! Runs an ordered batch of independent flows with at most `N` in flight.
//! Each worker owns one flow (and so one browser session) at a time and
//! pulls the next flow from a shared queue until it is empty.

pub mod api;
pub mod error;
pub mod metrics;
pub mod model;
pub mod runtime;

pub use api::FlowRun;
pub use error::SchedulerError;
pub use model::{ScheduleReport, SchedulerConfig, VerdictCounts, DEFAULT_CONCURRENCY};
pub use runtime::FlowScheduler;
