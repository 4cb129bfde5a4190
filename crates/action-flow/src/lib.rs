//! Flow Orchestration Layer
//!
//! A [`FlowRunner`] takes one [`FlowDefinition`](flowguard_core_types::FlowDefinition),
//! allocates a browser session for it, loads the base URL and runs the
//! declared steps in order until one fails. The session is released on every
//! exit path before the [`FlowRunResult`](flowguard_core_types::FlowRunResult)
//! is returned.

pub mod errors;
pub mod recorder;
pub mod runner;
pub mod state;

pub use errors::BrowserSetupError;
pub use recorder::{RepositoryRecorder, RunRecorder};
pub use runner::{FlowRunner, RunnerSettings, DEFAULT_NAVIGATION_TIMEOUT_MS};
pub use state::FlowState;
