//! Shared data model for the FlowGuard flow engine.
//!
//! Every crate in the workspace speaks in these types: flows and their steps
//! as loaded from disk, the per-step results produced by the step executor and
//! the per-flow run result produced by the orchestrator.

pub mod flow;
pub mod result;
pub mod step;

pub use flow::{FlowDefinition, FlowDefinitionError, Viewport};
pub use result::{AssertionRecord, FailureKind, FlowRunResult, StepResult, Verdict};
pub use step::{Step, StepAction, DEFAULT_INTERACTION_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS};
