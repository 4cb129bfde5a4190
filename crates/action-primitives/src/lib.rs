//! Step executor
//!
//! Runs a single declared [`Step`](flowguard_core_types::Step) against a
//! browser session. Failure is an ordinary outcome here: every error is folded
//! into the returned [`StepResult`](flowguard_core_types::StepResult) and
//! nothing is propagated to the caller.

pub mod errors;
pub mod executor;
pub mod primitives;

pub use errors::StepError;
pub use executor::{execute, screenshot_file_name};
pub use primitives::StepOutput;
