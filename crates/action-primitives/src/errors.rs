//! Error types for step execution

use cdp_adapter::AdapterError;
use flowguard_core_types::FailureKind;
use thiserror::Error;

/// Why a step could not complete. Never escapes [`execute`](crate::execute);
/// it is rendered into the step result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    /// A field required by the action is missing
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The browser failed to carry out the action
    #[error("{0}")]
    ActionExecution(String),

    /// The action string is not recognised
    #[error("unknown action: {0}")]
    UnknownAction(String),
}

impl StepError {
    pub fn missing_target(action: &str) -> Self {
        StepError::Configuration(format!("'{action}' step requires a target"))
    }

    pub fn timed_out(operation: &str, timeout_ms: u64) -> Self {
        StepError::ActionExecution(format!("{operation} timed out after {timeout_ms}ms"))
    }

    pub fn failure_kind(&self) -> FailureKind {
        match self {
            StepError::Configuration(_) => FailureKind::Configuration,
            StepError::ActionExecution(_) => FailureKind::Execution,
            StepError::UnknownAction(_) => FailureKind::UnknownAction,
        }
    }
}

impl From<AdapterError> for StepError {
    fn from(err: AdapterError) -> Self {
        StepError::ActionExecution(err.to_string())
    }
}

impl From<std::io::Error> for StepError {
    fn from(err: std::io::Error) -> Self {
        StepError::ActionExecution(format!("artifact i/o failed: {err}"))
    }
}
