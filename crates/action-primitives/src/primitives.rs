//! One module per supported action.

mod click;
mod navigate;
mod screenshot;
mod scroll;
mod type_text;
mod wait;

pub(crate) use click::execute_click;
pub(crate) use navigate::execute_navigate;
pub(crate) use screenshot::execute_screenshot;
pub(crate) use scroll::execute_scroll;
pub(crate) use type_text::execute_type;
pub(crate) use wait::execute_wait;

use cdp_adapter::AdapterError;
use flowguard_core_types::Step;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;

use crate::errors::StepError;

/// What a successful primitive produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepOutput {
    pub screenshot: Option<Capture>,
}

/// A screenshot written to the artifact directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capture {
    pub path: PathBuf,
    pub base64: String,
}

/// Run a browser call under the step timeout, independent of whatever
/// deadline the adapter applies itself.
pub(crate) async fn bounded<T, F>(operation: &str, limit: Duration, call: F) -> Result<T, StepError>
where
    F: Future<Output = Result<T, AdapterError>>,
{
    match timeout(limit, call).await {
        Ok(result) => result.map_err(StepError::from),
        Err(_) => Err(StepError::timed_out(operation, limit.as_millis() as u64)),
    }
}

pub(crate) fn require_target(step: &Step) -> Result<&str, StepError> {
    step.target()
        .ok_or_else(|| StepError::missing_target(step.action.as_str()))
}
