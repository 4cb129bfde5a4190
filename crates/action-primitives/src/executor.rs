//! Step dispatch.
//!
//! [`execute`] is total: whatever the browser does, the caller gets a
//! [`StepResult`] with `duration_ms` filled in.

use cdp_adapter::BrowserSession;
use flowguard_core_types::{Step, StepAction, StepResult};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

use crate::errors::StepError;
use crate::primitives::{
    execute_click, execute_navigate, execute_screenshot, execute_scroll, execute_type,
    execute_wait, StepOutput,
};

/// Execute one step against an exclusive browser session.
///
/// Screenshots land in `artifact_dir`, which is created on demand.
pub async fn execute(
    session: &dyn BrowserSession,
    step: &Step,
    step_index: usize,
    artifact_dir: &Path,
) -> StepResult {
    let started = Instant::now();
    let outcome = dispatch(session, step, step_index, artifact_dir).await;
    let elapsed = started.elapsed().as_millis() as u64;

    let result = StepResult::new(step_index, step.action.clone()).with_duration(elapsed);
    match outcome {
        Ok(output) => {
            debug!(
                step = step_index,
                action = %step.action,
                duration_ms = elapsed,
                "step succeeded"
            );
            let result = result.with_success();
            match output.screenshot {
                Some(capture) => result.with_screenshot(capture.path, capture.base64),
                None => result,
            }
        }
        Err(err) => {
            warn!(
                step = step_index,
                action = %step.action,
                duration_ms = elapsed,
                error = %err,
                "step failed"
            );
            result.with_failure(err.failure_kind(), err.to_string())
        }
    }
}

async fn dispatch(
    session: &dyn BrowserSession,
    step: &Step,
    step_index: usize,
    artifact_dir: &Path,
) -> Result<StepOutput, StepError> {
    match &step.action {
        StepAction::Navigate => execute_navigate(session, step).await,
        StepAction::Click => execute_click(session, step).await,
        StepAction::Type => execute_type(session, step).await,
        StepAction::Screenshot => {
            execute_screenshot(session, step, step_index, artifact_dir).await
        }
        StepAction::Wait => execute_wait(session, step).await,
        StepAction::Scroll => execute_scroll(session, step).await,
        StepAction::Other(name) => Err(StepError::UnknownAction(name.clone())),
    }
}

/// Artifact file name for the screenshot taken by step `step_index`.
pub fn screenshot_file_name(step_index: usize, epoch_millis: i64) -> String {
    format!("step-{step_index}-{epoch_millis}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_names_embed_index_and_time() {
        assert_eq!(screenshot_file_name(3, 1_700_000_000_123), "step-3-1700000000123.png");
    }
}
