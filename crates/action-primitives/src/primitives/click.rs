//! Click primitive

use cdp_adapter::BrowserSession;
use flowguard_core_types::Step;
use tracing::debug;

use super::{bounded, require_target, StepOutput};
use crate::errors::StepError;

pub(crate) async fn execute_click(
    session: &dyn BrowserSession,
    step: &Step,
) -> Result<StepOutput, StepError> {
    let selector = require_target(step)?;
    let limit = step.timeout();
    debug!(session = %session.id(), selector = %selector, "click");
    bounded("click", limit, session.click(selector, limit)).await?;
    Ok(StepOutput::default())
}
