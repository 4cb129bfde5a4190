//! Type primitive - fill an input with the step value

use cdp_adapter::BrowserSession;
use flowguard_core_types::Step;
use tracing::debug;

use super::{bounded, require_target, StepOutput};
use crate::errors::StepError;

pub(crate) async fn execute_type(
    session: &dyn BrowserSession,
    step: &Step,
) -> Result<StepOutput, StepError> {
    let selector = require_target(step)?;
    let text = step.value.as_deref().unwrap_or_default();
    let limit = step.timeout();
    debug!(
        session = %session.id(),
        selector = %selector,
        chars = text.chars().count(),
        "type"
    );
    bounded("type", limit, session.fill(selector, text, limit)).await?;
    Ok(StepOutput::default())
}
