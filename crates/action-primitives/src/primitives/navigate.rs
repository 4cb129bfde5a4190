//! Navigate primitive - load a URL and wait for the page to settle

use cdp_adapter::BrowserSession;
use flowguard_core_types::Step;
use tracing::debug;

use super::{bounded, require_target, StepOutput};
use crate::errors::StepError;

pub(crate) async fn execute_navigate(
    session: &dyn BrowserSession,
    step: &Step,
) -> Result<StepOutput, StepError> {
    let url = require_target(step)?;
    let limit = step.timeout();
    debug!(session = %session.id(), url = %url, "navigate");
    bounded("navigation", limit, session.navigate(url, limit)).await?;
    Ok(StepOutput::default())
}
