//! Wait primitive - pause for the step timeout

use cdp_adapter::BrowserSession;
use flowguard_core_types::Step;

use super::StepOutput;
use crate::errors::StepError;

pub(crate) async fn execute_wait(
    session: &dyn BrowserSession,
    step: &Step,
) -> Result<StepOutput, StepError> {
    session.wait(step.timeout()).await;
    Ok(StepOutput::default())
}
