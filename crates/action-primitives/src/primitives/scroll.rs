//! Scroll primitive

use cdp_adapter::BrowserSession;
use flowguard_core_types::Step;
use tracing::{debug, warn};

use super::{bounded, StepOutput};
use crate::errors::StepError;

pub(crate) const DEFAULT_SCROLL_DELTA: i64 = 500;

pub(crate) async fn execute_scroll(
    session: &dyn BrowserSession,
    step: &Step,
) -> Result<StepOutput, StepError> {
    let delta = scroll_delta(step.value.as_deref());
    debug!(session = %session.id(), delta, "scroll");
    bounded("scroll", step.timeout(), session.scroll_by(delta)).await?;
    Ok(StepOutput::default())
}

/// Parse the scroll delta. Non-numeric values fall back to the default
/// with a warning rather than failing the step.
pub(crate) fn scroll_delta(value: Option<&str>) -> i64 {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return DEFAULT_SCROLL_DELTA;
    };
    match raw.parse::<i64>() {
        Ok(delta) => delta,
        Err(_) => {
            warn!(
                value = %raw,
                fallback = DEFAULT_SCROLL_DELTA,
                "scroll value is not an integer; using default delta"
            );
            DEFAULT_SCROLL_DELTA
        }
    }
}
