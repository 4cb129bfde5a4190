//! Screenshot primitive - capture the viewport into the artifact directory

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cdp_adapter::BrowserSession;
use chrono::Utc;
use flowguard_core_types::Step;
use std::path::Path;
use tracing::debug;

use super::{bounded, Capture, StepOutput};
use crate::errors::StepError;
use crate::executor::screenshot_file_name;

pub(crate) async fn execute_screenshot(
    session: &dyn BrowserSession,
    step: &Step,
    step_index: usize,
    artifact_dir: &Path,
) -> Result<StepOutput, StepError> {
    tokio::fs::create_dir_all(artifact_dir).await?;

    let png = bounded("screenshot", step.timeout(), session.screenshot(step.timeout())).await?;
    let path = artifact_dir.join(screenshot_file_name(step_index, Utc::now().timestamp_millis()));
    tokio::fs::write(&path, &png).await?;

    debug!(
        session = %session.id(),
        path = %path.display(),
        bytes = png.len(),
        "screenshot captured"
    );
    Ok(StepOutput {
        screenshot: Some(Capture {
            path,
            base64: STANDARD.encode(&png),
        }),
    })
}
