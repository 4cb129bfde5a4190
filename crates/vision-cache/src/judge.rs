use async_trait::async_trait;

use crate::errors::VisionError;
use crate::models::VisionJudgment;

/// External vision-inference service.
///
/// `model` and `prompt_version` are part of the cache key: changing either
/// must never serve a verdict produced by the other.
#[async_trait]
pub trait VisionJudge: Send + Sync {
    fn model(&self) -> &str;

    fn prompt_version(&self) -> &str;

    /// Decide whether `assertion` holds for the PNG screenshot.
    async fn judge(&self, screenshot_png: &[u8], assertion: &str)
        -> Result<VisionJudgment, VisionError>;
}
