use async_trait::async_trait;
use flowguard_core_types::Viewport;
use std::time::Duration;

use crate::error::AdapterError;

/// One exclusive browser page, owned by a single flow run.
///
/// Every interaction takes its own timeout; implementations fail with a
/// [`AdapterErrorKind::Timeout`](crate::AdapterErrorKind::Timeout) or
/// `TargetNotFound` error once it elapses instead of retrying.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Identifier used in logs.
    fn id(&self) -> &str;

    /// Load `url` and wait for the page to settle.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AdapterError>;

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), AdapterError>;

    /// Replace the content of the input matched by `selector` with `text`.
    async fn fill(&self, selector: &str, text: &str, timeout: Duration)
        -> Result<(), AdapterError>;

    /// Capture the viewport as PNG bytes.
    async fn screenshot(&self, timeout: Duration) -> Result<Vec<u8>, AdapterError>;

    /// Scroll the viewport vertically by `delta_y` pixels.
    async fn scroll_by(&self, delta_y: i64) -> Result<(), AdapterError>;

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Release the page and its browser process.
    async fn close(self: Box<Self>) -> Result<(), AdapterError>;
}

/// Allocates fresh sessions; never hands the same session out twice.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn BrowserSession>, AdapterError>;
}
