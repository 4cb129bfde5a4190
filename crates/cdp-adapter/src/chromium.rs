//! Chromium-backed sessions driven over the DevTools Protocol.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeLaunchConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport as ChromeViewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use flowguard_core_types::Viewport;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BrowserConfig;
use crate::error::{AdapterError, AdapterErrorKind};
use crate::session::{BrowserLauncher, BrowserSession};

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl From<CdpError> for AdapterError {
    fn from(err: CdpError) -> Self {
        AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
    }
}

/// Launches one headless (or headful) Chromium process per session.
#[derive(Clone, Debug, Default)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    fn launch_config(&self, viewport: Viewport) -> Result<ChromeLaunchConfig, AdapterError> {
        let mut builder = ChromeLaunchConfig::builder()
            .window_size(viewport.width, viewport.height)
            .viewport(ChromeViewport {
                width: viewport.width,
                height: viewport.height,
                ..ChromeViewport::default()
            });
        if !self.config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = self.config.resolve_executable() {
            builder = builder.chrome_executable(executable);
        }
        if let Some(dir) = &self.config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        builder
            .build()
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn BrowserSession>, AdapterError> {
        let launch_config = self.launch_config(viewport)?;
        let launch_timeout = self.config.launch_timeout();

        let (browser, mut handler) = timeout(launch_timeout, Browser::launch(launch_config))
            .await
            .map_err(|_| {
                AdapterError::new(AdapterErrorKind::Launch).with_hint(format!(
                    "chromium did not start within {}ms",
                    launch_timeout.as_millis()
                ))
            })?
            .map_err(|err| AdapterError::new(AdapterErrorKind::Launch).with_hint(err.to_string()))?;

        let id = Uuid::new_v4().to_string();
        let handler_id = id.clone();
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(session = %handler_id, "cdp handler event error: {}", err);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                let session = ChromiumSession {
                    id,
                    browser,
                    page: None,
                    handler,
                };
                let hint = err.to_string();
                if let Err(close_err) = Box::new(session).close().await {
                    warn!("failed to close half-open chromium session: {}", close_err);
                }
                return Err(AdapterError::new(AdapterErrorKind::Launch).with_hint(hint));
            }
        };

        info!(
            session = %id,
            width = viewport.width,
            height = viewport.height,
            "Chromium session launched"
        );
        Ok(Box::new(ChromiumSession {
            id,
            browser,
            page: Some(page),
            handler,
        }))
    }
}

pub struct ChromiumSession {
    id: String,
    browser: Browser,
    page: Option<Page>,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, AdapterError> {
        self.page
            .as_ref()
            .ok_or_else(|| AdapterError::new(AdapterErrorKind::Closed))
    }

    /// Poll for `selector` until it resolves or `limit` elapses.
    async fn wait_for_element(&self, selector: &str, limit: Duration) -> Result<Element, AdapterError> {
        let page = self.page()?;
        let deadline = Instant::now() + limit;
        loop {
            match page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(err) if Instant::now() >= deadline => {
                    return Err(AdapterError::new(AdapterErrorKind::TargetNotFound)
                        .with_hint(format!("{selector} ({err})")));
                }
                Err(_) => sleep(ELEMENT_POLL_INTERVAL).await,
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, limit: Duration) -> Result<(), AdapterError> {
        let page = self.page()?;
        debug!(session = %self.id, url = %url, "navigating");
        timeout(limit, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        })
        .await
        .map_err(|_| {
            AdapterError::new(AdapterErrorKind::NavTimeout)
                .with_hint(format!("{url} did not settle within {}ms", limit.as_millis()))
        })?
        .map_err(|err| AdapterError::new(AdapterErrorKind::Navigation).with_hint(err.to_string()))
    }

    async fn click(&self, selector: &str, limit: Duration) -> Result<(), AdapterError> {
        let started = Instant::now();
        let element = self.wait_for_element(selector, limit).await?;
        let remaining = limit.saturating_sub(started.elapsed());
        timeout(remaining, element.click())
            .await
            .map_err(|_| AdapterError::timeout("click", limit.as_millis()))??;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str, limit: Duration) -> Result<(), AdapterError> {
        let started = Instant::now();
        let element = self.wait_for_element(selector, limit).await?;
        let remaining = limit.saturating_sub(started.elapsed());
        timeout(remaining, async {
            element.click().await?;
            element
                .call_js_fn("function() { this.value = ''; }", false)
                .await?;
            element.type_str(text).await?;
            Ok::<(), CdpError>(())
        })
        .await
        .map_err(|_| AdapterError::timeout("fill", limit.as_millis()))??;
        Ok(())
    }

    async fn screenshot(&self, limit: Duration) -> Result<Vec<u8>, AdapterError> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let bytes = timeout(limit, page.screenshot(params))
            .await
            .map_err(|_| AdapterError::timeout("screenshot", limit.as_millis()))??;
        Ok(bytes)
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), AdapterError> {
        self.page()?
            .evaluate(format!("window.scrollBy(0, {delta_y})"))
            .await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), AdapterError> {
        let ChromiumSession {
            id,
            mut browser,
            page,
            handler,
        } = *self;

        if let Some(page) = page {
            if let Err(err) = page.close().await {
                debug!(session = %id, "page close failed: {}", err);
            }
        }
        let closed = browser.close().await.map(|_| ());
        if let Err(err) = browser.wait().await {
            debug!(session = %id, "waiting for chromium exit failed: {}", err);
        }
        handler.abort();
        info!(session = %id, "Chromium session closed");
        closed.map_err(AdapterError::from)
    }
}
