//! Scripted in-process browser.
//!
//! Behaves like a well-mannered page: every selector resolves and every URL
//! loads unless the [`Script`] says otherwise. Sessions report launches,
//! closes and the peak number of simultaneously open sessions through
//! [`SessionStats`].

use async_trait::async_trait;
use flowguard_core_types::Viewport;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{AdapterError, AdapterErrorKind};
use crate::session::{BrowserLauncher, BrowserSession};

/// A 1x1 transparent PNG.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Clone, Debug)]
pub struct Script {
    pub fail_launch: bool,
    pub failing_urls: HashSet<String>,
    pub missing_selectors: HashSet<String>,
    /// Selector whose click panics, simulating a crashing automation layer.
    pub panicking_selector: Option<String>,
    pub screenshot: Vec<u8>,
    /// Artificial latency added to navigations.
    pub navigation_delay: Duration,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            fail_launch: false,
            failing_urls: HashSet::new(),
            missing_selectors: HashSet::new(),
            panicking_selector: None,
            screenshot: TINY_PNG.to_vec(),
            navigation_delay: Duration::ZERO,
        }
    }
}

impl Script {
    pub fn failing_launch() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    pub fn with_failing_url(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }

    pub fn with_missing_selector(mut self, selector: impl Into<String>) -> Self {
        self.missing_selectors.insert(selector.into());
        self
    }

    pub fn with_panicking_selector(mut self, selector: impl Into<String>) -> Self {
        self.panicking_selector = Some(selector.into());
        self
    }

    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = png;
        self
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
pub struct SessionStats {
    launched: AtomicUsize,
    closed: AtomicUsize,
    live: AtomicUsize,
    peak_live: AtomicUsize,
    calls: Mutex<Vec<String>>,
    viewports: Mutex<Vec<Viewport>>,
}

impl SessionStats {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    /// Every primitive call in order, e.g. `click:#buy`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn viewports(&self) -> Vec<Viewport> {
        self.viewports.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }

    fn opened(&self, viewport: Viewport) {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(live, Ordering::SeqCst);
        self.viewports.lock().push(viewport);
    }

    fn released(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct ScriptedLauncher {
    script: Arc<Script>,
    stats: Arc<SessionStats>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    async fn launch(&self, viewport: Viewport) -> Result<Box<dyn BrowserSession>, AdapterError> {
        if self.script.fail_launch {
            return Err(AdapterError::new(AdapterErrorKind::Launch).with_hint("scripted launch failure"));
        }
        let index = self.stats.launched();
        self.stats.opened(viewport);
        Ok(Box::new(ScriptedSession {
            id: format!("scripted-{index}"),
            script: Arc::clone(&self.script),
            stats: Arc::clone(&self.stats),
        }))
    }
}

pub struct ScriptedSession {
    id: String,
    script: Arc<Script>,
    stats: Arc<SessionStats>,
}

impl ScriptedSession {
    fn resolve(&self, selector: &str) -> Result<(), AdapterError> {
        if self.script.missing_selectors.contains(selector) {
            return Err(AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint(selector.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, limit: Duration) -> Result<(), AdapterError> {
        self.stats.record(format!("navigate:{url}"));
        if !self.script.navigation_delay.is_zero() {
            timeout(limit, tokio::time::sleep(self.script.navigation_delay))
                .await
                .map_err(|_| {
                    AdapterError::new(AdapterErrorKind::NavTimeout)
                        .with_hint(format!("{url} did not settle within {}ms", limit.as_millis()))
                })?;
        }
        if self.script.failing_urls.contains(url) {
            return Err(AdapterError::new(AdapterErrorKind::Navigation).with_hint(format!("net::ERR_NAME_NOT_RESOLVED at {url}")));
        }
        Ok(())
    }

    async fn click(&self, selector: &str, _limit: Duration) -> Result<(), AdapterError> {
        self.stats.record(format!("click:{selector}"));
        if self.script.panicking_selector.as_deref() == Some(selector) {
            panic!("scripted panic while clicking {selector}");
        }
        self.resolve(selector)
    }

    async fn fill(&self, selector: &str, text: &str, _limit: Duration) -> Result<(), AdapterError> {
        self.stats.record(format!("fill:{selector}={text}"));
        self.resolve(selector)
    }

    async fn screenshot(&self, _limit: Duration) -> Result<Vec<u8>, AdapterError> {
        self.stats.record("screenshot".to_string());
        Ok(self.script.screenshot.clone())
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), AdapterError> {
        self.stats.record(format!("scroll:{delta_y}"));
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), AdapterError> {
        self.stats.record("close".to_string());
        self.stats.released();
        Ok(())
    }
}
