//! Browser session adapter for FlowGuard.
//!
//! Higher layers only see the [`BrowserLauncher`] and [`BrowserSession`]
//! traits. The Chromium DevTools Protocol implementation lives in
//! [`chromium`]; a scripted in-process browser for tests lives in `fake`
//! behind the `test-support` feature.

pub mod chromium;
pub mod config;
pub mod error;
pub mod session;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use chromium::ChromiumLauncher;
pub use config::BrowserConfig;
pub use error::{AdapterError, AdapterErrorKind};
pub use session::{BrowserLauncher, BrowserSession};
