//! Flow execution error types

use cdp_adapter::AdapterError;
use thiserror::Error;

/// The flow never got to its first declared step.
#[derive(Debug, Error)]
pub enum BrowserSetupError {
    /// No session could be allocated
    #[error("browser launch failed: {0}")]
    Launch(AdapterError),

    /// The base URL did not load
    #[error("initial navigation to {url} failed: {reason}")]
    InitialNavigation { url: String, reason: String },

    /// The automation layer panicked during setup
    #[error("browser setup panicked: {0}")]
    Panicked(String),
}
