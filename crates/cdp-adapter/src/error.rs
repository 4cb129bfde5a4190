use std::fmt;
use thiserror::Error;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    Launch,
    #[error("navigation failed")]
    Navigation,
    #[error("navigation timed out")]
    NavTimeout,
    #[error("target element not found")]
    TargetNotFound,
    #[error("operation timed out")]
    Timeout,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("session closed")]
    Closed,
    #[error("internal error")]
    Internal,
}

/// Error returned by every browser primitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self { kind, hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn timeout(operation: &str, timeout_ms: u128) -> Self {
        Self::new(AdapterErrorKind::Timeout)
            .with_hint(format!("{operation} exceeded {timeout_ms}ms"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_hint() {
        let err = AdapterError::new(AdapterErrorKind::TargetNotFound).with_hint("#checkout");
        assert_eq!(err.to_string(), "target element not found: #checkout");
        assert_eq!(
            AdapterError::timeout("click", 500).to_string(),
            "operation timed out: click exceeded 500ms"
        );
    }
}
