//! Flow definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::step::Step;

/// Browser viewport in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const MIN_WIDTH: u32 = 320;
    pub const MIN_HEIGHT: u32 = 240;
    pub const MAX_WIDTH: u32 = 7680;
    pub const MAX_HEIGHT: u32 = 4320;

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<(), FlowDefinitionError> {
        if self.width < Self::MIN_WIDTH || self.height < Self::MIN_HEIGHT {
            return Err(FlowDefinitionError::ViewportTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > Self::MAX_WIDTH || self.height > Self::MAX_HEIGHT {
            return Err(FlowDefinitionError::ViewportTooLarge {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowDefinitionError {
    #[error("flow name cannot be empty")]
    EmptyName,
    #[error("flow '{0}' has an empty url")]
    EmptyUrl(String),
    #[error("flow '{0}' declares no steps")]
    NoSteps(String),
    #[error(
        "viewport {width}x{height} is below the minimum of {}x{}",
        Viewport::MIN_WIDTH,
        Viewport::MIN_HEIGHT
    )]
    ViewportTooSmall { width: u32, height: u32 },
    #[error(
        "viewport {width}x{height} exceeds the maximum of {}x{}",
        Viewport::MAX_WIDTH,
        Viewport::MAX_HEIGHT
    )]
    ViewportTooLarge { width: u32, height: u32 },
}

/// A named, ordered sequence of browser steps against a base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    pub name: String,

    /// What the flow is meant to prove, in plain language.
    #[serde(default)]
    pub intent: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,

    pub steps: Vec<Step>,
}

impl FlowDefinition {
    pub fn new(name: impl Into<String>, url: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            intent: String::new(),
            url: url.into(),
            viewport: None,
            steps,
        }
    }

    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    /// Structural checks applied when a flow is loaded or saved.
    ///
    /// Per-step requirements (a `navigate` without a target, unknown actions)
    /// are not checked here; the step executor reports those as step failures.
    pub fn validate(&self) -> Result<(), FlowDefinitionError> {
        if self.name.trim().is_empty() {
            return Err(FlowDefinitionError::EmptyName);
        }
        if self.url.trim().is_empty() {
            return Err(FlowDefinitionError::EmptyUrl(self.name.clone()));
        }
        if self.steps.is_empty() {
            return Err(FlowDefinitionError::NoSteps(self.name.clone()));
        }
        if let Some(viewport) = &self.viewport {
            viewport.validate()?;
        }
        Ok(())
    }

    pub fn viewport_or(&self, fallback: Viewport) -> Viewport {
        self.viewport.unwrap_or(fallback)
    }
}
