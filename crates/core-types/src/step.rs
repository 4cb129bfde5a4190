//! Step model as declared in flow files.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for navigate/click/type/screenshot/scroll steps.
pub const DEFAULT_INTERACTION_TIMEOUT_MS: u64 = 30_000;

/// Default duration of a `wait` step.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1_000;

/// Browser action requested by a step.
///
/// Parsing is lenient: an unrecognised action string is preserved in
/// [`StepAction::Other`] so the executor can report it as an unknown action
/// instead of the whole flow file failing to load.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    Navigate,
    Click,
    Type,
    Screenshot,
    Wait,
    Scroll,
    Other(String),
}

impl StepAction {
    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Navigate => "navigate",
            StepAction::Click => "click",
            StepAction::Type => "type",
            StepAction::Screenshot => "screenshot",
            StepAction::Wait => "wait",
            StepAction::Scroll => "scroll",
            StepAction::Other(raw) => raw.as_str(),
        }
    }

    /// `navigate`, `click` and `type` cannot run without a target.
    pub fn requires_target(&self) -> bool {
        matches!(
            self,
            StepAction::Navigate | StepAction::Click | StepAction::Type
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StepAction::Other(_))
    }
}

impl From<String> for StepAction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "navigate" => StepAction::Navigate,
            "click" => StepAction::Click,
            "type" => StepAction::Type,
            "screenshot" => StepAction::Screenshot,
            "wait" => StepAction::Wait,
            "scroll" => StepAction::Scroll,
            _ => StepAction::Other(raw),
        }
    }
}

impl From<&str> for StepAction {
    fn from(raw: &str) -> Self {
        StepAction::from(raw.to_string())
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        match action {
            StepAction::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared step of a flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub action: StepAction,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Free-form value. Flow files may write numbers here (scroll deltas),
    /// they are kept as their string form.
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,

    /// Natural-language assertion judged against a screenshot.
    #[serde(rename = "assert", default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,

    /// Timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Step {
    pub fn new(action: impl Into<StepAction>) -> Self {
        Self {
            action: action.into(),
            target: None,
            value: None,
            assertion: None,
            timeout: None,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        Self::new(StepAction::Navigate).with_target(url)
    }

    pub fn click(selector: impl Into<String>) -> Self {
        Self::new(StepAction::Click).with_target(selector)
    }

    pub fn type_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(StepAction::Type)
            .with_target(selector)
            .with_value(text)
    }

    pub fn screenshot() -> Self {
        Self::new(StepAction::Screenshot)
    }

    pub fn wait(ms: u64) -> Self {
        Self::new(StepAction::Wait).with_timeout(ms)
    }

    pub fn scroll(delta: i64) -> Self {
        Self::new(StepAction::Scroll).with_value(delta.to_string())
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertion = Some(assertion.into());
        self
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout = Some(timeout_ms);
        self
    }

    /// Declared timeout, or the per-action default.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.unwrap_or(match self.action {
            StepAction::Wait => DEFAULT_WAIT_TIMEOUT_MS,
            _ => DEFAULT_INTERACTION_TIMEOUT_MS,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms())
    }

    /// Target with surrounding whitespace removed; blank targets count as absent.
    pub fn target(&self) -> Option<&str> {
        self.target
            .as_deref()
            .map(str::trim)
            .filter(|target| !target.is_empty())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
