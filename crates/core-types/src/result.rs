//! Step and flow run results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

use crate::step::StepAction;

/// Why a step did not succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A field the action needs was missing.
    Configuration,
    /// The browser reported a runtime failure (selector not found, timeout, navigation error).
    Execution,
    /// The action string is not one the executor knows.
    UnknownAction,
    /// The session could not be allocated or the base URL did not load.
    BrowserSetup,
    /// A vision assertion was judged and did not hold.
    Assertion,
}

impl FailureKind {
    pub fn is_assertion(self) -> bool {
        matches!(self, FailureKind::Assertion)
    }
}

/// Outcome of a vision assertion attached to a screenshot step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRecord {
    pub assertion: String,
    pub passed: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub cache_hit: bool,
}

/// Result of executing one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step_index: usize,
    pub action: StepAction,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_base64: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<AssertionRecord>,
}

impl StepResult {
    /// Create a pending result; callers mark it with [`with_success`](Self::with_success)
    /// or [`with_failure`](Self::with_failure).
    pub fn new(step_index: usize, action: StepAction) -> Self {
        Self {
            step_index,
            action,
            success: false,
            screenshot_path: None,
            screenshot_base64: None,
            duration_ms: 0,
            error: None,
            failure: None,
            assertion: None,
        }
    }

    pub fn with_success(mut self) -> Self {
        self.success = true;
        self.error = None;
        self.failure = None;
        self
    }

    pub fn with_failure(mut self, kind: FailureKind, error: impl Into<String>) -> Self {
        self.success = false;
        self.failure = Some(kind);
        self.error = Some(error.into());
        self
    }

    pub fn with_screenshot(mut self, path: PathBuf, base64: String) -> Self {
        self.screenshot_path = Some(path);
        self.screenshot_base64 = Some(base64);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_assertion(mut self, record: AssertionRecord) -> Self {
        self.assertion = Some(record);
        self
    }

    /// Failed for a reason other than a judged assertion mismatch.
    pub fn is_execution_fault(&self) -> bool {
        !self.success && !self.failure.map(FailureKind::is_assertion).unwrap_or(false)
    }
}

/// Summary judgement of a flow run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
    Error,
}

impl Verdict {
    /// `error` if any step hit an execution fault, `pass` if every attempted
    /// step succeeded, `fail` otherwise.
    pub fn from_steps(steps: &[StepResult]) -> Self {
        if steps.iter().any(StepResult::is_execution_fault) {
            Verdict::Error
        } else if steps.iter().all(|step| step.success) {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
            Verdict::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pass" => Some(Verdict::Pass),
            "fail" => Some(Verdict::Fail),
            "error" => Some(Verdict::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one flow run. Built once by the orchestrator, never mutated after.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRunResult {
    pub run_id: Uuid,
    pub flow_name: String,
    pub verdict: Verdict,
    pub steps: Vec<StepResult>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl FlowRunResult {
    /// Derive the verdict from `steps` and close the run at `completed_at`.
    pub fn from_steps(
        flow_name: impl Into<String>,
        steps: Vec<StepResult>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            flow_name: flow_name.into(),
            verdict: Verdict::from_steps(&steps),
            steps,
            duration_ms,
            started_at,
            completed_at,
        }
    }

    /// Keep the id the run was started under, e.g. when it already names
    /// the run's artifact directory.
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|step| !step.success)
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(index: usize) -> StepResult {
        StepResult::new(index, StepAction::Click).with_success()
    }

    #[test]
    fn verdict_pass_when_all_steps_succeed() {
        assert_eq!(Verdict::from_steps(&[ok(0), ok(1)]), Verdict::Pass);
    }

    #[test]
    fn verdict_fail_on_assertion_mismatch() {
        let judged = StepResult::new(1, StepAction::Screenshot)
            .with_failure(FailureKind::Assertion, "banner missing");
        assert_eq!(Verdict::from_steps(&[ok(0), judged]), Verdict::Fail);
    }

    #[test]
    fn verdict_error_on_execution_fault() {
        let fault = StepResult::new(1, StepAction::Click)
            .with_failure(FailureKind::Execution, "selector #buy not found");
        assert_eq!(Verdict::from_steps(&[ok(0), fault]), Verdict::Error);
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(ok(3).with_duration(12)).unwrap();
        assert_eq!(value["stepIndex"], 3);
        assert_eq!(value["durationMs"], 12);
        assert!(value.get("error").is_none());
        assert_eq!(
            serde_json::to_value(Verdict::Error).unwrap(),
            serde_json::json!("error")
        );
    }
}
