//! Flow runner implementation

use action_primitives::execute;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cdp_adapter::{BrowserLauncher, BrowserSession};
use chrono::Utc;
use flowguard_core_types::{
    AssertionRecord, FailureKind, FlowDefinition, FlowRunResult, Step, StepAction, StepResult,
    Viewport,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vision_cache::CachedVisionJudge;

use crate::errors::BrowserSetupError;
use crate::recorder::RunRecorder;
use crate::state::{FlowState, RunState};

pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, Debug)]
pub struct RunnerSettings {
    /// Each run writes its screenshots to `{output_dir}/{flow}-{epoch_ms}-{run}`,
    /// where `run` is the first eight hex digits of the run id.
    pub output_dir: PathBuf,
    /// Budget for loading the flow's base URL.
    pub navigation_timeout: Duration,
    pub default_viewport: Viewport,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("test-results"),
            navigation_timeout: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
            default_viewport: Viewport::default(),
        }
    }
}

/// Runs single flows. Cheap to clone and safe to share between workers;
/// every run gets its own session.
#[derive(Clone)]
pub struct FlowRunner {
    launcher: Arc<dyn BrowserLauncher>,
    settings: RunnerSettings,
    judge: Option<Arc<CachedVisionJudge>>,
    recorder: Option<Arc<dyn RunRecorder>>,
}

impl FlowRunner {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, settings: RunnerSettings) -> Self {
        Self {
            launcher,
            settings,
            judge: None,
            recorder: None,
        }
    }

    /// Judge `assert` on screenshot steps through the cache.
    pub fn with_judge(mut self, judge: Arc<CachedVisionJudge>) -> Self {
        self.judge = Some(judge);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn RunRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Run `flow` to completion. Never fails: invalid definitions, setup
    /// problems, step faults and panics in the automation layer all end up
    /// in the result.
    pub async fn run(&self, flow: &FlowDefinition) -> FlowRunResult {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut state = RunState::new(&flow.name);
        info!(flow = %flow.name, url = %flow.url, steps = flow.steps.len(), run = %run_id, "Starting flow");

        let steps = if let Err(err) = flow.validate() {
            warn!(flow = %flow.name, error = %err, "Rejecting invalid flow definition");
            vec![StepResult::new(0, StepAction::Navigate)
                .with_failure(FailureKind::Configuration, format!("invalid flow: {err}"))]
        } else {
            match self.open_session(flow, &mut state).await {
                Ok(session) => {
                    let artifact_dir =
                        self.artifact_dir(&flow.name, started_at.timestamp_millis(), run_id);
                    let steps = self.run_steps(session.as_ref(), flow, &artifact_dir).await;
                    release(session, &flow.name).await;
                    state.advance(FlowState::Completed);
                    steps
                }
                Err(err) => {
                    warn!(flow = %flow.name, error = %err, "Browser setup failed");
                    state.advance(FlowState::BrowserSetupFailed);
                    vec![StepResult::new(0, StepAction::Navigate)
                        .with_failure(FailureKind::BrowserSetup, err.to_string())
                        .with_duration(clock.elapsed().as_millis() as u64)]
                }
            }
        };

        let result = FlowRunResult::from_steps(
            flow.name.clone(),
            steps,
            started_at,
            Utc::now(),
            clock.elapsed().as_millis() as u64,
        )
        .with_run_id(run_id);
        info!(
            flow = %flow.name,
            state = %state.current(),
            verdict = %result.verdict,
            steps = result.steps.len(),
            duration_ms = result.duration_ms,
            "Flow finished"
        );

        if let Some(recorder) = &self.recorder {
            if let Err(err) = recorder.record(&result).await {
                warn!(flow = %flow.name, error = %err, "Failed to record run result");
            }
        }
        result
    }

    /// Launch a session and load the base URL. On failure the session, if
    /// any, is already released.
    async fn open_session(
        &self,
        flow: &FlowDefinition,
        state: &mut RunState,
    ) -> Result<Box<dyn BrowserSession>, BrowserSetupError> {
        let viewport = flow.viewport_or(self.settings.default_viewport);
        let session = AssertUnwindSafe(self.launcher.launch(viewport))
            .catch_unwind()
            .await
            .map_err(|panic| BrowserSetupError::Panicked(panic_message(panic)))?
            .map_err(BrowserSetupError::Launch)?;
        state.advance(FlowState::Running);

        let limit = self.settings.navigation_timeout;
        let navigation = AssertUnwindSafe(timeout(limit, session.navigate(&flow.url, limit)))
            .catch_unwind()
            .await;
        let failure = match navigation {
            Ok(Ok(Ok(()))) => return Ok(session),
            Ok(Ok(Err(err))) => BrowserSetupError::InitialNavigation {
                url: flow.url.clone(),
                reason: err.to_string(),
            },
            Ok(Err(_)) => BrowserSetupError::InitialNavigation {
                url: flow.url.clone(),
                reason: format!("timed out after {}ms", limit.as_millis()),
            },
            Err(panic) => BrowserSetupError::Panicked(panic_message(panic)),
        };
        release(session, &flow.name).await;
        Err(failure)
    }

    /// Declared steps in order, stopping after the first failure.
    async fn run_steps(
        &self,
        session: &dyn BrowserSession,
        flow: &FlowDefinition,
        artifact_dir: &Path,
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(flow.steps.len());
        for (index, step) in flow.steps.iter().enumerate() {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(self.run_step(session, step, index, artifact_dir))
                .catch_unwind()
                .await;
            let result = outcome.unwrap_or_else(|panic| {
                let message = panic_message(panic);
                warn!(flow = %flow.name, step = index, panic = %message, "Step panicked");
                StepResult::new(index, step.action.clone())
                    .with_failure(FailureKind::Execution, format!("automation layer panicked: {message}"))
                    .with_duration(started.elapsed().as_millis() as u64)
            });

            let failed = !result.success;
            results.push(result);
            if failed {
                debug!(
                    flow = %flow.name,
                    step = index,
                    skipped = flow.steps.len() - index - 1,
                    "Stopping at first failed step"
                );
                break;
            }
        }
        results
    }

    async fn run_step(
        &self,
        session: &dyn BrowserSession,
        step: &Step,
        index: usize,
        artifact_dir: &Path,
    ) -> StepResult {
        let result = execute(session, step, index, artifact_dir).await;
        let Some(assertion) = step.assertion.as_deref() else {
            return result;
        };
        if step.action != StepAction::Screenshot {
            debug!(step = index, action = %step.action, "Ignoring assert on non-screenshot step");
            return result;
        }
        if !result.success {
            return result;
        }
        self.check_assertion(result, assertion).await
    }

    async fn check_assertion(&self, result: StepResult, assertion: &str) -> StepResult {
        let Some(judge) = &self.judge else {
            warn!(step = result.step_index, assertion = %assertion, "No vision judge configured, skipping assertion");
            return result;
        };
        let started = Instant::now();
        let decoded = result
            .screenshot_base64
            .as_deref()
            .map(|data| STANDARD.decode(data));
        let png = match decoded {
            Some(Ok(png)) => png,
            Some(Err(err)) => {
                return result.with_failure(
                    FailureKind::Execution,
                    format!("screenshot payload is not valid base64: {err}"),
                )
            }
            None => {
                return result
                    .with_failure(FailureKind::Execution, "screenshot step produced no artifact")
            }
        };

        let judged = judge.judge(&png, assertion).await;
        let duration_ms = result.duration_ms + started.elapsed().as_millis() as u64;
        let result = result.with_duration(duration_ms);
        match judged {
            Ok(outcome) => {
                let passed = outcome.judgment.verdict;
                debug!(
                    step = result.step_index,
                    passed,
                    confidence = outcome.judgment.confidence,
                    cache_hit = outcome.cache_hit,
                    "Assertion judged"
                );
                let reasoning = outcome.judgment.reasoning.clone();
                let result = result.with_assertion(AssertionRecord {
                    assertion: assertion.to_string(),
                    passed,
                    confidence: outcome.judgment.confidence,
                    reasoning: outcome.judgment.reasoning,
                    cache_hit: outcome.cache_hit,
                });
                if passed {
                    result
                } else {
                    result.with_failure(
                        FailureKind::Assertion,
                        format!("assertion failed: {assertion} ({reasoning})"),
                    )
                }
            }
            Err(err) => result.with_failure(
                FailureKind::Execution,
                format!("vision judgment failed: {err}"),
            ),
        }
    }

    fn artifact_dir(&self, flow_name: &str, epoch_millis: i64, run_id: Uuid) -> PathBuf {
        let run = run_id.simple().to_string();
        self.settings
            .output_dir
            .join(format!("{}-{epoch_millis}-{}", path_safe(flow_name), &run[..8]))
    }
}

async fn release(session: Box<dyn BrowserSession>, flow: &str) {
    let id = session.id().to_string();
    match AssertUnwindSafe(session.close()).catch_unwind().await {
        Ok(Ok(())) => debug!(flow = %flow, session = %id, "Session released"),
        Ok(Err(err)) => warn!(flow = %flow, session = %id, error = %err, "Session close failed"),
        Err(panic) => warn!(flow = %flow, session = %id, panic = %panic_message(panic), "Session close panicked"),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Flow names become directory names.
fn path_safe(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}
