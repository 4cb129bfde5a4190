use std::fmt;
use tracing::{info, warn};

/// Lifecycle of one flow run.
///
/// `NotStarted -> Running -> Completed`, or `NotStarted | Running ->
/// BrowserSetupFailed` when the session or the base URL cannot be had.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    NotStarted,
    Running,
    Completed,
    BrowserSetupFailed,
}

impl FlowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FlowState::Completed | FlowState::BrowserSetupFailed)
    }

    fn allows(self, next: FlowState) -> bool {
        matches!(
            (self, next),
            (FlowState::NotStarted, FlowState::Running)
                | (FlowState::NotStarted, FlowState::BrowserSetupFailed)
                | (FlowState::Running, FlowState::BrowserSetupFailed)
                | (FlowState::Running, FlowState::Completed)
        )
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FlowState::NotStarted => "not_started",
            FlowState::Running => "running",
            FlowState::Completed => "completed",
            FlowState::BrowserSetupFailed => "browser_setup_failed",
        };
        f.write_str(label)
    }
}

/// Tracks and logs the state of a single run.
#[derive(Debug)]
pub(crate) struct RunState {
    flow: String,
    state: FlowState,
}

impl RunState {
    pub(crate) fn new(flow: &str) -> Self {
        Self {
            flow: flow.to_string(),
            state: FlowState::NotStarted,
        }
    }

    pub(crate) fn current(&self) -> FlowState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: FlowState) {
        if !self.state.allows(next) {
            warn!(flow = %self.flow, from = %self.state, to = %next, "unexpected flow state transition");
        }
        info!(flow = %self.flow, from = %self.state, to = %next, "flow state");
        self.state = next;
    }
}
