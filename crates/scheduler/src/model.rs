use flowguard_core_types::{FlowRunResult, Verdict};
use serde::Serialize;

pub const DEFAULT_CONCURRENCY: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Upper bound on flows (and browser sessions) in flight.
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    pub pass: usize,
    pub fail: usize,
    pub error: usize,
}

/// One result per input flow, in input order.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleReport {
    pub results: Vec<FlowRunResult>,
    pub duration_ms: u64,
}

impl ScheduleReport {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// First result for a flow name. Batches may repeat a name; use
    /// [`results`](Self::results) for positional access.
    pub fn get(&self, flow_name: &str) -> Option<&FlowRunResult> {
        self.results.iter().find(|result| result.flow_name == flow_name)
    }

    pub fn counts(&self) -> VerdictCounts {
        let mut counts = VerdictCounts::default();
        for result in &self.results {
            match result.verdict {
                Verdict::Pass => counts.pass += 1,
                Verdict::Fail => counts.fail += 1,
                Verdict::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(FlowRunResult::passed)
    }
}
