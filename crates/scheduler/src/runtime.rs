use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use flowguard_core_types::{FailureKind, FlowDefinition, FlowRunResult, StepAction, StepResult};
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::FlowRun;
use crate::error::SchedulerError;
use crate::metrics;
use crate::model::{ScheduleReport, SchedulerConfig};

type FlowQueue = Arc<Mutex<VecDeque<(usize, FlowDefinition)>>>;
type ResultSlots = Arc<Mutex<Vec<Option<FlowRunResult>>>>;

/// Fixed-size worker pool over a shared flow queue.
#[derive(Clone)]
pub struct FlowScheduler {
    runner: Arc<dyn FlowRun>,
    config: SchedulerConfig,
}

impl FlowScheduler {
    pub fn new(runner: Arc<dyn FlowRun>, config: SchedulerConfig) -> Result<Self, SchedulerError> {
        if config.concurrency == 0 {
            return Err(SchedulerError::ZeroConcurrency);
        }
        Ok(Self { runner, config })
    }

    pub fn concurrency(&self) -> usize {
        self.config.concurrency
    }

    /// Run every flow and return exactly one result per flow, in input
    /// order. Verdicts and panics inside a run never stop the pool.
    pub async fn run_all(&self, flows: Vec<FlowDefinition>) -> ScheduleReport {
        if flows.is_empty() {
            return ScheduleReport::default();
        }
        let started = Instant::now();
        let total = flows.len();
        let names: Vec<String> = flows.iter().map(|flow| flow.name.clone()).collect();
        let workers = self.config.concurrency.min(total);
        info!(flows = total, workers, "Scheduling flows");

        let queue: FlowQueue = Arc::new(Mutex::new(flows.into_iter().enumerate().collect()));
        let slots: ResultSlots = Arc::new(Mutex::new(vec![None; total]));

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            set.spawn(worker_loop(
                worker_id,
                Arc::clone(&self.runner),
                Arc::clone(&queue),
                Arc::clone(&slots),
            ));
        }
        while let Some(joined) = set.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "scheduler worker ended abnormally");
            }
        }

        let slots = std::mem::take(&mut *slots.lock());
        let results = slots
            .into_iter()
            .zip(names)
            .map(|(slot, name)| {
                slot.unwrap_or_else(|| synthetic_error(&name, "flow was never completed by a worker"))
            })
            .collect();

        let report = ScheduleReport {
            results,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        let counts = report.counts();
        info!(
            pass = counts.pass,
            fail = counts.fail,
            error = counts.error,
            duration_ms = report.duration_ms,
            "Scheduled flows finished"
        );
        report
    }
}

async fn worker_loop(worker_id: usize, runner: Arc<dyn FlowRun>, queue: FlowQueue, slots: ResultSlots) {
    debug!(worker = worker_id, "worker started");
    loop {
        // the lock is released before the run starts
        let next = queue.lock().pop_front();
        let Some((index, flow)) = next else {
            break;
        };

        metrics::record_dispatched(&flow.name);
        debug!(worker = worker_id, flow = %flow.name, index, "worker picked flow");
        let result = match AssertUnwindSafe(runner.run(&flow)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic);
                warn!(worker = worker_id, flow = %flow.name, panic = %message, "flow run panicked");
                metrics::record_panicked(&flow.name);
                synthetic_error(&flow.name, &format!("flow runner panicked: {message}"))
            }
        };
        metrics::record_completed(&flow.name, result.verdict);
        slots.lock()[index] = Some(result);
    }
    debug!(worker = worker_id, "worker drained queue");
}

fn synthetic_error(flow_name: &str, reason: &str) -> FlowRunResult {
    let now = Utc::now();
    let step = StepResult::new(0, StepAction::Navigate).with_failure(FailureKind::Execution, reason);
    FlowRunResult::from_steps(flow_name, vec![step], now, now, 0)
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

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl FlowRun for Echo {
        async fn run(&self, flow: &FlowDefinition) -> FlowRunResult {
            let now = Utc::now();
            FlowRunResult::from_steps(flow.name.clone(), Vec::new(), now, now, 0)
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = FlowScheduler::new(Arc::new(Echo), SchedulerConfig { concurrency: 0 })
            .err()
            .unwrap();
        assert_eq!(err, SchedulerError::ZeroConcurrency);
    }

    #[tokio::test]
    async fn empty_batch_spawns_nothing() {
        let scheduler = FlowScheduler::new(Arc::new(Echo), SchedulerConfig::default()).unwrap();
        let report = scheduler.run_all(Vec::new()).await;
        assert!(report.is_empty());
    }

    #[test]
    fn synthetic_results_are_errors() {
        let result = synthetic_error("checkout", "boom");
        assert_eq!(result.verdict, flowguard_core_types::Verdict::Error);
        assert_eq!(result.steps[0].error.as_deref(), Some("boom"));
    }
}
