use flowguard_core_types::Verdict;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct Counters {
    dispatched: AtomicU64,
    completed: AtomicU64,
    passed: AtomicU64,
    failed: AtomicU64,
    errored: AtomicU64,
    panicked: AtomicU64,
}

static COUNTERS: Lazy<Counters> = Lazy::new(Counters::default);

fn increment(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dispatched(_flow: &str) {
    increment(&COUNTERS.dispatched);
}

pub fn record_completed(_flow: &str, verdict: Verdict) {
    increment(&COUNTERS.completed);
    match verdict {
        Verdict::Pass => increment(&COUNTERS.passed),
        Verdict::Fail => increment(&COUNTERS.failed),
        Verdict::Error => increment(&COUNTERS.errored),
    }
}

pub fn record_panicked(_flow: &str) {
    increment(&COUNTERS.panicked);
}

#[derive(Clone, Debug, Default)]
pub struct SchedulerMetricsSnapshot {
    pub dispatched: u64,
    pub completed: u64,
    pub passed: u64,
    pub failed: u64,
    pub errored: u64,
    pub panicked: u64,
}

pub fn snapshot() -> SchedulerMetricsSnapshot {
    SchedulerMetricsSnapshot {
        dispatched: COUNTERS.dispatched.load(Ordering::Relaxed),
        completed: COUNTERS.completed.load(Ordering::Relaxed),
        passed: COUNTERS.passed.load(Ordering::Relaxed),
        failed: COUNTERS.failed.load(Ordering::Relaxed),
        errored: COUNTERS.errored.load(Ordering::Relaxed),
        panicked: COUNTERS.panicked.load(Ordering::Relaxed),
    }
}
