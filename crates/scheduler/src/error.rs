use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}
