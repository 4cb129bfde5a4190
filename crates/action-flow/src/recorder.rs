use async_trait::async_trait;
use flowguard_core_types::FlowRunResult;
use flowguard_flow_store::FlowRepository;

/// Persists finished runs. Failures are logged by the runner and never
/// change a verdict.
#[async_trait]
pub trait RunRecorder: Send + Sync {
    async fn record(&self, result: &FlowRunResult) -> anyhow::Result<()>;
}

/// Records runs into the `flow_runs` table.
#[derive(Clone)]
pub struct RepositoryRecorder {
    repository: FlowRepository,
}

impl RepositoryRecorder {
    pub fn new(repository: FlowRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl RunRecorder for RepositoryRecorder {
    async fn record(&self, result: &FlowRunResult) -> anyhow::Result<()> {
        let repository = self.repository.clone();
        let result = result.clone();
        tokio::task::spawn_blocking(move || repository.record_run(&result)).await??;
        Ok(())
    }
}
