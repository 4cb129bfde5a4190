use action_flow::FlowRunner;
use async_trait::async_trait;
use flowguard_core_types::{FlowDefinition, FlowRunResult};

/// Something that can take a flow to a result.
#[async_trait]
pub trait FlowRun: Send + Sync {
    async fn run(&self, flow: &FlowDefinition) -> FlowRunResult;
}

#[async_trait]
impl FlowRun for FlowRunner {
    async fn run(&self, flow: &FlowDefinition) -> FlowRunResult {
        FlowRunner::run(self, flow).await
    }
}
