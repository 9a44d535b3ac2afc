use crate::registry::ExecutorRegistry;
use crate::report::{ResultCallback, RunSummary};
use crate::scheduler::Scheduler;
use craftcore::{
    CancellationToken, CredentialStore, EngineError, EventBus, ExecutionEvent, GraphError,
    PipelineSpec,
};
use std::sync::Arc;

/// Main entry point for executing pipelines.
///
/// Owns the executor registry and the event bus. Structural validation and
/// settings-schema validation run synchronously before anything is
/// dispatched; a pipeline that fails either never starts.
pub struct PipelineRuntime {
    registry: Arc<ExecutorRegistry>,
    event_bus: Arc<EventBus>,
}

impl PipelineRuntime {
    pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
        Self::with_event_capacity(registry, 1024)
    }

    pub fn with_event_capacity(registry: Arc<ExecutorRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            event_bus: Arc::new(EventBus::new(capacity)),
        }
    }

    pub fn registry(&self) -> &Arc<ExecutorRegistry> {
        &self.registry
    }

    /// Subscribe to the run event stream
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    /// Execute a pipeline to completion and return the aggregate report.
    ///
    /// `on_result` is invoked once per node as it reaches a terminal state,
    /// in completion order. The credentials bag is forwarded read-only to
    /// every executor.
    pub async fn execute(
        &self,
        pipeline: &PipelineSpec,
        on_result: Option<ResultCallback>,
        credentials: CredentialStore,
    ) -> Result<RunSummary, EngineError> {
        self.execute_with_cancellation(pipeline, on_result, credentials, CancellationToken::new())
            .await
    }

    /// As `execute`, with an external cancellation signal. After cancellation
    /// is observed no new node is dispatched; in-flight executors receive a
    /// best-effort abort via a child token and already-terminal nodes keep
    /// their results.
    pub async fn execute_with_cancellation(
        &self,
        pipeline: &PipelineSpec,
        on_result: Option<ResultCallback>,
        credentials: CredentialStore,
        cancellation: CancellationToken,
    ) -> Result<RunSummary, EngineError> {
        pipeline.validate()?;
        self.validate_settings(pipeline)?;

        let scheduler = Scheduler::new(self.registry.clone(), self.event_bus.clone());
        Ok(scheduler
            .run(pipeline, on_result, Arc::new(credentials), cancellation)
            .await)
    }

    /// Check every node's settings against the schema its executor declares.
    /// A type id with no registered executor is not a settings error; it
    /// surfaces at dispatch as a node-level failure.
    fn validate_settings(&self, pipeline: &PipelineSpec) -> Result<(), GraphError> {
        for node in &pipeline.nodes {
            if let Ok(executor) = self.registry.resolve(&node.type_id) {
                executor.schema().validate(&node.id, &node.settings)?;
            }
        }
        Ok(())
    }
}
