use async_trait::async_trait;
use craftcore::{ExecutionContext, Executor, ExecutorError, Outputs, SettingSpec, SettingsSchema};
use tokio::time::{sleep, Duration};

/// Passthrough that waits before forwarding its inputs unchanged
pub struct DelayExecutor;

#[async_trait]
impl Executor for DelayExecutor {
    fn type_id(&self) -> &str {
        "time.delay"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new().with(SettingSpec::new("delay_ms", 1000.0))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        let delay_ms = ctx.setting_f64_or("delay_ms", 1000.0) as u64;

        ctx.events.info(format!("Delaying for {}ms", delay_ms));

        tokio::select! {
            _ = sleep(Duration::from_millis(delay_ms)) => {}
            _ = ctx.cancellation.cancelled() => return Err(ExecutorError::Cancelled),
        }

        let mut outputs = Outputs::new();
        for (port, value) in &ctx.inputs {
            outputs.insert(*port, value.clone());
        }
        Ok(outputs)
    }
}
