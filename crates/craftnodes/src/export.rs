use async_trait::async_trait;
use craftcore::{ExecutionContext, Executor, ExecutorError, Outputs, SettingSpec, SettingsSchema};

/// Markdown exporter: assembles whatever arrives on its input ports into
/// one document, sections in port order.
pub struct MarkdownExportExecutor;

#[async_trait]
impl Executor for MarkdownExportExecutor {
    fn type_id(&self) -> &str {
        "export.markdown"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new().with(SettingSpec::new("title", "Untitled Export"))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        let title = ctx.setting_str_or("title", "Untitled Export");

        let mut ports: Vec<_> = ctx.inputs.iter().collect();
        ports.sort_by_key(|(port, _)| **port);

        let mut document = format!("# {}\n", title);
        for (_, value) in ports {
            document.push('\n');
            document.push_str(value.to_text().trim_end());
            document.push('\n');
        }

        ctx.events
            .info(format!("Exported {} section(s)", ctx.inputs.len()));

        Ok(Outputs::new().with_port(0, document))
    }
}
