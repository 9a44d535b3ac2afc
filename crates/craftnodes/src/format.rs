use async_trait::async_trait;
use craftcore::{
    ExecutionContext, Executor, ExecutorError, Outputs, Setting, SettingSpec, SettingsSchema,
};

/// Brand formatter: wraps text in the configured voice template. Pure
/// transform, no I/O.
pub struct BrandFormatExecutor;

#[async_trait]
impl Executor for BrandFormatExecutor {
    fn type_id(&self) -> &str {
        "brand.format"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new()
            .with(SettingSpec::new("voice", "Formal").with_options([
                Setting::from("Formal"),
                Setting::from("Casual"),
                Setting::from("Punchy"),
            ]))
            .with(SettingSpec::new("brand", "The Brand Team"))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        let text = ctx.require_str_input(0)?.trim();
        let brand = ctx.setting_str_or("brand", "The Brand Team");

        let formatted = match ctx.setting_str_or("voice", "Formal") {
            "Casual" => format!("Hey!\n\n{}\n\nCheers,\n{}", text, brand),
            "Punchy" => format!("{}\n\n{}. Act now.", text, brand),
            _ => format!("To whom it may concern,\n\n{}\n\nKind regards,\n{}", text, brand),
        };

        Ok(Outputs::new().with_port(0, formatted))
    }
}
