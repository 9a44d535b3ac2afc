use async_trait::async_trait;
use craftcore::{
    ExecutionContext, Executor, ExecutorError, Outputs, Setting, SettingSpec, SettingsSchema,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// LLM text generation through an OpenAI-compatible chat completions API
pub struct TextGenerateExecutor {
    client: reqwest::Client,
}

impl TextGenerateExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TextGenerateExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for TextGenerateExecutor {
    fn type_id(&self) -> &str {
        "text.generate"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new()
            .with(SettingSpec::new("model", "GPT-5 Mini").with_options([
                Setting::from("GPT-5 Mini"),
                Setting::from("GPT-5"),
                Setting::from("Claude Sonnet"),
            ]))
            .with(SettingSpec::new("temperature", "Medium").with_options([
                Setting::from("Low"),
                Setting::from("Medium"),
                Setting::from("High"),
            ]))
            .with(SettingSpec::new("prompt", ""))
            .with(SettingSpec::new("api_base", DEFAULT_API_BASE))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        // input 0, when connected, overrides the prompt setting
        let prompt = match ctx.input(0) {
            Some(value) => value
                .as_str()
                .ok_or(ExecutorError::InvalidInputType {
                    port: 0,
                    expected: "string".to_string(),
                })?
                .to_string(),
            None => ctx.setting_str_or("prompt", "").to_string(),
        };
        if prompt.is_empty() {
            return Err(ExecutorError::ExecutionFailed(
                "no prompt: connect input 0 or set the prompt setting".to_string(),
            ));
        }

        let api_key = ctx.credential("openai_api_key")?;
        let model = api_model(ctx.setting_str_or("model", "GPT-5 Mini"));
        let temperature = match ctx.setting_str_or("temperature", "Medium") {
            "Low" => 0.2,
            "High" => 1.0,
            _ => 0.7,
        };
        let api_base = ctx.setting_str_or("api_base", DEFAULT_API_BASE);

        ctx.events
            .info(format!("Generating with {} (temperature {})", model, temperature));

        let body = serde_json::json!({
            "model": model,
            "temperature": temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", api_base))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ExecutorError::ExecutionFailed(format!("chat completions request failed: {}", e))
            })?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await.map_err(|e| {
            ExecutorError::ExecutionFailed(format!("failed to read completions response: {}", e))
        })?;

        if !status.is_success() {
            return Err(ExecutorError::ExecutionFailed(format!(
                "completions API returned {}: {}",
                status, payload
            )));
        }

        let text = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ExecutorError::ExecutionFailed("completions response had no content".to_string())
            })?
            .to_string();

        Ok(Outputs::new().with_port(0, text))
    }
}

/// Map the display names users pick in settings to API model ids
fn api_model(display: &str) -> &'static str {
    match display {
        "GPT-5" => "gpt-5",
        "Claude Sonnet" => "claude-sonnet",
        _ => "gpt-5-mini",
    }
}
