use async_trait::async_trait;
use craftcore::{ExecutionContext, Executor, ExecutorError, Outputs, SettingSpec, SettingsSchema};

/// Research scraper: fetch a page and hand its body downstream
pub struct ResearchFetchExecutor {
    client: reqwest::Client,
}

impl ResearchFetchExecutor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ResearchFetchExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for ResearchFetchExecutor {
    fn type_id(&self) -> &str {
        "research.fetch"
    }

    fn schema(&self) -> SettingsSchema {
        SettingsSchema::new().with(SettingSpec::new("url", ""))
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError> {
        // input 0, when connected, overrides the url setting
        let url = match ctx.input(0) {
            Some(value) => value
                .as_str()
                .ok_or(ExecutorError::InvalidInputType {
                    port: 0,
                    expected: "string".to_string(),
                })?
                .to_string(),
            None => ctx.setting_str_or("url", "").to_string(),
        };
        if url.is_empty() {
            return Err(ExecutorError::ExecutionFailed(
                "no url: connect input 0 or set the url setting".to_string(),
            ));
        }

        ctx.events.info(format!("GET {}", url));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExecutorError::ExecutionFailed(format!("request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ExecutorError::ExecutionFailed(format!("failed to read body: {}", e)))?;

        ctx.events.info(format!("Response status: {}", status));

        Ok(Outputs::new()
            .with_port(0, body)
            .with_port(1, status as f64))
    }
}
