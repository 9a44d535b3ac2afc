use std::collections::HashMap;

/// Read-only bag of named API keys/tokens, forwarded unmodified to every
/// executor within a run.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    keys: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.keys.get(name).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Load credentials from environment variables with the given prefix;
    /// `CRAFT_OPENAI_API_KEY` becomes `openai_api_key`.
    pub fn from_env(prefix: &str) -> Self {
        let mut store = Self::new();
        for (name, value) in std::env::vars() {
            if let Some(stripped) = name.strip_prefix(prefix) {
                store.keys.insert(stripped.to_lowercase(), value);
            }
        }
        store
    }
}
