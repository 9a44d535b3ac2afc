use crate::pipeline::{NodeId, Setting};
use crate::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One recognized setting key for a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingSpec {
    pub key: String,
    pub default: Setting,
    /// Enumerated option set; `None` means any value of the right shape
    pub options: Option<Vec<Setting>>,
}

impl SettingSpec {
    pub fn new(key: impl Into<String>, default: impl Into<Setting>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
            options: None,
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = Setting>) -> Self {
        self.options = Some(options.into_iter().collect());
        self
    }
}

/// The settings an executor type recognizes: keys, defaults, option sets.
///
/// Validated against each node's settings bag before a run starts; the
/// scheduler itself never interprets settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSchema {
    pub settings: Vec<SettingSpec>,
}

impl SettingsSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, spec: SettingSpec) -> Self {
        self.settings.push(spec);
        self
    }

    pub fn spec(&self, key: &str) -> Option<&SettingSpec> {
        self.settings.iter().find(|s| s.key == key)
    }

    pub fn default_for(&self, key: &str) -> Option<&Setting> {
        self.spec(key).map(|s| &s.default)
    }

    /// Check a node's settings bag: unknown keys and values outside an
    /// enumerated option set are structural errors.
    pub fn validate(
        &self,
        node_id: &NodeId,
        settings: &HashMap<String, Setting>,
    ) -> Result<(), GraphError> {
        for (key, value) in settings {
            let spec = self.spec(key).ok_or_else(|| GraphError::UnknownSetting {
                node_id: node_id.clone(),
                key: key.clone(),
            })?;

            if let Some(options) = &spec.options {
                if !options.contains(value) {
                    return Err(GraphError::InvalidSettingValue {
                        node_id: node_id.clone(),
                        key: key.clone(),
                        value: value.to_string(),
                        allowed: options.iter().map(|o| o.to_string()).collect(),
                    });
                }
            }
        }
        Ok(())
    }
}
