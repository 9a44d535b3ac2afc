use craftcore::{Executor, RegistryError, SettingsSchema};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of available executor types.
///
/// An explicit instance injected into the runtime; keyed by type id. The
/// last registration for a type id wins, which lets tests hot-swap
/// executors.
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under its type id
    pub fn register(&mut self, executor: Arc<dyn Executor>) {
        let type_id = executor.type_id().to_string();
        tracing::info!("Registering executor type: {}", type_id);
        self.executors.insert(type_id, executor);
    }

    /// Look up the executor for a type id
    pub fn resolve(&self, type_id: &str) -> Result<Arc<dyn Executor>, RegistryError> {
        self.executors
            .get(type_id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownNodeType(type_id.to_string()))
    }

    /// Settings schema declared by a registered executor
    pub fn schema(&self, type_id: &str) -> Option<SettingsSchema> {
        self.executors.get(type_id).map(|e| e.schema())
    }

    /// All registered type ids
    pub fn list_type_ids(&self) -> Vec<String> {
        self.executors.keys().cloned().collect()
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
