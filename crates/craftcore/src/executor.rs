use crate::credentials::CredentialStore;
use crate::events::EventEmitter;
use crate::pipeline::{NodeId, PortIndex, Setting};
use crate::schema::SettingsSchema;
use crate::{ExecutorError, Value};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub use tokio_util::sync::CancellationToken;

/// Pluggable handler that performs a node's actual work.
///
/// Executors own their I/O. On a transient upstream failure an executor MAY
/// substitute a fallback output, but it MUST surface real errors as an
/// `ExecutorError` rather than swallow them; the engine records success or
/// error and never inspects or retries what happened inside.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Unique type identifier (e.g., "text.generate", "export.markdown")
    fn type_id(&self) -> &str;

    /// Settings this executor recognizes; validated before a run starts
    fn schema(&self) -> SettingsSchema {
        SettingsSchema::default()
    }

    /// Execute with resolved inputs and return port-indexed outputs
    async fn execute(&self, ctx: ExecutionContext) -> Result<Outputs, ExecutorError>;
}

/// Per-node execution context, built fresh for every dispatch
#[derive(Clone)]
pub struct ExecutionContext {
    pub node_id: NodeId,

    pub type_id: String,

    /// Inputs resolved from upstream outputs, keyed by input port index.
    /// A port with no incoming connection is absent; executors fall back
    /// to their settings defaults.
    pub inputs: HashMap<PortIndex, Value>,

    /// The node's settings bag, opaque to the engine
    pub settings: HashMap<String, Setting>,

    /// Named API keys/tokens, read-only within the run
    pub credentials: Arc<CredentialStore>,

    /// Emitter for real-time updates
    pub events: EventEmitter,

    /// Best-effort abort signal for in-flight work
    pub cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn input(&self, port: PortIndex) -> Option<&Value> {
        self.inputs.get(&port)
    }

    /// Get required input or return error
    pub fn require_input(&self, port: PortIndex) -> Result<&Value, ExecutorError> {
        self.inputs
            .get(&port)
            .ok_or(ExecutorError::MissingInput(port))
    }

    /// Get required string input or return error
    pub fn require_str_input(&self, port: PortIndex) -> Result<&str, ExecutorError> {
        self.require_input(port)?
            .as_str()
            .ok_or(ExecutorError::InvalidInputType {
                port,
                expected: "string".to_string(),
            })
    }

    pub fn setting(&self, key: &str) -> Option<&Setting> {
        self.settings.get(key)
    }

    /// String setting, or the given default when absent
    pub fn setting_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.settings
            .get(key)
            .and_then(|s| s.as_str())
            .unwrap_or(default)
    }

    /// Numeric setting, or the given default when absent
    pub fn setting_f64_or(&self, key: &str, default: f64) -> f64 {
        self.settings
            .get(key)
            .and_then(|s| s.as_f64())
            .unwrap_or(default)
    }

    pub fn credential(&self, name: &str) -> Result<&str, ExecutorError> {
        self.credentials
            .get(name)
            .ok_or_else(|| ExecutorError::MissingCredential(name.to_string()))
    }
}

/// Port-indexed outputs produced by one executor invocation
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub ports: HashMap<PortIndex, Value>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: PortIndex, value: impl Into<Value>) -> Self {
        self.ports.insert(port, value.into());
        self
    }

    pub fn insert(&mut self, port: PortIndex, value: impl Into<Value>) {
        self.ports.insert(port, value.into());
    }
}
