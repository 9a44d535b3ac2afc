//! Core abstractions for the craftflow engine
//!
//! This crate provides the pipeline graph model and validation, the dynamic
//! value type, the executor contract, and the event types that all other
//! components depend on. It performs no I/O itself.

mod credentials;
mod error;
mod events;
mod executor;
mod pipeline;
mod schema;
mod value;

pub use credentials::CredentialStore;
pub use error::{EngineError, ExecutorError, GraphError, RegistryError};
pub use events::{EventBus, EventEmitter, ExecutionEvent, NodeEvent, RunId};
pub use executor::{CancellationToken, ExecutionContext, Executor, Outputs};
pub use pipeline::{Connection, NodeId, NodeSpec, PipelineSpec, PortIndex, Setting};
pub use schema::{SettingSpec, SettingsSchema};
pub use value::Value;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
