//! Pipeline execution runtime
//!
//! This crate provides the engine that runs pipelines: the executor
//! registry, input resolution, the dependency-ordered concurrent scheduler,
//! and per-node result reporting.

mod registry;
mod report;
mod resolve;
mod runtime;
mod scheduler;

pub use registry::ExecutorRegistry;
pub use report::{NodeRunResult, NodeStatus, ResultCallback, RunStatus, RunSummary};
pub use resolve::{resolve_inputs, ResolveError};
pub use runtime::PipelineRuntime;
pub use scheduler::Scheduler;
