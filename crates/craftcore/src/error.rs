use crate::pipeline::{NodeId, PortIndex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Structural errors, raised before any node is dispatched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("Connection references unknown node: {node_id}")]
    DanglingConnection { node_id: NodeId },

    #[error("Input port {port} of node {node_id} has more than one incoming connection")]
    DuplicateInputPort { node_id: NodeId, port: PortIndex },

    #[error("Cycle detected through nodes: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<NodeId> },

    #[error("Unknown setting '{key}' on node {node_id}")]
    UnknownSetting { node_id: NodeId, key: String },

    #[error("Setting '{key}' on node {node_id} has value '{value}', allowed: {}", .allowed.join(", "))]
    InvalidSettingValue {
        node_id: NodeId,
        key: String,
        value: String,
        allowed: Vec<String>,
    },
}

/// Errors surfaced by an executor; recorded on the node result, never
/// propagated out of the scheduler
#[derive(Error, Debug, Clone)]
pub enum ExecutorError {
    #[error("Missing required input on port {0}")]
    MissingInput(PortIndex),

    #[error("Invalid input type on port {port}: expected {expected}")]
    InvalidInputType { port: PortIndex, expected: String },

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Cancelled")]
    Cancelled,
}

#[derive(Error, Debug, Clone)]
pub enum RegistryError {
    #[error("no executor registered for {0}")]
    UnknownNodeType(String),
}
