use chrono::{DateTime, Utc};
use craftcore::{NodeId, PortIndex, RunId, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Callback invoked exactly once per node per run, in completion order
pub type ResultCallback = Arc<dyn Fn(&NodeRunResult) + Send + Sync>;

/// Per-node state within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Idle,
    Running,
    Success,
    Error,
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Success | NodeStatus::Error | NodeStatus::Skipped)
    }
}

/// One node's terminal result within a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRunResult {
    pub node_id: NodeId,
    pub status: NodeStatus,
    /// Port-indexed outputs; empty unless the node succeeded
    pub outputs: HashMap<PortIndex, Value>,
    /// Present iff status is `Error`
    pub error: Option<String>,
    /// The failed or skipped ancestor that blocked this node; present iff
    /// status is `Skipped` through propagation
    pub blocked_on: Option<NodeId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl NodeRunResult {
    pub fn success(
        node_id: NodeId,
        outputs: HashMap<PortIndex, Value>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            node_id,
            status: NodeStatus::Success,
            outputs,
            error: None,
            blocked_on: None,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        }
    }

    pub fn error(node_id: NodeId, error: String, started_at: DateTime<Utc>) -> Self {
        let finished_at = Utc::now();
        Self {
            node_id,
            status: NodeStatus::Error,
            outputs: HashMap::new(),
            error: Some(error),
            blocked_on: None,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds().max(0) as u64,
        }
    }

    /// Synthesized by the scheduler for a node that was never dispatched
    pub fn skipped(node_id: NodeId, blocked_on: Option<NodeId>) -> Self {
        let now = Utc::now();
        Self {
            node_id,
            status: NodeStatus::Skipped,
            outputs: HashMap::new(),
            error: None,
            blocked_on,
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }
}

/// Overall status of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every node succeeded
    Completed,
    /// At least one node errored or was skipped
    Failed,
}

/// Final aggregate report covering every node's terminal result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub status: RunStatus,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: HashMap<NodeId, NodeRunResult>,
}

impl RunSummary {
    pub fn from_results(
        run_id: RunId,
        results: HashMap<NodeId, NodeRunResult>,
        duration_ms: u64,
    ) -> Self {
        let count = |status| results.values().filter(|r| r.status == status).count();
        let succeeded = count(NodeStatus::Success);
        let failed = count(NodeStatus::Error);
        let skipped = count(NodeStatus::Skipped);

        Self {
            run_id,
            status: if failed == 0 && skipped == 0 {
                RunStatus::Completed
            } else {
                RunStatus::Failed
            },
            total: results.len(),
            succeeded,
            failed,
            skipped,
            duration_ms,
            results,
        }
    }

    pub fn result(&self, node_id: &str) -> Option<&NodeRunResult> {
        self.results.get(node_id)
    }
}
