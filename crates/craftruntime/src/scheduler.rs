use crate::registry::ExecutorRegistry;
use crate::report::{NodeRunResult, NodeStatus, ResultCallback, RunStatus, RunSummary};
use crate::resolve::resolve_inputs;
use chrono::Utc;
use craftcore::{
    CancellationToken, CredentialStore, EventBus, ExecutionContext, ExecutionEvent, ExecutorError,
    NodeId, PipelineSpec, RunId,
};
use futures::stream::{FuturesUnordered, StreamExt};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Drives one pipeline run: dependency-ordered dispatch, concurrent
/// execution of independent branches, failure propagation, result
/// reporting.
///
/// All bookkeeping (results table, eligibility checks) lives on this task;
/// node completions are serialized through a single `FuturesUnordered`
/// stream, so sibling branches finishing at the same instant can never
/// race the tables. A node result is written once and never overwritten
/// within a run.
pub struct Scheduler {
    registry: Arc<ExecutorRegistry>,
    event_bus: Arc<EventBus>,
}

impl Scheduler {
    pub fn new(registry: Arc<ExecutorRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            registry,
            event_bus,
        }
    }

    /// Execute a validated pipeline to completion.
    ///
    /// Every node reaches a terminal state: dispatched nodes finish as
    /// success or error, descendants of a non-success ancestor are skipped,
    /// and independent branches keep running whatever happens elsewhere.
    /// Structural problems are caught by `PipelineSpec::validate` before
    /// this is called.
    pub async fn run(
        &self,
        pipeline: &PipelineSpec,
        on_result: Option<ResultCallback>,
        credentials: Arc<CredentialStore>,
        cancellation: CancellationToken,
    ) -> RunSummary {
        let run_id = RunId::new_v4();
        let start = Instant::now();

        self.event_bus.emit(ExecutionEvent::RunStarted {
            run_id,
            pipeline: pipeline.name.clone(),
            timestamp: Utc::now(),
        });
        tracing::info!("Starting pipeline run {} ({})", run_id, pipeline.name);

        let (graph, node_to_index) = build_graph(pipeline);
        let mut results: HashMap<NodeId, NodeRunResult> = HashMap::new();
        // running or terminal; nodes absent here are still idle
        let mut dispatched: HashSet<NodeId> = HashSet::new();
        let mut running = FuturesUnordered::new();

        loop {
            if cancellation.is_cancelled() {
                // no new dispatch after cancellation; whatever is still idle
                // is reported skipped, in-flight nodes keep their results
                for node in &pipeline.nodes {
                    if dispatched.insert(node.id.clone()) {
                        let result = NodeRunResult::skipped(node.id.clone(), None);
                        self.record(run_id, result, &mut results, &on_result);
                    }
                }
            } else {
                // Alternate skip propagation and dispatch until neither makes
                // progress. A synthesized skip is terminal immediately, so it
                // can unblock (skip) further descendants within the same scan.
                loop {
                    let mut progressed = false;
                    let mut ready = Vec::new();

                    for node in &pipeline.nodes {
                        if dispatched.contains(&node.id) {
                            continue;
                        }
                        let Some(&idx) = node_to_index.get(&node.id) else {
                            continue;
                        };
                        let upstream: Vec<&NodeId> = graph
                            .neighbors_directed(idx, Direction::Incoming)
                            .map(|i| &graph[i])
                            .collect();

                        if !upstream.iter().all(|u| results.contains_key(*u)) {
                            continue;
                        }

                        let blocked_on = upstream.iter().find(|u| {
                            results
                                .get(**u)
                                .map(|r| r.status != NodeStatus::Success)
                                .unwrap_or(false)
                        });
                        match blocked_on {
                            Some(ancestor) => {
                                let result = NodeRunResult::skipped(
                                    node.id.clone(),
                                    Some((*ancestor).clone()),
                                );
                                dispatched.insert(node.id.clone());
                                self.record(run_id, result, &mut results, &on_result);
                                progressed = true;
                            }
                            None => ready.push(node),
                        }
                    }

                    for node in ready {
                        dispatched.insert(node.id.clone());
                        let started_at = Utc::now();

                        let executor = match self.registry.resolve(&node.type_id) {
                            Ok(executor) => executor,
                            Err(e) => {
                                tracing::error!("Node {} failed: {}", node.id, e);
                                let result = NodeRunResult::error(
                                    node.id.clone(),
                                    e.to_string(),
                                    started_at,
                                );
                                self.record(run_id, result, &mut results, &on_result);
                                progressed = true;
                                continue;
                            }
                        };

                        let inputs =
                            match resolve_inputs(&node.id, &pipeline.connections, &results) {
                                Ok(inputs) => inputs,
                                Err(e) => {
                                    // unreachable for a validated graph: every
                                    // upstream is terminal-success at this point
                                    let result = NodeRunResult::error(
                                        node.id.clone(),
                                        e.to_string(),
                                        started_at,
                                    );
                                    self.record(run_id, result, &mut results, &on_result);
                                    progressed = true;
                                    continue;
                                }
                            };

                        let ctx = ExecutionContext {
                            node_id: node.id.clone(),
                            type_id: node.type_id.clone(),
                            inputs,
                            settings: node.settings.clone(),
                            credentials: credentials.clone(),
                            events: self.event_bus.create_emitter(run_id, node.id.clone()),
                            cancellation: cancellation.child_token(),
                        };

                        self.event_bus.emit(ExecutionEvent::NodeStarted {
                            run_id,
                            node_id: node.id.clone(),
                            type_id: node.type_id.clone(),
                            timestamp: started_at,
                        });
                        tracing::debug!("Dispatching node {} ({})", node.id, node.type_id);

                        let task_node_id = node.id.clone();
                        let handle = tokio::spawn(async move {
                            let outcome = executor.execute(ctx).await;
                            (task_node_id, outcome)
                        });

                        let join_node_id = node.id.clone();
                        running.push(async move {
                            match handle.await {
                                Ok((node_id, outcome)) => (node_id, started_at, outcome),
                                Err(e) => (
                                    join_node_id,
                                    started_at,
                                    Err(ExecutorError::ExecutionFailed(format!(
                                        "executor panicked: {}",
                                        e
                                    ))),
                                ),
                            }
                        });
                    }

                    if !progressed {
                        break;
                    }
                }
            }

            if running.is_empty() {
                break;
            }

            if let Some((node_id, started_at, outcome)) = running.next().await {
                let result = match outcome {
                    Ok(outputs) => {
                        tracing::info!("Node {} completed", node_id);
                        NodeRunResult::success(node_id, outputs.ports, started_at)
                    }
                    Err(e) => {
                        tracing::error!("Node {} failed: {}", node_id, e);
                        NodeRunResult::error(node_id, e.to_string(), started_at)
                    }
                };
                self.record(run_id, result, &mut results, &on_result);
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        let summary = RunSummary::from_results(run_id, results, duration_ms);

        self.event_bus.emit(ExecutionEvent::RunFinished {
            run_id,
            success: summary.status == RunStatus::Completed,
            duration_ms,
            timestamp: Utc::now(),
        });
        tracing::info!(
            "Run {} finished: {}/{} nodes succeeded in {}ms",
            run_id,
            summary.succeeded,
            summary.total,
            duration_ms
        );

        summary
    }

    /// Record a terminal result: emit the matching event, invoke the caller's
    /// callback, write the results table. Called exactly once per node.
    fn record(
        &self,
        run_id: RunId,
        result: NodeRunResult,
        results: &mut HashMap<NodeId, NodeRunResult>,
        on_result: &Option<ResultCallback>,
    ) {
        let timestamp = Utc::now();
        match result.status {
            NodeStatus::Success => self.event_bus.emit(ExecutionEvent::NodeSucceeded {
                run_id,
                node_id: result.node_id.clone(),
                outputs: result.outputs.clone(),
                duration_ms: result.duration_ms,
                timestamp,
            }),
            NodeStatus::Error => self.event_bus.emit(ExecutionEvent::NodeFailed {
                run_id,
                node_id: result.node_id.clone(),
                error: result.error.clone().unwrap_or_default(),
                timestamp,
            }),
            NodeStatus::Skipped => self.event_bus.emit(ExecutionEvent::NodeSkipped {
                run_id,
                node_id: result.node_id.clone(),
                blocked_on: result.blocked_on.clone(),
                timestamp,
            }),
            _ => {}
        }

        if let Some(callback) = on_result {
            callback(&result);
        }
        results.insert(result.node_id.clone(), result);
    }
}

/// Dependency graph over node ids. Parallel connections between the same
/// pair of nodes collapse to one edge: the dependency count is distinct
/// upstream nodes, not connection count.
fn build_graph(pipeline: &PipelineSpec) -> (DiGraph<NodeId, ()>, HashMap<NodeId, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut node_to_index = HashMap::new();

    for node in &pipeline.nodes {
        let idx = graph.add_node(node.id.clone());
        node_to_index.insert(node.id.clone(), idx);
    }

    let mut seen = HashSet::new();
    for conn in &pipeline.connections {
        if !seen.insert((conn.from_node.as_str(), conn.to_node.as_str())) {
            continue;
        }
        if let (Some(&from), Some(&to)) = (
            node_to_index.get(&conn.from_node),
            node_to_index.get(&conn.to_node),
        ) {
            graph.add_edge(from, to, ());
        }
    }

    (graph, node_to_index)
}
