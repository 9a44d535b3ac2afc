use crate::report::{NodeRunResult, NodeStatus};
use craftcore::{Connection, NodeId, PortIndex, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The upstream node has not produced a successful result yet. The
    /// scheduler reads this as "blocked", never as an engine failure.
    #[error("upstream node {0} has no successful result")]
    UpstreamNotReady(NodeId),
}

/// Collect a node's inputs from the outputs of the nodes feeding it.
///
/// For every connection into `node_id`, the upstream result's output at
/// `from_output` lands at `to_input`. An input port with no incoming
/// connection is simply absent from the map, as is a port whose upstream
/// succeeded without producing the named output; executors treat absent
/// inputs as "use settings default".
pub fn resolve_inputs(
    node_id: &str,
    connections: &[Connection],
    results: &HashMap<NodeId, NodeRunResult>,
) -> Result<HashMap<PortIndex, Value>, ResolveError> {
    let mut inputs = HashMap::new();

    for conn in connections.iter().filter(|c| c.to_node == node_id) {
        let upstream = results
            .get(&conn.from_node)
            .filter(|r| r.status == NodeStatus::Success)
            .ok_or_else(|| ResolveError::UpstreamNotReady(conn.from_node.clone()))?;

        if let Some(value) = upstream.outputs.get(&conn.from_output) {
            inputs.insert(conn.to_input, value.clone());
        }
    }

    Ok(inputs)
}
