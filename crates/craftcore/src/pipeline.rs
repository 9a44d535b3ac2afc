use crate::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub type NodeId = String;
pub type PortIndex = u32;

/// Scalar setting value attached to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Setting {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Setting {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Setting::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Setting::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Setting::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Bool(b) => write!(f, "{}", b),
            Setting::Number(n) => write!(f, "{}", n),
            Setting::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Setting {
    fn from(s: &str) -> Self {
        Setting::String(s.to_string())
    }
}

impl From<String> for Setting {
    fn from(s: String) -> Self {
        Setting::String(s)
    }
}

impl From<f64> for Setting {
    fn from(n: f64) -> Self {
        Setting::Number(n)
    }
}

impl From<i64> for Setting {
    fn from(n: i64) -> Self {
        Setting::Number(n as f64)
    }
}

impl From<bool> for Setting {
    fn from(b: bool) -> Self {
        Setting::Bool(b)
    }
}

/// Node specification in a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub type_id: String,
    pub label: Option<String>,
    #[serde(default)]
    pub settings: HashMap<String, Setting>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            label: None,
            settings: HashMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Setting>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// Directed, port-indexed edge between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_output: PortIndex,
    pub to_node: NodeId,
    pub to_input: PortIndex,
}

/// Complete pipeline definition: the node set plus the connection set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    pub connections: Vec<Connection>,
}

impl PipelineSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(
        &mut self,
        from_node: impl Into<NodeId>,
        from_output: PortIndex,
        to_node: impl Into<NodeId>,
        to_input: PortIndex,
    ) {
        self.connections.push(Connection {
            from_node: from_node.into(),
            from_output,
            to_node: to_node.into(),
            to_input,
        });
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Structural validation: unique node ids, no dangling connection
    /// endpoints, at most one connection per input port, no cycles.
    ///
    /// Runs synchronously with no side effects; a pipeline that fails here
    /// is never scheduled. A zero-node pipeline is valid.
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut input_ports = HashSet::new();
        for conn in &self.connections {
            if !ids.contains(conn.from_node.as_str()) {
                return Err(GraphError::DanglingConnection {
                    node_id: conn.from_node.clone(),
                });
            }
            if !ids.contains(conn.to_node.as_str()) {
                return Err(GraphError::DanglingConnection {
                    node_id: conn.to_node.clone(),
                });
            }
            if !input_ports.insert((conn.to_node.as_str(), conn.to_input)) {
                return Err(GraphError::DuplicateInputPort {
                    node_id: conn.to_node.clone(),
                    port: conn.to_input,
                });
            }
        }

        self.check_acyclic()
    }

    /// Depth-first cycle check. A back-edge to a node still on the active
    /// stack is a cycle; the error names the participating nodes.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for conn in &self.connections {
            adjacency
                .entry(conn.from_node.as_str())
                .or_default()
                .push(conn.to_node.as_str());
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = Vec::new();

        for node in &self.nodes {
            visit(node.id.as_str(), &adjacency, &mut visited, &mut stack)?;
        }
        Ok(())
    }
}

fn visit<'a>(
    id: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    stack: &mut Vec<&'a str>,
) -> Result<(), GraphError> {
    if visited.contains(id) {
        return Ok(());
    }
    if let Some(pos) = stack.iter().position(|n| *n == id) {
        let mut path: Vec<NodeId> = stack[pos..].iter().map(|n| n.to_string()).collect();
        path.push(id.to_string());
        return Err(GraphError::CycleDetected { path });
    }

    stack.push(id);
    if let Some(next) = adjacency.get(id) {
        for &dep in next {
            visit(dep, adjacency, visited, stack)?;
        }
    }
    stack.pop();
    visited.insert(id);
    Ok(())
}
