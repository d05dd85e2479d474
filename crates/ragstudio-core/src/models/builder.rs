//! Visual pipeline builder graphs.
//!
//! The graph is edited in the dashboard and sent as a whole for validation
//! or compilation; field names follow the frontend's node editor, hence the
//! camelCase handles on edges.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NodeData {
    pub label: String,
    /// Component id, e.g. `vector_search`
    #[serde(rename = "type")]
    pub component: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GraphNode {
    pub id: String,
    /// input, output or process
    #[serde(rename = "type")]
    pub kind: String,
    pub position: NodePosition,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "sourceHandle", default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(rename = "targetHandle", default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
            label: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GraphState {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<HashMap<String, serde_json::Value>>,
}

impl GraphState {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Building block offered in the builder palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ComponentDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub icon: String,
    #[serde(default)]
    pub inputs: Vec<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub outputs: Vec<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub config_schema: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub graph: GraphState,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GraphValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub node_count: u64,
    pub edge_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GraphCompilation {
    pub pipeline_id: String,
    pub pipeline_name: String,
    pub code_snippet: String,
    /// Node ids in topological order
    pub execution_order: Vec<String>,
    pub component_count: u64,
    pub connection_count: u64,
    pub estimated_latency_ms: u64,
    /// Naive UTC timestamp as the backend formats it
    pub compiled_at: String,
}

/// Body of a compile request; the graph and the name travel side by side.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompileRequest<'a> {
    pub graph: &'a GraphState,
    pub pipeline_name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_handles_use_camel_case() {
        let mut edge = GraphEdge::new("e1", "loader", "chunker");
        edge.source_handle = Some("out".into());
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["sourceHandle"], "out");
        assert!(json.get("targetHandle").is_none());
        assert!(json.get("source_handle").is_none());
    }

    #[test]
    fn test_graph_state_from_editor() {
        let graph: GraphState = serde_json::from_value(serde_json::json!({
            "nodes": [{
                "id": "n1",
                "type": "input",
                "position": {"x": 100, "y": 40.5},
                "data": {"label": "Loader", "type": "data_loader"}
            }],
            "edges": []
        }))
        .unwrap();
        let node = graph.node("n1").unwrap();
        assert_eq!(node.kind, "input");
        assert_eq!(node.data.component, "data_loader");
        assert!(node.data.config.is_empty());
        assert!(graph.viewport.is_none());
    }

    #[test]
    fn test_compile_request_shape() {
        let graph = GraphState::default();
        let body = serde_json::to_value(CompileRequest {
            graph: &graph,
            pipeline_name: "demo",
        })
        .unwrap();
        assert_eq!(body["pipeline_name"], "demo");
        assert_eq!(body["graph"]["nodes"], serde_json::json!([]));
    }
}
