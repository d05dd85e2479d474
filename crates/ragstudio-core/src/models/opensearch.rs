//! OpenSearch cluster, index and model tables.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ClusterHealth {
    pub cluster_name: String,
    /// green, yellow or red
    pub status: String,
    pub node_count: u32,
    pub active_shards: u32,
    pub relocating_shards: u32,
    pub initializing_shards: u32,
    pub unassigned_shards: u32,
    pub delayed_unassigned_shards: u32,
    pub active_shards_percent: f64,
}

impl ClusterHealth {
    pub fn is_green(&self) -> bool {
        self.status.eq_ignore_ascii_case("green")
    }
}

/// Settings for a new index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct IndexConfig {
    pub number_of_shards: u32,
    pub number_of_replicas: u32,
    pub embedding_dimension: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            number_of_shards: 1,
            number_of_replicas: 1,
            embedding_dimension: 384,
        }
    }
}

/// Index listing. Rows are passed through as the backend sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct IndexList {
    pub indices: Vec<HashMap<String, serde_json::Value>>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct IndexStats {
    pub index_name: String,
    pub document_count: u64,
    pub size_in_bytes: u64,
    pub size_human: String,
    pub primary_shards: u32,
    pub total_shards: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DocumentInput {
    pub document_id: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SearchQuery {
    pub index_name: String,
    pub query_text: String,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<HashMap<String, serde_json::Value>>,
}

impl SearchQuery {
    pub fn new(index_name: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            query_text: query_text.into(),
            top_k: 10,
            filters: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SearchResult {
    pub query: String,
    pub total_hits: u64,
    pub hits: Vec<HashMap<String, serde_json::Value>>,
    pub took_ms: u64,
}

/// Deployed ML model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub model_type: String,
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Ingest pipeline as registered in OpenSearch (not a RAG pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct IngestPipelineInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub processor_count: u32,
    #[serde(default)]
    pub processors: Option<Vec<HashMap<String, serde_json::Value>>>,
}

/// Response to starting a reindex; progress is polled by task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReindexStarted {
    #[serde(default)]
    pub task_id: Option<String>,
    pub source_index: String,
    pub target_index: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_info_type_field() {
        let model: ModelInfo = serde_json::from_str(
            r#"{"id":"m1","name":"minilm","type":"text_embedding","status":"DEPLOYED","version":null,"created_at":null}"#,
        )
        .unwrap();
        assert_eq!(model.model_type, "text_embedding");
    }

    #[test]
    fn test_cluster_health_green() {
        let health = ClusterHealth {
            cluster_name: "rag".into(),
            status: "GREEN".into(),
            node_count: 1,
            active_shards: 4,
            relocating_shards: 0,
            initializing_shards: 0,
            unassigned_shards: 0,
            delayed_unassigned_shards: 0,
            active_shards_percent: 100.0,
        };
        assert!(health.is_green());
    }
}
