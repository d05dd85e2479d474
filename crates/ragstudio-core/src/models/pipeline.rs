//! Pipeline models.
//!
//! A pipeline binds a retrieval strategy (`naive_rag` or `graph_rag`) to an
//! OpenSearch index. Execution happens in the backend; these types only
//! carry its configuration, status and results.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PipelineType {
    NaiveRag,
    GraphRag,
}

impl PipelineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineType::NaiveRag => "naive_rag",
            PipelineType::GraphRag => "graph_rag",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineType::NaiveRag => "Naive RAG",
            PipelineType::GraphRag => "Graph RAG",
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PipelineStatus {
    Active,
    Inactive,
    Error,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Active => "active",
            PipelineStatus::Inactive => "inactive",
            PipelineStatus::Error => "error",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-pipeline tuning sent on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineConfig {
    pub name: String,
    pub pipeline_type: PipelineType,
    pub index_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_filters: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineMetrics {
    pub total_queries: u64,
    pub successful_queries: u64,
    pub failed_queries: u64,
    pub average_latency: f64,
    pub average_retrieval_score: f64,
}

impl PipelineMetrics {
    /// Fraction of successful queries, `None` before the first query
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_queries == 0 {
            None
        } else {
            Some(self.successful_queries as f64 / self.total_queries as f64)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Pipeline {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pipeline_type: PipelineType,
    pub status: PipelineStatus,
    pub index_name: String,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub metrics: Option<PipelineMetrics>,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_optional_timestamp")]
    pub last_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineList {
    pub items: Vec<Pipeline>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// Query filters for listing pipelines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineFilter {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub pipeline_type: Option<PipelineType>,
    pub status: Option<PipelineStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pipeline_type: PipelineType,
    pub index_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PipelineConfig>,
}

/// Partial update; unset fields are left alone by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct QueryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    pub query_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<HashMap<String, serde_json::Value>>,
}

impl QueryInput {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_id: None,
            query_text: query_text.into(),
            top_k: None,
            filters: None,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct QueryResult {
    pub query_id: String,
    pub query_text: String,
    pub answer: String,
    #[serde(default)]
    pub retrieved_documents: Vec<serde_json::Value>,
    pub latency_ms: u64,
    pub pipeline_type: PipelineType,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_deserializes_backend_shape() {
        let json = r#"{
            "id": "9f1c",
            "name": "Support",
            "description": null,
            "pipeline_type": "graph_rag",
            "status": "active",
            "index_name": "customer_docs",
            "config": {"retrieval_top_k": 5},
            "metrics": {"total_queries": 4, "successful_queries": 3},
            "created_at": "2024-05-01T10:00:00.482913",
            "updated_at": "2024-05-02T10:00:00",
            "last_run": null
        }"#;
        let pipeline: Pipeline = serde_json::from_str(json).unwrap();
        assert_eq!(pipeline.pipeline_type, PipelineType::GraphRag);
        assert_eq!(pipeline.status, PipelineStatus::Active);
        let metrics = pipeline.metrics.unwrap();
        assert_eq!(metrics.failed_queries, 0);
        assert_eq!(metrics.success_rate(), Some(0.75));
    }

    #[test]
    fn test_update_omits_unset_fields() {
        let update = PipelineUpdate {
            status: Some(PipelineStatus::Inactive),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"status": "inactive"}));
    }

    #[test]
    fn test_success_rate_without_queries() {
        assert_eq!(PipelineMetrics::default().success_rate(), None);
    }
}
