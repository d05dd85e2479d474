//! Benchmark models.
//!
//! Scores are computed by the backend; the console only lists, compares
//! and exports them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct QueryTestCase {
    pub query_id: String,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkConfig {
    pub pipeline_ids: Vec<String>,
    #[serde(default)]
    pub test_case_ids: Option<Vec<String>>,
    pub iterations: u32,
    pub warmup_queries: u32,
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
    pub top_k: u32,
    pub parallel_execution: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub pipeline_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_ids: Option<Vec<String>>,
    pub auto_generate_cases: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_test_cases: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_types: Option<Vec<String>>,
    pub iterations: u32,
    pub warmup_queries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    pub top_k: u32,
    pub parallel_execution: bool,
}

impl BenchmarkCreate {
    /// Request with the backend's defaults for everything but name and pipelines
    pub fn new(name: impl Into<String>, pipeline_ids: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            pipeline_ids,
            test_case_ids: None,
            auto_generate_cases: true,
            num_test_cases: Some(50),
            query_types: None,
            iterations: 1,
            warmup_queries: 5,
            timeout_seconds: Some(300),
            top_k: 5,
            parallel_execution: false,
        }
    }
}

/// One row of the benchmark list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub pipeline_count: u32,
    #[serde(default)]
    pub total_queries: Option<u64>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "super::timestamp::deserialize_optional_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkList {
    pub items: Vec<BenchmarkSummary>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// Per-pipeline statistics. `latency_ms` and `retrieval_score` hold
/// mean/median/std/min/max and, for latency, p95/p99.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkMetrics {
    pub pipeline_id: String,
    pub latency_ms: HashMap<String, f64>,
    pub retrieval_score: HashMap<String, f64>,
    pub success_rate: f64,
    pub throughput_qps: f64,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub error_rate: f64,
}

impl BenchmarkMetrics {
    pub fn mean_latency_ms(&self) -> Option<f64> {
        self.latency_ms.get("mean").copied()
    }

    pub fn p95_latency_ms(&self) -> Option<f64> {
        self.latency_ms.get("p95").copied()
    }

    pub fn mean_retrieval_score(&self) -> Option<f64> {
        self.retrieval_score.get("mean").copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ComparisonResult {
    pub pipeline_a: String,
    pub pipeline_b: String,
    pub metrics_comparison: HashMap<String, f64>,
    pub winner: String,
    pub winner_criteria: HashMap<String, String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkResult {
    pub benchmark_id: String,
    pub config: BenchmarkConfig,
    pub metrics: HashMap<String, BenchmarkMetrics>,
    #[serde(default)]
    pub comparisons: Vec<ComparisonResult>,
    pub total_queries: u64,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "super::timestamp::deserialize_timestamp")]
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response to starting a benchmark; the run continues in the background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkStarted {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pipeline_count: u32,
    #[serde(default)]
    pub test_case_count: u32,
}

/// Identity of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub total_queries: Option<u64>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

/// Relative change of a pipeline between two runs, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PipelineDelta {
    pub latency_improvement: f64,
    pub retrieval_score_improvement: f64,
    pub success_rate_difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BenchmarkComparison {
    pub benchmark_1: BenchmarkRef,
    pub benchmark_2: BenchmarkRef,
    #[serde(default)]
    pub pipeline_comparison: HashMap<String, PipelineDelta>,
    #[serde(default)]
    pub common_pipelines: Vec<String>,
    #[serde(default)]
    pub unique_to_benchmark_1: Vec<String>,
    #[serde(default)]
    pub unique_to_benchmark_2: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseUploadResult {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub total_cases: u64,
    /// First few stored cases, echoed back
    #[serde(default)]
    pub cases: Vec<serde_json::Value>,
}

/// Output format for benchmark exports, passed as `?format=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Html,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::default().to_string(), "json");
    }

    #[test]
    fn test_summary_reads_naive_timestamps() {
        let summary: BenchmarkSummary = serde_json::from_value(serde_json::json!({
            "id": "b1",
            "name": "nightly",
            "status": "running",
            "pipeline_count": 2,
            "created_at": "2024-05-01T10:00:00.250000",
            "completed_at": null
        }))
        .unwrap();
        let created = summary.created_at.unwrap();
        assert_eq!(created.to_rfc3339(), "2024-05-01T10:00:00.250+00:00");
        assert!(summary.completed_at.is_none());
        assert!(summary.duration_seconds.is_none());
    }

    #[test]
    fn test_create_defaults_match_backend() {
        let create = BenchmarkCreate::new("nightly", vec!["p1".into(), "p2".into()]);
        let json = serde_json::to_value(&create).unwrap();
        assert_eq!(json["warmup_queries"], 5);
        assert_eq!(json["num_test_cases"], 50);
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_metrics_accessors() {
        let metrics: BenchmarkMetrics = serde_json::from_value(serde_json::json!({
            "pipeline_id": "p1",
            "latency_ms": {"mean": 120.5, "p95": 300.0},
            "retrieval_score": {"mean": 0.82},
            "success_rate": 0.98,
            "throughput_qps": 4.2,
            "total_queries": 100,
            "failed_queries": 2,
            "error_rate": 0.02
        }))
        .unwrap();
        assert_eq!(metrics.mean_latency_ms(), Some(120.5));
        assert_eq!(metrics.p95_latency_ms(), Some(300.0));
        assert_eq!(metrics.mean_retrieval_score(), Some(0.82));
    }
}
