//! Data models for RAG Studio backend resources.
//!
//! This module contains the request and response shapes of the backend API:
//!
//! - `TokenResponse`: login result
//! - Pipeline types: `Pipeline`, `PipelineList`, `QueryInput`, `QueryResult`, ...
//! - Benchmark types: `BenchmarkSummary`, `BenchmarkResult`, `QueryTestCase`, ...
//! - OpenSearch types: `ClusterHealth`, `IndexStats`, `SearchResult`, `ModelInfo`, ...
//! - RAG builder types: `GraphState`, `ComponentDefinition`, `PipelineTemplate`
//!
//! With the `ts` feature, the types also derive `ts_rs::TS` so the
//! dashboard frontend can share them.

pub mod auth;
pub mod benchmark;
pub mod builder;
pub mod opensearch;
pub mod pipeline;
mod timestamp;

pub use auth::TokenResponse;
pub use benchmark::{
    BenchmarkComparison, BenchmarkConfig, BenchmarkCreate, BenchmarkList, BenchmarkMetrics,
    BenchmarkRef, BenchmarkResult, BenchmarkStarted, BenchmarkSummary, ComparisonResult,
    ExportFormat, PipelineDelta, QueryTestCase, TestCaseUploadResult,
};
pub use builder::{
    ComponentDefinition, GraphCompilation, GraphEdge, GraphNode, GraphState, GraphValidation,
    NodeData, NodePosition, PipelineTemplate,
};
pub use opensearch::{
    ClusterHealth, DocumentInput, IndexConfig, IndexList, IndexStats, IngestPipelineInfo,
    ModelInfo, ReindexStarted, SearchQuery, SearchResult,
};
pub use pipeline::{
    Pipeline, PipelineConfig, PipelineCreate, PipelineFilter, PipelineList, PipelineMetrics,
    PipelineStatus, PipelineType, PipelineUpdate, QueryInput, QueryResult,
};
