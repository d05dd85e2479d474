//! OpenSearch administration endpoints.
//!
//! Several of these answer with free-form objects (index creation, bulk
//! indexing, task status); those are returned as `serde_json::Value`.

use serde_json::Value;

use crate::models::{
    ClusterHealth, DocumentInput, IndexConfig, IndexList, IndexStats, IngestPipelineInfo,
    ModelInfo, ReindexStarted, SearchQuery, SearchResult,
};

use super::{ApiClient, ApiError, RequestOptions, UploadFile};

/// Source label the backend records for uploads when none is given
pub const DEFAULT_UPLOAD_SOURCE: &str = "upload";

fn index_path(name: &str) -> String {
    format!("opensearch/indices/{}", name)
}

impl ApiClient {
    pub async fn cluster_health(&self) -> Result<ClusterHealth, ApiError> {
        self.request("opensearch/health", RequestOptions::get()).await
    }

    /// List indices matching `pattern` (`*` when unset)
    pub async fn list_indices(
        &self,
        pattern: Option<&str>,
        include_system: bool,
    ) -> Result<IndexList, ApiError> {
        let options = RequestOptions::get()
            .query_opt("pattern", pattern)
            .query("include_system", include_system);
        self.request("opensearch/indices", options).await
    }

    pub async fn create_index(&self, name: &str, config: &IndexConfig) -> Result<Value, ApiError> {
        let options = RequestOptions::post().query("index_name", name).json(config)?;
        self.request("opensearch/indices", options).await
    }

    pub async fn index_stats(&self, name: &str) -> Result<IndexStats, ApiError> {
        self.request(&index_path(name), RequestOptions::get()).await
    }

    pub async fn delete_index(&self, name: &str) -> Result<(), ApiError> {
        self.request_empty(&index_path(name), RequestOptions::delete())
            .await
    }

    pub async fn index_documents(
        &self,
        name: &str,
        documents: &[DocumentInput],
    ) -> Result<Value, ApiError> {
        let path = format!("{}/documents", index_path(name));
        self.request(&path, RequestOptions::post().json(documents)?)
            .await
    }

    /// Upload a document file (txt, pdf, json, ...) to be chunked and indexed
    pub async fn upload_document(
        &self,
        name: &str,
        file: UploadFile,
        source: Option<&str>,
    ) -> Result<Value, ApiError> {
        let path = format!("{}/upload", index_path(name));
        let source = source.unwrap_or(DEFAULT_UPLOAD_SOURCE);
        self.upload(&path, file, &[("source", source)]).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, ApiError> {
        self.request("opensearch/search", RequestOptions::post().json(query)?)
            .await
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ApiError> {
        self.request("opensearch/models", RequestOptions::get()).await
    }

    pub async fn list_ingest_pipelines(&self) -> Result<Vec<IngestPipelineInfo>, ApiError> {
        self.request("opensearch/pipelines", RequestOptions::get()).await
    }

    /// Start copying `source` into `target`; the copy runs as a cluster task.
    pub async fn reindex(
        &self,
        source: &str,
        target: &str,
        create_target: bool,
    ) -> Result<ReindexStarted, ApiError> {
        let options = RequestOptions::post()
            .query("source_index", source)
            .query("target_index", target)
            .query("create_target", create_target);
        self.request("opensearch/reindex", options).await
    }

    pub async fn task_status(&self, task_id: &str) -> Result<Value, ApiError> {
        let path = format!("opensearch/tasks/{}", task_id);
        self.request(&path, RequestOptions::get()).await
    }
}
