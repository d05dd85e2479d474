use crate::models::{
    Pipeline, PipelineCreate, PipelineFilter, PipelineList, PipelineMetrics, PipelineUpdate,
    QueryInput, QueryResult,
};

use super::{ApiClient, ApiError, RequestOptions};

fn pipeline_path(id: &str) -> String {
    format!("pipelines/{}", id)
}

impl ApiClient {
    pub async fn list_pipelines(&self, filter: &PipelineFilter) -> Result<PipelineList, ApiError> {
        let options = RequestOptions::get()
            .query_opt("skip", filter.skip)
            .query_opt("limit", filter.limit)
            .query_opt("pipeline_type", filter.pipeline_type.map(|t| t.as_str()))
            .query_opt("status", filter.status.map(|s| s.as_str()));
        self.request("pipelines/", options).await
    }

    pub async fn get_pipeline(&self, id: &str) -> Result<Pipeline, ApiError> {
        self.request(&pipeline_path(id), RequestOptions::get()).await
    }

    pub async fn create_pipeline(&self, pipeline: &PipelineCreate) -> Result<Pipeline, ApiError> {
        self.request("pipelines/", RequestOptions::post().json(pipeline)?)
            .await
    }

    pub async fn update_pipeline(
        &self,
        id: &str,
        update: &PipelineUpdate,
    ) -> Result<Pipeline, ApiError> {
        self.request(&pipeline_path(id), RequestOptions::put().json(update)?)
            .await
    }

    pub async fn delete_pipeline(&self, id: &str) -> Result<(), ApiError> {
        self.request_empty(&pipeline_path(id), RequestOptions::delete())
            .await
    }

    /// Run one query through the pipeline and wait for the answer
    pub async fn execute_pipeline(
        &self,
        id: &str,
        query: &QueryInput,
    ) -> Result<QueryResult, ApiError> {
        let path = format!("{}/execute", pipeline_path(id));
        self.request(&path, RequestOptions::post().json(query)?).await
    }

    pub async fn pipeline_metrics(&self, id: &str) -> Result<PipelineMetrics, ApiError> {
        let path = format!("{}/metrics", pipeline_path(id));
        self.request(&path, RequestOptions::get()).await
    }

    pub async fn activate_pipeline(&self, id: &str) -> Result<Pipeline, ApiError> {
        let path = format!("{}/activate", pipeline_path(id));
        self.request(&path, RequestOptions::post()).await
    }

    pub async fn deactivate_pipeline(&self, id: &str) -> Result<Pipeline, ApiError> {
        let path = format!("{}/deactivate", pipeline_path(id));
        self.request(&path, RequestOptions::post()).await
    }
}
