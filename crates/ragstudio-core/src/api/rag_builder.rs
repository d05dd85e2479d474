use crate::models::builder::CompileRequest;
use crate::models::{
    ComponentDefinition, GraphCompilation, GraphState, GraphValidation, PipelineTemplate,
};

use super::{ApiClient, ApiError, RequestOptions};

impl ApiClient {
    /// Component palette of the visual builder
    pub async fn builder_components(&self) -> Result<Vec<ComponentDefinition>, ApiError> {
        self.request("rag-builder/components", RequestOptions::get())
            .await
    }

    pub async fn builder_component(&self, id: &str) -> Result<ComponentDefinition, ApiError> {
        let path = format!("rag-builder/components/{}", id);
        self.request(&path, RequestOptions::get()).await
    }

    pub async fn validate_graph(&self, graph: &GraphState) -> Result<GraphValidation, ApiError> {
        self.request("rag-builder/validate", RequestOptions::post().json(graph)?)
            .await
    }

    /// Compile a graph; the backend rejects invalid graphs with 400
    pub async fn compile_graph(
        &self,
        graph: &GraphState,
        pipeline_name: &str,
    ) -> Result<GraphCompilation, ApiError> {
        let body = CompileRequest {
            graph,
            pipeline_name,
        };
        self.request("rag-builder/compile", RequestOptions::post().json(&body)?)
            .await
    }

    pub async fn builder_templates(&self) -> Result<Vec<PipelineTemplate>, ApiError> {
        self.request("rag-builder/templates", RequestOptions::get())
            .await
    }

    /// Copy a template's graph with fresh node and edge ids
    pub async fn clone_template(&self, template_id: &str) -> Result<GraphState, ApiError> {
        let path = format!("rag-builder/templates/{}/clone", template_id);
        self.request(&path, RequestOptions::post()).await
    }
}
