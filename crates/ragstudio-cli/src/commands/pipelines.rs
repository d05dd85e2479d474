//! Pipeline commands.

use anyhow::Result;
use ragstudio_core::models::{PipelineFilter, QueryInput};
use ragstudio_core::ApiClient;

use super::column;

pub async fn list(api: &ApiClient, filter: &PipelineFilter) -> Result<()> {
    tracing::info!(?filter, "Listing pipelines");
    let page = api.list_pipelines(filter).await?;

    println!(
        "{} {} {} {} {}",
        column("ID", 36),
        column("NAME", 24),
        column("TYPE", 10),
        column("STATUS", 9),
        "INDEX"
    );
    for pipeline in &page.items {
        println!(
            "{} {} {} {} {}",
            column(&pipeline.id, 36),
            column(&pipeline.name, 24),
            column(pipeline.pipeline_type.as_str(), 10),
            column(pipeline.status.as_str(), 9),
            pipeline.index_name
        );
    }
    println!();
    println!(
        "{} of {} pipelines (skip {})",
        page.items.len(),
        page.total,
        page.skip
    );
    Ok(())
}

pub async fn show(api: &ApiClient, id: &str) -> Result<()> {
    let pipeline = api.get_pipeline(id).await?;

    println!("{}", pipeline.name);
    println!("{}", "=".repeat(pipeline.name.len()));
    if let Some(description) = &pipeline.description {
        println!("{}", description);
    }
    println!();
    println!("ID:       {}", pipeline.id);
    println!("Type:     {}", pipeline.pipeline_type.display_name());
    println!("Status:   {}", pipeline.status);
    println!("Index:    {}", pipeline.index_name);
    println!("Created:  {}", pipeline.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(last_run) = pipeline.last_run {
        println!("Last run: {}", last_run.format("%Y-%m-%d %H:%M"));
    }

    // Stored metrics may be stale; ask for fresh ones
    let metrics = match api.pipeline_metrics(id).await {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            tracing::warn!(error = %e, pipeline_id = id, "Failed to load metrics");
            pipeline.metrics
        }
    };
    if let Some(metrics) = metrics {
        println!();
        println!(
            "Queries:  {} ({} ok, {} failed)",
            metrics.total_queries, metrics.successful_queries, metrics.failed_queries
        );
        println!("Latency:  {:.1} ms avg", metrics.average_latency);
        println!("Score:    {:.3} avg", metrics.average_retrieval_score);
    }
    Ok(())
}

pub async fn execute(api: &ApiClient, id: &str, query: &str, top_k: Option<u32>) -> Result<()> {
    let mut input = QueryInput::new(query);
    if let Some(k) = top_k {
        input = input.with_top_k(k);
    }
    let result = api.execute_pipeline(id, &input).await?;

    println!("{}", result.answer);
    println!();
    println!(
        "{} documents retrieved in {} ms",
        result.retrieved_documents.len(),
        result.latency_ms
    );
    Ok(())
}

pub async fn set_active(api: &ApiClient, id: &str, active: bool) -> Result<()> {
    let pipeline = if active {
        api.activate_pipeline(id).await?
    } else {
        api.deactivate_pipeline(id).await?
    };
    println!("{} is now {}", pipeline.name, pipeline.status);
    Ok(())
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<()> {
    api.delete_pipeline(id).await?;
    println!("Deleted pipeline {}", id);
    Ok(())
}
