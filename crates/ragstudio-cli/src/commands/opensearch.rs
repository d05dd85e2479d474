//! OpenSearch cluster and index commands.

use std::path::Path;

use anyhow::Result;
use ragstudio_core::api::UploadFile;
use ragstudio_core::models::SearchQuery;
use ragstudio_core::ApiClient;
use serde_json::Value;

use super::column;

pub async fn health(api: &ApiClient) -> Result<()> {
    let health = api.cluster_health().await?;

    println!("Cluster:  {}", health.cluster_name);
    println!("Status:   {}", health.status);
    println!("Nodes:    {}", health.node_count);
    println!(
        "Shards:   {} active, {} relocating, {} initializing, {} unassigned",
        health.active_shards,
        health.relocating_shards,
        health.initializing_shards,
        health.unassigned_shards
    );
    println!("Active:   {:.1}%", health.active_shards_percent);
    if !health.is_green() {
        tracing::warn!(status = %health.status, "Cluster is not green");
    }
    Ok(())
}

pub async fn indices(api: &ApiClient, pattern: Option<&str>, include_system: bool) -> Result<()> {
    let list = api.list_indices(pattern, include_system).await?;

    println!(
        "{} {} {} {}",
        column("INDEX", 32),
        column("HEALTH", 7),
        column("DOCS", 10),
        "SIZE"
    );
    for index in &list.indices {
        let field = |key: &str| index.get(key).map(display_value).unwrap_or_default();
        println!(
            "{} {} {} {}",
            column(&field("index"), 32),
            column(&field("health"), 7),
            column(&field("docs.count"), 10),
            field("store.size")
        );
    }
    println!();
    println!("{} indices", list.total);
    Ok(())
}

pub async fn stats(api: &ApiClient, index: &str) -> Result<()> {
    let stats = api.index_stats(index).await?;

    println!("Index:     {}", stats.index_name);
    println!("Documents: {}", stats.document_count);
    println!("Size:      {} ({} bytes)", stats.size_human, stats.size_in_bytes);
    println!(
        "Shards:    {} primary, {} total",
        stats.primary_shards, stats.total_shards
    );
    Ok(())
}

pub async fn query(api: &ApiClient, index: &str, text: &str, top_k: u32) -> Result<()> {
    let mut query = SearchQuery::new(index, text);
    query.top_k = top_k;
    let result = api.search(&query).await?;

    println!("{} hits in {} ms", result.total_hits, result.took_ms);
    for (rank, hit) in result.hits.iter().enumerate() {
        let score = hit.get("score").map(display_value).unwrap_or_default();
        let title = hit
            .get("title")
            .or_else(|| hit.get("id"))
            .map(display_value)
            .unwrap_or_default();
        println!();
        println!("{}. {} (score {})", rank + 1, title, score);
        if let Some(content) = hit.get("content").and_then(Value::as_str) {
            let snippet: String = content.chars().take(200).collect();
            println!("   {}", snippet.replace('\n', " "));
        }
    }
    Ok(())
}

pub async fn upload(api: &ApiClient, index: &str, file: &Path, source: Option<&str>) -> Result<()> {
    let upload = UploadFile::from_path(file).await?;
    tracing::info!(index, file = %upload.file_name, bytes = upload.bytes.len(), "Uploading document");

    let response = api.upload_document(index, upload, source).await?;
    match response.get("message").and_then(Value::as_str) {
        Some(message) => println!("{}", message),
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }
    Ok(())
}

pub async fn reindex(api: &ApiClient, source: &str, target: &str, create: bool) -> Result<()> {
    let started = api.reindex(source, target, create).await?;

    println!(
        "{} -> {}: {}",
        started.source_index, started.target_index, started.status
    );
    if let Some(message) = &started.message {
        println!("{}", message);
    }
    if let Some(task_id) = &started.task_id {
        println!("Track with: ragstudio search task {}", task_id);
    }
    Ok(())
}

pub async fn task(api: &ApiClient, id: &str) -> Result<()> {
    let status = api.task_status(id).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub async fn models(api: &ApiClient) -> Result<()> {
    let models = api.list_models().await?;
    println!("Models");
    println!("======");
    for model in &models {
        println!(
            "{} {} {} {}",
            column(&model.id, 24),
            column(&model.name, 32),
            column(&model.model_type, 16),
            model.status
        );
    }

    let pipelines = api.list_ingest_pipelines().await?;
    println!();
    println!("Ingest pipelines");
    println!("================");
    for pipeline in &pipelines {
        println!(
            "{} {} processors  {}",
            column(&pipeline.id, 24),
            column(&pipeline.processor_count.to_string(), 3),
            pipeline.description
        );
    }
    Ok(())
}

/// Strings without quotes, everything else as JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value_unquotes_strings() {
        assert_eq!(display_value(&json!("green")), "green");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&Value::Null), "");
    }
}
