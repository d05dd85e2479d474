//! Visual builder commands.

use std::path::Path;

use anyhow::{bail, Context, Result};
use ragstudio_core::models::GraphState;
use ragstudio_core::ApiClient;

use super::column;

pub async fn components(api: &ApiClient) -> Result<()> {
    let components = api.builder_components().await?;
    for component in &components {
        println!(
            "{} {} {}",
            column(&component.id, 24),
            column(&component.category, 14),
            component.description
        );
    }
    Ok(())
}

pub async fn templates(api: &ApiClient) -> Result<()> {
    let templates = api.builder_templates().await?;
    for template in &templates {
        println!(
            "{} {} {} nodes  {}",
            column(&template.id, 24),
            column(&template.name, 28),
            column(&template.graph.nodes.len().to_string(), 3),
            template.description
        );
    }
    Ok(())
}

pub async fn validate(api: &ApiClient, file: &Path) -> Result<()> {
    let graph = read_graph(file)?;
    let report = api.validate_graph(&graph).await?;

    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        println!("error: {}", error);
    }
    if !report.is_valid {
        bail!("Graph is invalid ({} errors)", report.errors.len());
    }
    println!(
        "Graph is valid: {} nodes, {} edges",
        report.node_count, report.edge_count
    );
    Ok(())
}

pub async fn compile(api: &ApiClient, file: &Path, name: &str) -> Result<()> {
    let graph = read_graph(file)?;
    let compiled = api.compile_graph(&graph, name).await?;

    println!("Pipeline {} ({})", compiled.pipeline_name, compiled.pipeline_id);
    println!("Order:    {}", compiled.execution_order.join(" -> "));
    println!(
        "Size:     {} components, {} connections",
        compiled.component_count, compiled.connection_count
    );
    println!("Latency:  ~{} ms", compiled.estimated_latency_ms);
    println!();
    println!("{}", compiled.code_snippet);
    Ok(())
}

fn read_graph(file: &Path) -> Result<GraphState> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse graph {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_graph_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"nodes":[{{"id":"n1","type":"input","position":{{"x":0,"y":0}},"data":{{"label":"Query","type":"query_input"}}}}],"edges":[]}}"#
        )
        .unwrap();

        let graph = read_graph(file.path()).unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].data.component, "query_input");
    }

    #[test]
    fn test_read_graph_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_graph(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse graph"));
    }
}
