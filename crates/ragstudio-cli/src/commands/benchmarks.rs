//! Benchmark commands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ragstudio_core::models::ExportFormat;
use ragstudio_core::ApiClient;

use super::column;

pub async fn list(
    api: &ApiClient,
    skip: Option<u64>,
    limit: Option<u64>,
    status: Option<&str>,
) -> Result<()> {
    let page = api.list_benchmarks(skip, limit, status).await?;

    println!(
        "{} {} {} {} {}",
        column("ID", 36),
        column("NAME", 24),
        column("STATUS", 10),
        column("PIPELINES", 9),
        "CREATED"
    );
    for run in &page.items {
        let created = run
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{} {} {} {} {}",
            column(&run.id, 36),
            column(&run.name, 24),
            column(&run.status, 10),
            column(&run.pipeline_count.to_string(), 9),
            created
        );
    }
    println!();
    println!("{} of {} benchmarks", page.items.len(), page.total);
    Ok(())
}

pub async fn show(api: &ApiClient, id: &str) -> Result<()> {
    let result = api.get_benchmark(id).await?;

    println!("Benchmark {}", result.benchmark_id);
    println!("Status:   {}", result.status);
    println!("Queries:  {}", result.total_queries);
    println!("Duration: {:.1}s", result.duration_seconds);
    if let Some(error) = &result.error {
        println!("Error:    {}", error);
    }

    println!();
    println!(
        "{} {} {} {} {}",
        column("PIPELINE", 36),
        column("MEAN MS", 9),
        column("P95 MS", 9),
        column("SCORE", 7),
        "SUCCESS"
    );
    let mut pipelines: Vec<_> = result.metrics.values().collect();
    pipelines.sort_by(|a, b| a.pipeline_id.cmp(&b.pipeline_id));
    for metrics in pipelines {
        let fmt_opt = |v: Option<f64>, precision: usize| {
            v.map(|v| format!("{:.*}", precision, v))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{} {} {} {} {:.1}%",
            column(&metrics.pipeline_id, 36),
            column(&fmt_opt(metrics.mean_latency_ms(), 1), 9),
            column(&fmt_opt(metrics.p95_latency_ms(), 1), 9),
            column(&fmt_opt(metrics.mean_retrieval_score(), 3), 7),
            metrics.success_rate * 100.0
        );
    }

    for comparison in &result.comparisons {
        println!();
        println!(
            "{} vs {}: {} wins",
            comparison.pipeline_a, comparison.pipeline_b, comparison.winner
        );
        println!("  {}", comparison.summary);
    }
    Ok(())
}

pub async fn export(
    api: &ApiClient,
    id: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let download = api.export_benchmark(id, format).await?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(
            download
                .filename
                .clone()
                .unwrap_or_else(|| format!("benchmark_{}.{}", id, format.extension())),
        )
    });
    std::fs::write(&path, &download.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {} bytes to {}", download.bytes.len(), path.display());
    Ok(())
}

pub async fn compare(api: &ApiClient, first: &str, second: &str) -> Result<()> {
    let comparison = api.compare_benchmarks(first, second).await?;

    println!(
        "{} ({}) vs {} ({})",
        comparison.benchmark_1.name,
        comparison.benchmark_1.id,
        comparison.benchmark_2.name,
        comparison.benchmark_2.id
    );
    println!();
    println!(
        "{} {} {} {}",
        column("PIPELINE", 36),
        column("LATENCY", 9),
        column("SCORE", 9),
        "SUCCESS"
    );
    for pipeline_id in &comparison.common_pipelines {
        if let Some(delta) = comparison.pipeline_comparison.get(pipeline_id) {
            println!(
                "{} {} {} {:+.1}%",
                column(pipeline_id, 36),
                column(&format!("{:+.1}%", delta.latency_improvement), 9),
                column(&format!("{:+.1}%", delta.retrieval_score_improvement), 9),
                delta.success_rate_difference
            );
        }
    }

    if !comparison.unique_to_benchmark_1.is_empty() {
        println!();
        println!("Only in {}: {}", first, comparison.unique_to_benchmark_1.join(", "));
    }
    if !comparison.unique_to_benchmark_2.is_empty() {
        println!("Only in {}: {}", second, comparison.unique_to_benchmark_2.join(", "));
    }
    Ok(())
}

pub async fn generate(api: &ApiClient, count: u32, query_types: &[String]) -> Result<()> {
    let types: Vec<&str> = query_types.iter().map(String::as_str).collect();
    let cases = api.generate_test_cases(count, &types).await?;

    for case in &cases {
        let kind = case.query_type.as_deref().unwrap_or("-");
        println!("{} {} {}", column(&case.query_id, 12), column(kind, 12), case.query);
    }
    println!();
    println!("{} test cases generated", cases.len());
    Ok(())
}

pub async fn delete(api: &ApiClient, id: &str) -> Result<()> {
    api.delete_benchmark(id).await?;
    println!("Deleted benchmark {}", id);
    Ok(())
}
