//! CLI command implementations.

pub mod auth;
pub mod benchmarks;
pub mod builder;
pub mod opensearch;
pub mod pipelines;
pub mod watch;

use anyhow::{Context, Result};
use ragstudio_core::{ApiClient, Config};

/// Request client for the configured backend and credential store
pub fn build_client(config: &Config) -> Result<ApiClient> {
    let settings = config.client_settings()?;
    let credentials = config.credential_store()?;
    ApiClient::new(settings, credentials).context("Failed to create API client")
}

/// Pad or truncate to a fixed column width
pub(crate) fn column(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}~", cut)
    } else {
        format!("{:<width$}", text, width = width)
    }
}
