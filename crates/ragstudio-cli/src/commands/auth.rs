//! Login, logout and status.

use std::io::{self, Write};

use anyhow::{bail, Result};
use ragstudio_core::{ApiClient, Config};
use tracing::warn;

pub async fn login(api: &ApiClient, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(name) => name,
        None => prompt_username()?,
    };
    if username.is_empty() {
        bail!("Username required");
    }

    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }

    api.login(&username, &password).await?;

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", username);
    Ok(())
}

pub async fn logout(api: &ApiClient) -> Result<()> {
    api.logout().await?;
    println!("Logged out");
    Ok(())
}

pub async fn status(api: &ApiClient) -> Result<()> {
    println!("Backend:   {}", api.base_url());
    println!(
        "Logged in: {}",
        if api.is_authenticated() { "yes" } else { "no" }
    );

    match api.cluster_health().await {
        Ok(health) => println!(
            "Cluster:   {} ({}, {} nodes)",
            health.cluster_name, health.status, health.node_count
        ),
        Err(e) if e.is_transport() => println!("Cluster:   unreachable"),
        Err(e) => println!("Cluster:   {}", e),
    }
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}
