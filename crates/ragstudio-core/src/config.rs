//! Application configuration management.
//!
//! This module handles loading and saving the console configuration, which
//! includes the backend address, the last used username, the credential
//! backend and push-channel tuning.
//!
//! Configuration is stored at `~/.config/ragstudio/config.json`. The
//! `RAGSTUDIO_API_URL` environment variable overrides the stored address.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::auth::{FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore, SharedCredentials};

/// Application name used for config directory paths
const APP_NAME: &str = "ragstudio";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend address
pub const API_URL_ENV: &str = "RAGSTUDIO_API_URL";

/// Local backend origin with the versioned API prefix
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Message used when a failure response has no parsable `detail`.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Reconnect ceiling for push channels.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Base reconnect delay; attempt `n` waits `n` times this.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Where the bearer token is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
    /// Not persisted; the token lives for one process
    Memory,
}

/// Push-channel tuning as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub heartbeat_secs: Option<u64>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            heartbeat_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub last_username: Option<String>,
    pub credential_backend: CredentialBackend,
    pub request_timeout_secs: Option<u64>,
    pub channel: ChannelConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Backend address: environment, then config file, then the default.
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn client_settings(&self) -> Result<ClientSettings> {
        let mut settings = ClientSettings::new(&self.api_url())?;
        if let Some(secs) = self.request_timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }

    pub fn channel_settings(&self) -> ChannelSettings {
        ChannelSettings {
            max_attempts: self.channel.max_attempts,
            base_delay: Duration::from_millis(self.channel.base_delay_ms),
            heartbeat_interval: self.channel.heartbeat_secs.map(Duration::from_secs),
        }
    }

    /// Build the credential store selected by `credential_backend`
    pub fn credential_store(&self) -> Result<SharedCredentials> {
        Ok(match self.credential_backend {
            CredentialBackend::File => Arc::new(
                FileCredentialStore::in_config_dir().context("Failed to locate credential file")?,
            ),
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::new()),
            CredentialBackend::Memory => Arc::new(MemoryCredentialStore::new()),
        })
    }
}

/// Runtime settings for the request client.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Backend address including the versioned prefix, e.g. `.../api/v1`
    pub base_url: Url,
    pub timeout: Duration,
    pub fallback_error_message: String,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            fallback_error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        })
    }

    #[must_use]
    pub fn with_fallback_error_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_error_message = message.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runtime settings for one push-channel session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Send `{"type":"ping"}` at this interval while open
    pub heartbeat_interval: Option<Duration>,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            heartbeat_interval: None,
        }
    }
}

/// Parse and normalize a backend address. Only http and https are accepted,
/// and the path always ends with a slash so relative joins keep the prefix.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid API URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("API URL must use http or https, got {}", other),
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_adds_trailing_slash() {
        let url = parse_base_url("http://localhost:8000/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/");

        let url = parse_base_url("https://rag.example.com/api/v1/").unwrap();
        assert_eq!(url.as_str(), "https://rag.example.com/api/v1/");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        assert!(parse_base_url("ftp://localhost/api").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_config_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config {
            api_url: Some("http://rag.internal:9000/api/v1".to_string()),
            last_username: Some("admin".to_string()),
            credential_backend: CredentialBackend::Keyring,
            request_timeout_secs: Some(5),
            channel: ChannelConfig {
                max_attempts: 3,
                base_delay_ms: 250,
                heartbeat_secs: Some(20),
            },
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.last_username.as_deref(), Some("admin"));
        assert_eq!(loaded.credential_backend, CredentialBackend::Keyring);

        let channel = loaded.channel_settings();
        assert_eq!(channel.max_attempts, 3);
        assert_eq!(channel.base_delay, Duration::from_millis(250));
        assert_eq!(channel.heartbeat_interval, Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"last_username":"ops"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.credential_backend, CredentialBackend::File);
        assert_eq!(loaded.channel_settings(), ChannelSettings::default());
    }

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.api_url.is_none());
    }
}
