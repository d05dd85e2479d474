//! Client library for a RAG Studio backend.
//!
//! - [`api`]: typed request client and resource endpoints
//! - [`channel`]: reconnecting push channel for live progress
//! - [`auth`]: credential stores shared by both
//! - [`config`]: configuration file and runtime settings
//! - [`models`]: backend request and response types

pub mod api;
pub mod auth;
pub mod channel;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{Credential, CredentialStore, SharedCredentials};
pub use channel::{ChannelEvent, ChannelHandler, ChannelSession, ChannelState};
pub use config::{ChannelSettings, ClientSettings, Config};
