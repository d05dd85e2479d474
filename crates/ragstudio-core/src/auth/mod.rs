//! Credential management for the console.
//!
//! This module provides:
//! - `Credential`: the bearer token proving an authenticated session
//! - `CredentialStore`: the durable key-value location of that token, with
//!   in-memory, JSON file and OS keychain implementations
//!
//! The store is injected into both the `ApiClient` and every
//! `ChannelSession`; nothing reads the token from a global.

pub mod credentials;
pub mod file_store;

pub use credentials::{
    Credential, CredentialError, CredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    SharedCredentials, CREDENTIAL_KEY,
};
pub use file_store::FileCredentialStore;
