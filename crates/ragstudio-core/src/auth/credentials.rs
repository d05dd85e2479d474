use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use keyring::Entry;
use thiserror::Error;

/// Keychain service name
const SERVICE_NAME: &str = "ragstudio";

/// Fixed key the token is stored under, in every backend.
pub const CREDENTIAL_KEY: &str = "access_token";

/// Bearer token returned by the login endpoint.
///
/// The backend is the only authority on validity; no expiry is tracked here.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank token can never authenticate and is treated as absent
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Could not find config directory")]
    NoConfigDir,
}

/// Durable location of the single credential value.
///
/// Reads happen on every request and connection attempt; writes only on
/// login (`store`) and logout (`clear`).
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    fn store(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), CredentialError>;

    fn is_present(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

/// Handle shared by the request client and channel sessions.
pub type SharedCredentials = Arc<dyn CredentialStore>;

/// Process-local store, used by tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: RwLock::new(Some(credential)),
        }
    }

    pub fn shared(self) -> SharedCredentials {
        Arc::new(self)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let slot = self.slot.read().unwrap_or_else(|e| e.into_inner());
        Ok(slot.clone().filter(|credential| !credential.is_blank()))
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
        Ok(())
    }
}

/// Token kept in the OS keychain
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Use a separate keychain service, e.g. one per backend profile
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<Entry, CredentialError> {
        Ok(Entry::new(&self.service, CREDENTIAL_KEY)?)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(Credential::new(token)).filter(|c| !c.is_blank())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        self.entry()?.set_password(credential.as_str())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("super-secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_credential_bearer() {
        assert_eq!(Credential::new("abc").bearer(), "Bearer abc");
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_present());

        store.store(&Credential::new("tok")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Credential::new("tok")));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_memory_store_ignores_blank_token() {
        let store = MemoryCredentialStore::with_credential(Credential::new("  "));
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_present());
    }
}
