use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::credentials::{Credential, CredentialError, CredentialStore, CREDENTIAL_KEY};

/// Application name used for the config directory path
const APP_NAME: &str = "ragstudio";

/// Credential file name in the config directory
const CREDENTIAL_FILE: &str = "credentials.json";

/// JSON key-value file holding the token under `access_token`.
///
/// Other keys in the file are preserved, so the file can be shared with
/// other local state without being clobbered.
pub struct FileCredentialStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<config_dir>/ragstudio/credentials.json`
    pub fn in_config_dir() -> Result<Self, CredentialError> {
        let config_dir = dirs::config_dir().ok_or(CredentialError::NoConfigDir)?;
        Ok(Self::new(config_dir.join(APP_NAME).join(CREDENTIAL_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|source| CredentialError::Io {
            path: self.path.clone(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        let io_err = |source| CredentialError::Io {
            path: self.path.clone(),
            source,
        };

        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).map_err(io_err)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).map_err(io_err)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let entries = self.read_entries()?;
        Ok(entries
            .get(CREDENTIAL_KEY)
            .filter(|token| !token.is_empty())
            .map(|token| Credential::new(token.clone())))
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries()?;
        entries.insert(CREDENTIAL_KEY.to_string(), credential.as_str().to_string());
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Credential stored");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            // A corrupt file cannot hold a usable token; drop it entirely
            Err(CredentialError::Corrupt(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        entries.remove(CREDENTIAL_KEY);
        self.write_entries(&entries)?;
        debug!(path = %self.path.display(), "Credential cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_has_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_store_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let store = FileCredentialStore::new(&path);

        store.store(&Credential::new("tok-1")).unwrap();
        assert!(path.exists());
        assert_eq!(store.load().unwrap(), Some(Credential::new("tok-1")));

        // A second store instance sees the same value
        let other = FileCredentialStore::new(&path);
        assert_eq!(other.load().unwrap(), Some(Credential::new("tok-1")));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"theme":"dark","access_token":"tok"}"#).unwrap();

        let store = FileCredentialStore::new(&path);
        store.clear().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("theme"));
        assert!(!contents.contains("access_token"));
    }

    #[test]
    fn test_clear_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().is_err());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
