//! Key vaults
//!
//! Secrets are addressed by composite keys of the form
//! `"{identity}/{purpose}"`. The file vault keeps every value encrypted
//! with the vault password; nothing sensitive is written in clear text.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::keys::{decrypt_secret, encrypt_secret, KeyError};

/// Vault purpose under which an identity's mnemonic is stored
pub const MNEMONIC_PURPOSE: &str = "mnemonic";

/// Vault errors
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Vault lock poisoned: {0}")]
    Lock(String),
}

/// Build the vault key for an identity's secret
pub fn secret_key(identity: &str, purpose: &str) -> String {
    format!("{}/{}", identity, purpose)
}

/// Secret storage keyed by `"{identity}/{purpose}"`
#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Read a secret, `None` if it was never set
    async fn get_secret(&self, key: &str) -> Result<Option<String>, VaultError>;

    /// Store a secret, replacing any previous value
    async fn set_secret(&self, key: &str, value: &str) -> Result<(), VaultError>;

    /// Read a secret that must exist
    async fn require_secret(&self, key: &str) -> Result<String, VaultError> {
        self.get_secret(key)
            .await?
            .ok_or_else(|| VaultError::SecretNotFound(key.to_string()))
    }
}

/// Unencrypted, process-local vault
#[derive(Debug, Default)]
pub struct MemoryKeyVault {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemoryKeyVault {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyVault for MemoryKeyVault {
    async fn get_secret(&self, key: &str) -> Result<Option<String>, VaultError> {
        let secrets = self
            .secrets
            .read()
            .map_err(|e| VaultError::Lock(e.to_string()))?;
        Ok(secrets.get(key).cloned())
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<(), VaultError> {
        let mut secrets = self
            .secrets
            .write()
            .map_err(|e| VaultError::Lock(e.to_string()))?;
        secrets.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// On-disk vault document
///
/// Saved to `<data_dir>/vault.json`; values are hex AES-GCM envelopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultFile {
    /// When the vault file was first written
    pub created_at: DateTime<Utc>,

    /// Encrypted secrets by composite key
    pub secrets: BTreeMap<String, String>,
}

impl VaultFile {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            secrets: BTreeMap::new(),
        }
    }
}

/// Password-protected vault persisted as a JSON file
pub struct FileKeyVault {
    path: PathBuf,
    password: String,
    write_lock: Mutex<()>,
}

impl FileKeyVault {
    /// Open the vault at `path`; the file is created on first write
    pub fn new<P: AsRef<Path>>(path: P, password: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            password: password.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the vault file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Composite keys currently stored (values stay encrypted)
    pub fn keys(&self) -> Result<Vec<String>, VaultError> {
        Ok(self.read_file()?.secrets.into_keys().collect())
    }

    fn read_file(&self) -> Result<VaultFile, VaultError> {
        if !self.path.exists() {
            return Ok(VaultFile::new());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write_file(&self, file: &VaultFile) -> Result<(), VaultError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(file)?;

        // Write a sibling temp file and rename it over the vault so readers
        // see either the old or the new document, never a partial one
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl KeyVault for FileKeyVault {
    async fn get_secret(&self, key: &str) -> Result<Option<String>, VaultError> {
        let file = self.read_file()?;
        match file.secrets.get(key) {
            Some(encrypted) => Ok(Some(decrypt_secret(encrypted, &self.password)?)),
            None => Ok(None),
        }
    }

    async fn set_secret(&self, key: &str, value: &str) -> Result<(), VaultError> {
        let encrypted = encrypt_secret(value, &self.password)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| VaultError::Lock(e.to_string()))?;
        let mut file = self.read_file()?;
        file.secrets.insert(key.to_string(), encrypted);
        self.write_file(&file)?;

        log::debug!("✓ Stored secret '{}' in {}", key, self.path.display());

        Ok(())
    }
}
