//! # Vault — Encrypted Secrets & Plain Settings
//!
//! The persistence layer of the client, built on sled. Two named trees hold
//! the data and a third backs the default key store:
//!
//! | Tree       | Key          | Value                                 |
//! |------------|--------------|---------------------------------------|
//! | `secrets`  | name (UTF-8) | `nonce || AES-GCM(ciphertext || tag)` |
//! | `settings` | name (UTF-8) | JSON-encoded scalar                   |
//! | `keystore` | alias (UTF-8)| 32-byte AES key ([`SledKeyStore`])    |
//!
//! Every call is synchronous and may touch the disk. Keep it off
//! latency-sensitive paths (`tokio::task::spawn_blocking` from async code).

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::{Db, Tree};

use super::keystore::{KeyStore, KeyStoreError, SledKeyStore};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("sled error: {0}")]
    Storage(#[from] sled::Error),

    /// Key and ciphertext are both present but do not open. Usually the OS
    /// invalidated the key; the entry has to be re-provisioned.
    #[error("secret '{name}' could not be decrypted")]
    Decryption { name: String },

    #[error("secret '{name}' could not be encrypted")]
    Encryption { name: String },

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// At-rest encrypted storage for small named secrets, plus plain storage for
/// non-sensitive settings.
///
/// Construct exactly one per process and share it through `Arc<Vault>`.
pub struct Vault {
    db: Db,
    secrets: Tree,
    settings: Tree,
    keys: Arc<dyn KeyStore>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("secrets", &self.secrets.len())
            .field("settings", &self.settings.len())
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Opens or creates a vault at `path`, using the sled-backed key store.
    pub fn open<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Creates a throwaway vault that disappears on drop. For tests.
    pub fn open_temporary() -> VaultResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    /// Opens a vault whose keys are held by an external key store (OS
    /// keychain, hardware enclave, ...).
    pub fn with_key_store(db: Db, keys: Arc<dyn KeyStore>) -> VaultResult<Self> {
        let secrets = db.open_tree("secrets")?;
        let settings = db.open_tree("settings")?;
        Ok(Self {
            db,
            secrets,
            settings,
            keys,
        })
    }

    fn from_db(db: Db) -> VaultResult<Self> {
        let keys = Arc::new(SledKeyStore::new(db.open_tree("keystore")?));
        Self::with_key_store(db, keys)
    }

    /// The key store backing this vault.
    pub fn key_store(&self) -> &Arc<dyn KeyStore> {
        &self.keys
    }

    // -- Secrets -------------------------------------------------------------

    /// Encrypts `value` under the key bound to `name` (created on first use)
    /// and persists the ciphertext.
    pub fn store_secret(&self, name: &str, value: &str) -> VaultResult<()> {
        self.keys.ensure_key(name)?;
        let sealed = self
            .keys
            .encrypt(name, value.as_bytes(), name.as_bytes())
            .map_err(|e| {
                tracing::warn!(secret = name, error = %e, "failed to seal secret");
                VaultError::Encryption {
                    name: name.to_string(),
                }
            })?;
        self.secrets.insert(name.as_bytes(), sealed)?;
        self.db.flush()?;
        tracing::debug!(secret = name, "secret stored");
        Ok(())
    }

    /// Loads and decrypts the secret `name`.
    ///
    /// Returns `Ok(None)` when either the key or the ciphertext is missing,
    /// and [`VaultError::Decryption`] when both exist but do not open.
    pub fn load_secret(&self, name: &str) -> VaultResult<Option<String>> {
        let Some(sealed) = self.secrets.get(name.as_bytes())? else {
            return Ok(None);
        };
        if !self.keys.has_key(name)? {
            tracing::debug!(secret = name, "ciphertext without key, treating as absent");
            return Ok(None);
        }

        let plain = self
            .keys
            .decrypt(name, &sealed, name.as_bytes())
            .map_err(|e| {
                tracing::warn!(secret = name, error = %e, "secret failed to decrypt");
                VaultError::Decryption {
                    name: name.to_string(),
                }
            })?;

        String::from_utf8(plain)
            .map(Some)
            .map_err(|_| VaultError::Decryption {
                name: name.to_string(),
            })
    }

    /// Serializes `value` as JSON and stores it as a secret.
    pub fn store_secret_json<T: Serialize>(&self, name: &str, value: &T) -> VaultResult<()> {
        let json =
            serde_json::to_string(value).map_err(|e| VaultError::Serialization(e.to_string()))?;
        self.store_secret(name, &json)
    }

    /// Loads a secret and deserializes it from JSON.
    pub fn load_secret_json<T: DeserializeOwned>(&self, name: &str) -> VaultResult<Option<T>> {
        match self.load_secret(name)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| VaultError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Removes one secret together with its key.
    pub fn remove(&self, name: &str) -> VaultResult<()> {
        self.secrets.remove(name.as_bytes())?;
        self.keys.delete_key(name)?;
        self.db.flush()?;
        Ok(())
    }

    // -- Settings ------------------------------------------------------------

    /// Persists a non-sensitive setting in plain form.
    pub fn store<T: Serialize>(&self, name: &str, value: &T) -> VaultResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| VaultError::Serialization(e.to_string()))?;
        self.settings.insert(name.as_bytes(), bytes)?;
        self.db.flush()?;
        Ok(())
    }

    /// Reads a plain setting. `Ok(None)` if it was never written.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> VaultResult<Option<T>> {
        match self.settings.get(name.as_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| VaultError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Wipes every secret, every setting and all key material. Irreversible.
    pub fn clear(&self) -> VaultResult<()> {
        self.secrets.clear()?;
        self.settings.clear()?;
        self.keys.delete_all()?;
        self.db.flush()?;
        tracing::info!("vault cleared");
        Ok(())
    }
}
