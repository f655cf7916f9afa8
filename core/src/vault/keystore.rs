//! # Key Store Capability
//!
//! The vault never handles raw key material directly. It asks a
//! [`KeyStore`] to encrypt or decrypt on its behalf, naming the key by
//! alias. On a phone this is the hardware-backed keystore; on desktop ports
//! it can be the OS keychain. [`SledKeyStore`] is the file-based envelope
//! backend that ships with the crate: keys live in their own sled tree and
//! never leave the type.

use sled::Tree;

use super::cipher::{self, KEY_LENGTH};

/// Errors raised by a key store backend.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("no key stored under alias '{0}'")]
    MissingKey(String),

    #[error("key material for '{0}' is corrupt")]
    CorruptKey(String),

    #[error("cipher failure: {0}")]
    Cipher(#[from] cipher::CipherError),

    #[error("key store backend error: {0}")]
    Backend(String),
}

impl From<sled::Error> for KeyStoreError {
    fn from(e: sled::Error) -> Self {
        KeyStoreError::Backend(e.to_string())
    }
}

/// Per-alias, non-exportable symmetric keys.
///
/// There is intentionally no `get_key` accessor: callers hand over bytes and
/// get sealed or opened bytes back.
pub trait KeyStore: Send + Sync {
    /// Returns `true` if a key exists for `alias`.
    fn has_key(&self, alias: &str) -> Result<bool, KeyStoreError>;

    /// Generates a key for `alias` unless one already exists.
    fn ensure_key(&self, alias: &str) -> Result<(), KeyStoreError>;

    /// Seals `plaintext` with the key for `alias`, binding `aad`.
    fn encrypt(&self, alias: &str, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, KeyStoreError>;

    /// Opens data previously produced by [`KeyStore::encrypt`].
    fn decrypt(&self, alias: &str, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, KeyStoreError>;

    /// Deletes the key for `alias`. Missing keys are not an error.
    fn delete_key(&self, alias: &str) -> Result<(), KeyStoreError>;

    /// Deletes every key held by this store.
    fn delete_all(&self) -> Result<(), KeyStoreError>;
}

/// Envelope key store backed by a dedicated sled tree.
#[derive(Debug, Clone)]
pub struct SledKeyStore {
    keys: Tree,
}

impl SledKeyStore {
    /// Wraps an already-opened tree. The tree should not be shared with
    /// anything else.
    pub fn new(keys: Tree) -> Self {
        Self { keys }
    }

    fn load_key(&self, alias: &str) -> Result<[u8; KEY_LENGTH], KeyStoreError> {
        let raw = self
            .keys
            .get(alias.as_bytes())?
            .ok_or_else(|| KeyStoreError::MissingKey(alias.to_string()))?;
        <[u8; KEY_LENGTH]>::try_from(&raw[..])
            .map_err(|_| KeyStoreError::CorruptKey(alias.to_string()))
    }
}

impl KeyStore for SledKeyStore {
    fn has_key(&self, alias: &str) -> Result<bool, KeyStoreError> {
        Ok(self.keys.contains_key(alias.as_bytes())?)
    }

    fn ensure_key(&self, alias: &str) -> Result<(), KeyStoreError> {
        let key = cipher::generate_key();
        // compare_and_swap keeps an existing key if two writers race.
        let _ = self
            .keys
            .compare_and_swap(alias.as_bytes(), None as Option<&[u8]>, Some(&key[..]))?;
        Ok(())
    }

    fn encrypt(&self, alias: &str, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        let key = self.load_key(alias)?;
        Ok(cipher::seal(&key, plaintext, aad)?)
    }

    fn decrypt(&self, alias: &str, sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, KeyStoreError> {
        let key = self.load_key(alias)?;
        Ok(cipher::open(&key, sealed, aad)?)
    }

    fn delete_key(&self, alias: &str) -> Result<(), KeyStoreError> {
        self.keys.remove(alias.as_bytes())?;
        Ok(())
    }

    fn delete_all(&self) -> Result<(), KeyStoreError> {
        self.keys.clear()?;
        Ok(())
    }
}
