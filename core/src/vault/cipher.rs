//! # AES-256-GCM Sealing
//!
//! Authenticated encryption for vault entries. Every secret is sealed with
//! its own per-name key and the entry name as additional authenticated
//! data, so a ciphertext copied under a different name refuses to open.
//!
//! ## Nonce management
//!
//! Random 96-bit nonces from the OS CSPRNG. A vault holds a handful of
//! entries that are rewritten rarely; the birthday bound is not a concern.
//!
//! ## Wire format
//!
//! [`seal`] returns `nonce || ciphertext || tag` as a single `Vec<u8>`;
//! [`open`] expects the same layout.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

/// AES-256 key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Errors from sealing or opening a vault entry.
///
/// Deliberately vague: "wrong key" and "corrupted ciphertext" look the same
/// from the outside.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    EncryptFailed,

    #[error("decryption failed -- wrong key or corrupted ciphertext")]
    DecryptFailed,

    #[error("ciphertext too short: must be at least {NONCE_LENGTH} bytes")]
    CiphertextTooShort,
}

/// Draws a fresh random AES-256 key.
pub fn generate_key() -> [u8; KEY_LENGTH] {
    let mut key = [0u8; KEY_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// Encrypts `plaintext` under `key`, authenticating `aad` alongside it.
pub fn seal(key: &[u8; KEY_LENGTH], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::EncryptFailed)?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CipherError::EncryptFailed)?;

    let mut out = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts data produced by [`seal`]. The `aad` must match byte for byte.
pub fn open(key: &[u8; KEY_LENGTH], sealed: &[u8], aad: &[u8]) -> Result<Vec<u8>, CipherError> {
    if sealed.len() < NONCE_LENGTH {
        return Err(CipherError::CiphertextTooShort);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LENGTH);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::DecryptFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CipherError::DecryptFailed)
}
