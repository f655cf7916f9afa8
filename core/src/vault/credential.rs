//! Per-install Basic-Auth credential.
//!
//! The backend accepts requests only from the client that launched it. Both
//! sides learn the same username/password pair at launch time; the client
//! keeps its copy encrypted in the vault so it survives restarts.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::store::{Vault, VaultError, VaultResult};
use crate::config::{CREDENTIAL_HEX_WIDTH, SECRET_INSTALL_CREDENTIAL};

/// Username/password pair shared with the loopback backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCredential {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for InstallCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl InstallCredential {
    /// Draws a fresh pair: two independent 64-bit values from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            username: render_token(rng.next_u64()),
            password: render_token(rng.next_u64()),
        }
    }

    /// Returns the stored credential, generating and persisting one on first
    /// run (or after the vault was cleared).
    ///
    /// A stored pair that no longer decrypts is replaced. The backend learns
    /// the credential at launch, so a fresh one is always safe to hand out.
    pub fn load_or_create(vault: &Vault) -> VaultResult<Self> {
        match vault.load_secret_json::<Self>(SECRET_INSTALL_CREDENTIAL) {
            Ok(Some(existing)) => return Ok(existing),
            Ok(None) => {}
            Err(VaultError::Decryption { name }) => {
                tracing::warn!(secret = %name, "install credential no longer decrypts, regenerating");
                vault.remove(SECRET_INSTALL_CREDENTIAL)?;
            }
            Err(e) => return Err(e),
        }
        let fresh = Self::generate();
        vault.store_secret_json(SECRET_INSTALL_CREDENTIAL, &fresh)?;
        tracing::info!(username = %fresh.username, "generated install credential");
        Ok(fresh)
    }

    /// `base64(username:password)`, the payload of the Basic scheme.
    pub fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    /// Full `Authorization` header value.
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", self.basic_token())
    }
}

/// Lowercase hex, zero-padded on the left to a constant width so the
/// rendered length leaks nothing about the value.
fn render_token(value: u64) -> String {
    format!("{:0width$x}", value, width = CREDENTIAL_HEX_WIDTH)
}
