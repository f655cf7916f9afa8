//! # Vault Module — Credential & Settings Storage
//!
//! Everything the client needs to remember across restarts lives here:
//! the per-install credential, the wallet (address + mnemonic) and the
//! user's plain settings.
//!
//! ```text
//! cipher.rs     — AES-256-GCM seal/open with the entry name as AAD
//! keystore.rs   — KeyStore capability trait + sled envelope backend
//! store.rs      — Vault: encrypted secrets, plain settings, clear()
//! credential.rs — InstallCredential generation and Basic-Auth rendering
//! ```

pub mod cipher;
pub mod credential;
pub mod keystore;
pub mod store;

pub use credential::InstallCredential;
pub use keystore::{KeyStore, KeyStoreError, SledKeyStore};
pub use store::{Vault, VaultError, VaultResult};
