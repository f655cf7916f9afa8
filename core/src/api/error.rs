//! Facade error type and its coarse classification.

use crate::gateway::GatewayError;
use crate::vault::VaultError;

/// Coarse category for presenting an [`ApiError`] to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Backend unreachable or timed out. Usually transient.
    Transport,
    /// Backend rejected the install credential.
    Authentication,
    /// A stored secret no longer decrypts; re-provision it.
    Decryption,
    /// Local storage failed.
    Storage,
    /// Input rejected before dispatch.
    Validation,
    /// Backend answered with an error status or an unexpected body.
    Protocol,
    /// Operation needs a wallet and none is loaded.
    NoWallet,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("no wallet loaded")]
    NoWallet,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Gateway(e) if e.is_auth_failure() => ErrorKind::Authentication,
            ApiError::Gateway(GatewayError::InvalidHeader) => ErrorKind::Authentication,
            ApiError::Gateway(GatewayError::Transport { .. } | GatewayError::Client(_)) => {
                ErrorKind::Transport
            }
            ApiError::Gateway(GatewayError::Status { .. } | GatewayError::Decode { .. }) => {
                ErrorKind::Protocol
            }
            ApiError::Vault(VaultError::Decryption { .. }) => ErrorKind::Decryption,
            ApiError::Vault(_) => ErrorKind::Storage,
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::MalformedResponse(_) => ErrorKind::Protocol,
            ApiError::NoWallet => ErrorKind::NoWallet,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_mapped() {
        let status = |status| {
            ApiError::Gateway(GatewayError::Status {
                endpoint: "balance",
                status,
            })
        };
        assert_eq!(status(401).kind(), ErrorKind::Authentication);
        assert_eq!(status(500).kind(), ErrorKind::Protocol);
        assert_eq!(
            ApiError::Vault(VaultError::Decryption {
                name: "wallet".into()
            })
            .kind(),
            ErrorKind::Decryption
        );
        assert_eq!(ApiError::NoWallet.kind(), ErrorKind::NoWallet);
        assert_eq!(
            ApiError::Validation("amount".into()).kind(),
            ErrorKind::Validation
        );
    }
}
