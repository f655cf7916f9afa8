//! Gateway error type.

use reqwest::StatusCode;

/// Errors produced by a single backend call. Nothing here is retried by the
/// gateway itself.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Connection refused, reset, or timed out.
    #[error("{endpoint}: transport error: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Any non-2xx reply, including rejected credentials.
    #[error("{endpoint}: backend returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
    },

    #[error("{endpoint}: could not decode response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },

    #[error("credential cannot be rendered as an Authorization header")]
    InvalidHeader,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl GatewayError {
    /// True for 401/403, i.e. the backend rejected the install credential.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            GatewayError::Status { status, .. }
                if *status == StatusCode::UNAUTHORIZED.as_u16()
                    || *status == StatusCode::FORBIDDEN.as_u16()
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Transport { source, .. } if source.is_timeout())
    }

    /// Endpoint name the error belongs to, if any.
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            GatewayError::Transport { endpoint, .. }
            | GatewayError::Status { endpoint, .. }
            | GatewayError::Decode { endpoint, .. } => Some(*endpoint),
            GatewayError::InvalidHeader | GatewayError::Client(_) => None,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
