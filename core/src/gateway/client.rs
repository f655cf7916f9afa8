//! Authenticated loopback HTTP client.
//!
//! Wraps one `reqwest::Client` whose default headers carry the install
//! credential, so no call site ever touches the `Authorization` header.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::endpoint::Endpoint;
use super::error::{GatewayError, GatewayResult};
use super::types::{
    AccountBody, AddressValidity, AnchorBody, EarnBalance, EarnMarket, ExchangeRate, RawBalance,
    RestoreBody, RestoredAddress, SendBody, ServerStatus, SwapBody,
};
use crate::config::GatewayConfig;
use crate::metrics::ClientMetrics;
use crate::types::{Network, Wallet};
use crate::vault::InstallCredential;

// ---------------------------------------------------------------------------
// Capability Traits
// ---------------------------------------------------------------------------

/// The one call the readiness poller needs.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn status(&self) -> GatewayResult<ServerStatus>;
}

/// The full backend catalogue used by the wallet facade.
#[async_trait]
pub trait BackendRpc: StatusProbe {
    async fn create_wallet(&self, network: Network) -> GatewayResult<Wallet>;
    async fn restore_wallet(&self, mnemonic: &str) -> GatewayResult<RestoredAddress>;
    async fn balance(&self, address: &str, network: Network) -> GatewayResult<RawBalance>;
    async fn luna_rate(&self) -> GatewayResult<ExchangeRate>;
    async fn earn_balance(&self, body: &AccountBody<'_>) -> GatewayResult<EarnBalance>;
    async fn earn_market(&self, body: &AccountBody<'_>) -> GatewayResult<EarnMarket>;
    async fn anchor_deposit(&self, body: &AnchorBody<'_>) -> GatewayResult<Value>;
    async fn anchor_withdraw(&self, body: &AnchorBody<'_>) -> GatewayResult<Value>;
    /// Returns the raw response body; fee extraction happens in the facade.
    async fn swap_preview(&self, body: &SwapBody<'_>) -> GatewayResult<String>;
    async fn swap_commit(&self, body: &SwapBody<'_>) -> GatewayResult<String>;
    /// Returns the raw response body; fee extraction happens in the facade.
    async fn send_preview(&self, body: &SendBody<'_>) -> GatewayResult<String>;
    async fn send_commit(&self, body: &SendBody<'_>) -> GatewayResult<String>;
    async fn validate_address(&self, address: &str) -> GatewayResult<AddressValidity>;
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// HTTP client for the bundled backend.
#[derive(Clone)]
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    metrics: Option<ClientMetrics>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Builds the client. The credential is rendered once into a sensitive
    /// default header; certificate relaxation applies to this instance only.
    pub fn new(config: &GatewayConfig, credential: &InstallCredential) -> GatewayResult<Self> {
        let mut auth = HeaderValue::from_str(&credential.authorization_header())
            .map_err(|_| GatewayError::InvalidHeader)?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .no_proxy();
        if config.accept_self_signed && config.base_url.starts_with("https://") {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(GatewayError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            metrics: None,
        })
    }

    /// Attaches metric handles; failed calls are counted per endpoint.
    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and returns the body text of a 2xx reply.
    async fn dispatch<B>(&self, endpoint: Endpoint<'_>, body: Option<&B>) -> GatewayResult<String>
    where
        B: Serialize + Sync + ?Sized,
    {
        let name = endpoint.name();
        let url = format!("{}{}", self.base_url, endpoint.path());

        let mut request = self.http.request(endpoint.method(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| self.failed(GatewayError::Transport { endpoint: name, source }))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.failed(GatewayError::Status {
                endpoint: name,
                status: status.as_u16(),
            }));
        }

        let text = response
            .text()
            .await
            .map_err(|source| self.failed(GatewayError::Transport { endpoint: name, source }))?;
        tracing::trace!(endpoint = name, bytes = text.len(), "backend call ok");
        Ok(text)
    }

    async fn call<T, B>(&self, endpoint: Endpoint<'_>, body: Option<&B>) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let name = endpoint.name();
        let text = self.dispatch(endpoint, body).await?;
        serde_json::from_str(&text).map_err(|e| {
            self.failed(GatewayError::Decode {
                endpoint: name,
                message: e.to_string(),
            })
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> GatewayResult<T> {
        self.call::<T, ()>(endpoint, None).await
    }

    fn failed(&self, err: GatewayError) -> GatewayError {
        if err.is_auth_failure() {
            tracing::warn!(error = %err, "backend rejected credential");
        } else {
            tracing::debug!(error = %err, "backend call failed");
        }
        if let (Some(metrics), Some(endpoint)) = (&self.metrics, err.endpoint()) {
            metrics.record_rpc_failure(endpoint);
        }
        err
    }
}

#[async_trait]
impl StatusProbe for Gateway {
    async fn status(&self) -> GatewayResult<ServerStatus> {
        self.get(Endpoint::Status).await
    }
}

#[async_trait]
impl BackendRpc for Gateway {
    async fn create_wallet(&self, network: Network) -> GatewayResult<Wallet> {
        self.get(Endpoint::CreateWallet { network }).await
    }

    async fn restore_wallet(&self, mnemonic: &str) -> GatewayResult<RestoredAddress> {
        self.call(Endpoint::RestoreWallet, Some(&RestoreBody { mnemonic }))
            .await
    }

    async fn balance(&self, address: &str, network: Network) -> GatewayResult<RawBalance> {
        self.get(Endpoint::Balance { address, network }).await
    }

    async fn luna_rate(&self) -> GatewayResult<ExchangeRate> {
        self.get(Endpoint::LunaRate).await
    }

    async fn earn_balance(&self, body: &AccountBody<'_>) -> GatewayResult<EarnBalance> {
        self.call(Endpoint::EarnBalance, Some(body)).await
    }

    async fn earn_market(&self, body: &AccountBody<'_>) -> GatewayResult<EarnMarket> {
        self.call(Endpoint::EarnMarket, Some(body)).await
    }

    async fn anchor_deposit(&self, body: &AnchorBody<'_>) -> GatewayResult<Value> {
        self.call(Endpoint::AnchorDeposit, Some(body)).await
    }

    async fn anchor_withdraw(&self, body: &AnchorBody<'_>) -> GatewayResult<Value> {
        self.call(Endpoint::AnchorWithdraw, Some(body)).await
    }

    async fn swap_preview(&self, body: &SwapBody<'_>) -> GatewayResult<String> {
        self.dispatch(Endpoint::SwapPreview, Some(body)).await
    }

    async fn swap_commit(&self, body: &SwapBody<'_>) -> GatewayResult<String> {
        self.dispatch(Endpoint::SwapCommit, Some(body)).await
    }

    async fn send_preview(&self, body: &SendBody<'_>) -> GatewayResult<String> {
        self.dispatch(Endpoint::SendPreview, Some(body)).await
    }

    async fn send_commit(&self, body: &SendBody<'_>) -> GatewayResult<String> {
        self.dispatch(Endpoint::SendCommit, Some(body)).await
    }

    async fn validate_address(&self, address: &str) -> GatewayResult<AddressValidity> {
        self.get(Endpoint::ValidateAddress { address }).await
    }
}
