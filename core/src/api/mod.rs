//! # Wallet API — Domain Facade
//!
//! Turns raw backend calls into wallet operations: unit conversion, fee
//! extraction, settings, and the persisted wallet. Every gateway call runs
//! to completion or times out; nothing here retries.
//!
//! ```text
//! models.rs  — CoinSnapshot, previews, WalletOverview, Settings
//! convert.rs — micro-unit scaling, fee/balance unpacking, input checks
//! error.rs   — ApiError + ErrorKind
//! ```

pub mod convert;
pub mod error;
pub mod models;

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::config::{DEFAULT_STAKING_RATE, SECRET_WALLET, SETTING_NETWORK, SETTING_PAY_GAS};
use crate::gateway::types::{AccountBody, AnchorBody, SendBody, SwapBody};
use crate::gateway::BackendRpc;
use crate::types::{Denom, Network, Wallet};
use crate::vault::{Vault, VaultError};

pub use error::{ApiError, ApiResult, ErrorKind};
pub use models::{
    CoinSnapshot, SendPreview, SendRequest, Settings, SwapPreview, SwapRequest, WalletOverview,
};

pub struct WalletApi<R: BackendRpc> {
    rpc: Arc<R>,
    vault: Arc<Vault>,
    wallet: RwLock<Option<Wallet>>,
    staking_rate: RwLock<f64>,
}

impl<R: BackendRpc> WalletApi<R> {
    pub fn new(rpc: Arc<R>, vault: Arc<Vault>) -> Self {
        Self {
            rpc,
            vault,
            wallet: RwLock::new(None),
            staking_rate: RwLock::new(DEFAULT_STAKING_RATE),
        }
    }

    // -- Wallet lifecycle ----------------------------------------------------

    /// Creates a wallet on the selected network and persists it.
    pub async fn create_wallet(&self) -> ApiResult<Wallet> {
        let network = self.network()?;
        let wallet = self.rpc.create_wallet(network).await?;
        self.vault.store_secret_json(SECRET_WALLET, &wallet)?;
        tracing::info!(address = %wallet.address, %network, "wallet created");
        *self.wallet.write() = Some(wallet.clone());
        Ok(wallet)
    }

    /// Restores a wallet from its mnemonic.
    ///
    /// If a wallet is already stored it is returned as-is and no call is
    /// made. A stored wallet that no longer decrypts is discarded and the
    /// restore goes ahead.
    pub async fn restore_wallet(&self, mnemonic: &str) -> ApiResult<Wallet> {
        let stored = match self.load_wallet() {
            Ok(stored) => stored,
            Err(ApiError::Vault(VaultError::Decryption { name })) => {
                tracing::warn!(secret = %name, "stored wallet no longer decrypts, discarding it");
                self.vault.remove(SECRET_WALLET)?;
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(existing) = stored {
            tracing::debug!(address = %existing.address, "wallet already stored");
            return Ok(existing);
        }
        let mnemonic = mnemonic.trim();
        if mnemonic.is_empty() {
            return Err(ApiError::Validation("mnemonic is empty".into()));
        }

        let restored = self.rpc.restore_wallet(mnemonic).await?;
        let wallet = Wallet {
            address: restored.acc_address,
            mnemonic: mnemonic.to_string(),
        };
        self.vault.store_secret_json(SECRET_WALLET, &wallet)?;
        tracing::info!(address = %wallet.address, "wallet restored");
        *self.wallet.write() = Some(wallet.clone());
        Ok(wallet)
    }

    /// Loads the persisted wallet into the session, if any.
    pub fn load_wallet(&self) -> ApiResult<Option<Wallet>> {
        let wallet: Option<Wallet> = self.vault.load_secret_json(SECRET_WALLET)?;
        *self.wallet.write() = wallet.clone();
        Ok(wallet)
    }

    pub fn current_wallet(&self) -> Option<Wallet> {
        self.wallet.read().clone()
    }

    /// Forgets the wallet, both in the session and on disk. Settings and the
    /// install credential stay.
    pub fn logout(&self) -> ApiResult<()> {
        self.vault.remove(SECRET_WALLET)?;
        *self.wallet.write() = None;
        tracing::info!("wallet removed");
        Ok(())
    }

    fn require_wallet(&self) -> ApiResult<Wallet> {
        if let Some(wallet) = self.current_wallet() {
            return Ok(wallet);
        }
        self.load_wallet()?.ok_or(ApiError::NoWallet)
    }

    // -- Settings ------------------------------------------------------------

    pub fn network(&self) -> ApiResult<Network> {
        Ok(self.vault.load::<Network>(SETTING_NETWORK)?.unwrap_or_default())
    }

    pub fn set_network(&self, network: Network) -> ApiResult<()> {
        self.vault.store(SETTING_NETWORK, &network)?;
        tracing::info!(%network, "network selected");
        Ok(())
    }

    pub fn gas_denom(&self) -> ApiResult<Denom> {
        Ok(self.vault.load::<Denom>(SETTING_PAY_GAS)?.unwrap_or_default())
    }

    pub fn set_gas_denom(&self, denom: Denom) -> ApiResult<()> {
        self.vault.store(SETTING_PAY_GAS, &denom)?;
        Ok(())
    }

    pub fn settings(&self) -> ApiResult<Settings> {
        Ok(Settings {
            network: self.network()?,
            gas_denom: self.gas_denom()?,
        })
    }

    /// Writes the current (or default) settings back so both keys exist.
    pub fn init_settings(&self) -> ApiResult<Settings> {
        let settings = self.settings()?;
        self.set_network(settings.network)?;
        self.set_gas_denom(settings.gas_denom)?;
        Ok(settings)
    }

    // -- Market & balances ---------------------------------------------------

    /// Last known price of the staking token in the stable denomination.
    pub fn staking_rate(&self) -> f64 {
        *self.staking_rate.read()
    }

    /// Fetches the staking rate and caches it.
    pub async fn refresh_staking_rate(&self) -> ApiResult<f64> {
        let rate = self.rpc.luna_rate().await?;
        let rate = convert::parse_decimal("rate", &rate.amount)?;
        *self.staking_rate.write() = rate;
        Ok(rate)
    }

    /// Supported coins of the wallet, valued at a freshly fetched rate.
    pub async fn get_balance(&self) -> ApiResult<Vec<CoinSnapshot>> {
        let wallet = self.require_wallet()?;
        let network = self.network()?;
        let rate = self.refresh_staking_rate().await?;
        let raw = self.rpc.balance(&wallet.address, network).await?;
        convert::coins_from_balance(&raw, rate)
    }

    /// Deposit held in the earn protocol, in stable units.
    pub async fn earn_balance(&self) -> ApiResult<f64> {
        let wallet = self.require_wallet()?;
        let network = self.network()?;
        let body = AccountBody {
            mnemonic: &wallet.mnemonic,
            network: network.id(),
        };
        let earn = self.rpc.earn_balance(&body).await?;
        convert::parse_decimal("total_deposit_balance_in_ust", &earn.total_deposit_balance_in_ust)
    }

    /// Current earn APY as reported by the market.
    pub async fn earn_market(&self) -> ApiResult<f64> {
        let wallet = self.require_wallet()?;
        let network = self.network()?;
        let body = AccountBody {
            mnemonic: &wallet.mnemonic,
            network: network.id(),
        };
        Ok(self.rpc.earn_market(&body).await?.apy)
    }

    /// Balance, earn balance and market fetched concurrently. Any failure
    /// fails the whole overview.
    pub async fn overview(&self) -> ApiResult<WalletOverview> {
        let (coins, earn_deposit, earn_apy) =
            tokio::try_join!(self.get_balance(), self.earn_balance(), self.earn_market())?;

        let total_fiat = coins.iter().map(|c| c.fiat_amount).sum::<f64>() + earn_deposit;
        Ok(WalletOverview {
            coins,
            earn_deposit,
            earn_apy,
            total_fiat,
            gas_denom: self.gas_denom()?,
            staking_rate: self.staking_rate(),
        })
    }

    // -- Earn ----------------------------------------------------------------

    pub async fn anchor_deposit(&self, amount: &str) -> ApiResult<Value> {
        convert::validate_amount(amount)?;
        let wallet = self.require_wallet()?;
        let network = self.network()?;
        let body = AnchorBody {
            token: Denom::Stable.id(),
            amount,
            mnemonic: &wallet.mnemonic,
            network: network.id(),
        };
        let result = self.rpc.anchor_deposit(&body).await?;
        tracing::info!(amount, "earn deposit submitted");
        Ok(result)
    }

    pub async fn anchor_withdraw(&self, amount: &str) -> ApiResult<Value> {
        convert::validate_amount(amount)?;
        let wallet = self.require_wallet()?;
        let network = self.network()?;
        let body = AnchorBody {
            token: Denom::Stable.id(),
            amount,
            mnemonic: &wallet.mnemonic,
            network: network.id(),
        };
        let result = self.rpc.anchor_withdraw(&body).await?;
        tracing::info!(amount, "earn withdrawal submitted");
        Ok(result)
    }

    // -- Swap ----------------------------------------------------------------

    pub async fn swap_preview(&self, request: SwapRequest) -> ApiResult<SwapPreview> {
        convert::validate_amount(&request.amount)?;
        if request.from == request.to {
            return Err(ApiError::Validation(format!(
                "cannot swap {} into itself",
                request.from
            )));
        }
        let wallet = self.require_wallet()?;
        let Settings { network, gas_denom } = self.settings()?;

        self.refresh_staking_rate().await?;
        let body = SwapBody {
            fee_token: gas_denom.id(),
            src: request.from.id(),
            dst: request.to.id(),
            amount: &request.amount,
            address: Some(&wallet.address),
            mnemonic: &wallet.mnemonic,
            network: network.id(),
        };
        let raw = self.rpc.swap_preview(&body).await?;
        let fee = convert::extract_fee(&raw)?;
        tracing::debug!(from = %request.from, to = %request.to, fee, "swap priced");

        Ok(SwapPreview {
            request,
            gas: gas_denom,
            network,
            fee,
        })
    }

    /// Submits a previewed swap. Returns the backend's raw response body.
    pub async fn swap_commit(&self, preview: &SwapPreview) -> ApiResult<String> {
        let wallet = self.require_wallet()?;
        self.refresh_staking_rate().await?;
        let body = SwapBody {
            fee_token: preview.gas.id(),
            src: preview.request.from.id(),
            dst: preview.request.to.id(),
            amount: &preview.request.amount,
            address: None,
            mnemonic: &wallet.mnemonic,
            network: preview.network.id(),
        };
        let result = self.rpc.swap_commit(&body).await?;
        tracing::info!(from = %preview.request.from, to = %preview.request.to, "swap submitted");
        Ok(result)
    }

    // -- Send ----------------------------------------------------------------

    pub async fn send_preview(&self, request: SendRequest) -> ApiResult<SendPreview> {
        convert::validate_amount(&request.amount)?;
        convert::validate_address_format(&request.recipient)?;
        let wallet = self.require_wallet()?;
        let Settings { network, gas_denom } = self.settings()?;

        self.refresh_staking_rate().await?;
        let body = SendBody {
            fee_token: gas_denom.id(),
            token: request.token.id(),
            amount: &request.amount,
            dst_addr: &request.recipient,
            mnemonic: &wallet.mnemonic,
            network: network.id(),
            memo: None,
        };
        let raw = self.rpc.send_preview(&body).await?;
        let fee = convert::extract_fee(&raw)?;
        tracing::debug!(token = %request.token, fee, "transfer priced");

        Ok(SendPreview {
            request,
            gas: gas_denom,
            network,
            fee,
        })
    }

    /// Submits a previewed transfer, with its memo if any.
    pub async fn send_commit(&self, preview: &SendPreview) -> ApiResult<String> {
        let wallet = self.require_wallet()?;
        self.refresh_staking_rate().await?;
        let body = SendBody {
            fee_token: preview.gas.id(),
            token: preview.request.token.id(),
            amount: &preview.request.amount,
            dst_addr: &preview.request.recipient,
            mnemonic: &wallet.mnemonic,
            network: preview.network.id(),
            memo: preview.request.memo.as_deref(),
        };
        let result = self.rpc.send_commit(&body).await?;
        tracing::info!(token = %preview.request.token, "transfer submitted");
        Ok(result)
    }

    /// Asks the backend whether `address` is valid. Strings that cannot be
    /// placed in a URL path are invalid without a call.
    pub async fn validate_address(&self, address: &str) -> ApiResult<bool> {
        if !convert::is_path_safe_address(address) {
            return Ok(false);
        }
        Ok(self.rpc.validate_address(address).await?.valid)
    }
}
