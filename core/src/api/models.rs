//! Domain-facing results of the facade.

use crate::types::{Denom, Network};

/// One supported coin of the wallet, derived on every balance fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinSnapshot {
    pub denom: Denom,
    /// Display units (micro / 1e6).
    pub quantity: f64,
    /// Value in the stable denomination.
    pub fiat_amount: f64,
}

/// Persisted user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub network: Network,
    pub gas_denom: Denom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub from: Denom,
    pub to: Denom,
    /// Display units, validated before dispatch.
    pub amount: String,
}

/// A priced swap. Committing it reuses exactly these parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPreview {
    pub request: SwapRequest,
    pub gas: Denom,
    pub network: Network,
    /// Estimated fee in display units of `gas`.
    pub fee: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub token: Denom,
    pub amount: String,
    pub recipient: String,
    pub memo: Option<String>,
}

/// A priced transfer. Committing it reuses exactly these parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SendPreview {
    pub request: SendRequest,
    pub gas: Denom,
    pub network: Network,
    pub fee: f64,
}

/// Aggregated wallet view: balances, earn position and market data.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletOverview {
    pub coins: Vec<CoinSnapshot>,
    pub earn_deposit: f64,
    pub earn_apy: f64,
    /// Sum of coin fiat amounts plus the earn deposit.
    pub total_fiat: f64,
    pub gas_denom: Denom,
    pub staking_rate: f64,
}

impl WalletOverview {
    /// `total_fiat` with two decimals.
    pub fn total_display(&self) -> String {
        format!("{:.2}", self.total_fiat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_display_rounds_to_cents() {
        let overview = WalletOverview {
            coins: Vec::new(),
            earn_deposit: 0.0,
            earn_apy: 0.0,
            total_fiat: 15.004,
            gas_denom: Denom::Stable,
            staking_rate: 1.0,
        };
        assert_eq!(overview.total_display(), "15.00");

        let zero = WalletOverview {
            total_fiat: 0.0,
            ..overview
        };
        assert_eq!(zero.total_display(), "0.00");
    }

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.network, Network::Test);
        assert_eq!(settings.gas_denom, Denom::Stable);
    }
}
