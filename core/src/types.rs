//! Domain vocabulary shared by the gateway and the facade.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chain the backend talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Test,
    Main,
}

impl Network {
    /// Identifier used on the wire and in settings.
    pub fn id(self) -> &'static str {
        match self {
            Network::Test => "test",
            Network::Main => "main",
        }
    }

    /// Human label.
    pub fn label(self) -> &'static str {
        match self {
            Network::Test => "testnet",
            Network::Main => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Network {
    type Err = String;

    /// Accepts either the id (`test`) or the label (`testnet`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "test" | "testnet" => Ok(Network::Test),
            "main" | "mainnet" => Ok(Network::Main),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Supported on-chain denominations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Denom {
    /// USD-pegged stable coin. Its fiat value equals its quantity.
    #[default]
    #[serde(rename = "uusd")]
    Stable,
    /// Staking token, valued at the current market rate.
    #[serde(rename = "uluna")]
    Staking,
}

impl Denom {
    /// Every denomination the client displays, in display order.
    pub const SUPPORTED: [Denom; 2] = [Denom::Stable, Denom::Staking];

    /// Micro-unit identifier used on chain.
    pub fn id(self) -> &'static str {
        match self {
            Denom::Stable => "uusd",
            Denom::Staking => "uluna",
        }
    }

    /// Ticker shown to users.
    pub fn label(self) -> &'static str {
        match self {
            Denom::Stable => "UST",
            Denom::Staking => "LUNA",
        }
    }

    /// Looks up a denomination by its on-chain id. Unsupported ids yield
    /// `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::SUPPORTED.into_iter().find(|d| d.id() == id)
    }
}

impl fmt::Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Denom {
    type Err = String;

    /// Accepts either the id (`uusd`) or the ticker (`UST`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::SUPPORTED
            .into_iter()
            .find(|d| d.id() == s || d.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unsupported denomination '{}'", s))
    }
}

/// A wallet created or restored through the backend.
///
/// Serialized with the backend's field names so the same JSON works on the
/// wire and in the vault.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(rename = "acc_address")]
    pub address: String,
    pub mnemonic: String,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("mnemonic", &"<redacted>")
            .finish()
    }
}
