//! Wire-level request and response bodies.
//!
//! Field names follow the backend's JSON exactly; domain-facing types live
//! in [`crate::api::models`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::STATUS_OK;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `GET /server/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
}

impl ServerStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// `POST /wallet/restore`. The backend echoes only the derived address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoredAddress {
    pub acc_address: String,
}

/// `GET /wallet/balance/{address}/{network}`.
///
/// `native[0]` carries the coin list, either as a JSON-encoded string or as
/// an inline array depending on the backend build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBalance {
    #[serde(default)]
    pub native: Vec<Value>,
}

/// One entry of the balance coin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinEntry {
    pub denom: String,
    /// Micro-unit amount. Usually a decimal string; numbers are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

/// `GET /market/rate/uluna/uusd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub token: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
}

/// `POST /anchor/balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnBalance {
    #[serde(deserialize_with = "string_or_number")]
    pub total_deposit_balance_in_ust: String,
}

/// `POST /anchor/market`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnMarket {
    #[serde(rename = "APY")]
    pub apy: f64,
}

/// `GET /wallet/validate/{address}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressValidity {
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RestoreBody<'a> {
    pub mnemonic: &'a str,
}

/// Body of the earn balance / earn market calls.
#[derive(Debug, Clone, Serialize)]
pub struct AccountBody<'a> {
    pub mnemonic: &'a str,
    pub network: &'a str,
}

/// Body of anchor deposit / withdraw.
#[derive(Debug, Clone, Serialize)]
pub struct AnchorBody<'a> {
    pub token: &'a str,
    pub amount: &'a str,
    pub mnemonic: &'a str,
    pub network: &'a str,
}

/// Body of swap preview (with `address`) and swap commit (without).
#[derive(Debug, Clone, Serialize)]
pub struct SwapBody<'a> {
    pub fee_token: &'a str,
    pub src: &'a str,
    pub dst: &'a str,
    pub amount: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<&'a str>,
    pub mnemonic: &'a str,
    pub network: &'a str,
}

/// Body of send preview (without `memo`) and send commit.
#[derive(Debug, Clone, Serialize)]
pub struct SendBody<'a> {
    pub fee_token: &'a str,
    pub token: &'a str,
    pub amount: &'a str,
    pub dst_addr: &'a str,
    pub mnemonic: &'a str,
    pub network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<&'a str>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
