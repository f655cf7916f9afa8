//! Unit conversion, response unpacking and input validation.

use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::models::CoinSnapshot;
use crate::config::MICRO_PER_UNIT;
use crate::gateway::types::{CoinEntry, RawBalance};
use crate::types::Denom;

/// Parses a decimal string reported by the backend.
pub fn parse_decimal(field: &str, raw: &str) -> ApiResult<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::MalformedResponse(format!("{}: '{}' is not a number", field, raw)))
}

/// Micro-units to display units.
pub fn micro_to_display(field: &str, micro: &str) -> ApiResult<f64> {
    Ok(parse_decimal(field, micro)? / MICRO_PER_UNIT)
}

/// Builds coin snapshots from a balance response, keeping only supported
/// denominations. Staking coins are valued at `staking_rate`.
pub fn coins_from_balance(raw: &RawBalance, staking_rate: f64) -> ApiResult<Vec<CoinSnapshot>> {
    let entries: Vec<CoinEntry> = match raw.native.first() {
        None => Vec::new(),
        Some(Value::String(encoded)) => serde_json::from_str(encoded)
            .map_err(|e| ApiError::MalformedResponse(format!("native coin list: {}", e)))?,
        Some(inline @ Value::Array(_)) => serde_json::from_value(inline.clone())
            .map_err(|e| ApiError::MalformedResponse(format!("native coin list: {}", e)))?,
        Some(other) => {
            return Err(ApiError::MalformedResponse(format!(
                "native coin list has unexpected shape: {}",
                other
            )))
        }
    };

    let mut coins = Vec::new();
    for entry in entries {
        let Some(denom) = Denom::from_id(&entry.denom) else {
            tracing::trace!(denom = %entry.denom, "skipping unsupported denomination");
            continue;
        };
        let quantity = micro_to_display("amount", &entry.amount)?;
        let fiat_amount = match denom {
            Denom::Staking => quantity * staking_rate,
            Denom::Stable => quantity,
        };
        coins.push(CoinSnapshot {
            denom,
            quantity,
            fiat_amount,
        });
    }
    Ok(coins)
}

/// Reads `auth_info.fee.amount[0].amount` from a preview body and scales it
/// to display units. `fee` may be a JSON-encoded string or an object.
pub fn extract_fee(body: &str) -> ApiResult<f64> {
    let malformed = |what: &str| ApiError::MalformedResponse(format!("preview fee: {}", what));

    let json: Value = serde_json::from_str(body).map_err(|e| malformed(&e.to_string()))?;
    let fee = json
        .get("auth_info")
        .and_then(|a| a.get("fee"))
        .ok_or_else(|| malformed("missing auth_info.fee"))?;

    let fee: Value = match fee {
        Value::String(encoded) => {
            serde_json::from_str(encoded).map_err(|e| malformed(&e.to_string()))?
        }
        other => other.clone(),
    };

    let amount = fee
        .get("amount")
        .and_then(|a| a.get(0))
        .and_then(|c| c.get("amount"))
        .ok_or_else(|| malformed("missing amount[0].amount"))?;

    match amount {
        Value::String(s) => micro_to_display("fee", s),
        Value::Number(n) => micro_to_display("fee", &n.to_string()),
        _ => Err(malformed("amount is neither string nor number")),
    }
}

/// Accepts `^[0-9]*(\.[0-9]+)?$`, non-empty.
pub fn validate_amount(amount: &str) -> ApiResult<()> {
    let invalid = || ApiError::Validation(format!("'{}' is not a valid amount", amount));
    if amount.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (amount, None),
    };
    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
    }
    Ok(())
}

/// True for strings that can be interpolated into a URL path segment:
/// non-empty ASCII alphanumerics.
pub fn is_path_safe_address(address: &str) -> bool {
    !address.is_empty() && address.bytes().all(|b| b.is_ascii_alphanumeric())
}

pub fn validate_address_format(address: &str) -> ApiResult<()> {
    if is_path_safe_address(address) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "'{}' is not a well-formed address",
            address
        )))
    }
}
