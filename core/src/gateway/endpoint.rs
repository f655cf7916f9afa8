//! # Endpoint Catalogue
//!
//! The backend exposes a fixed REST surface. Each variant maps to exactly
//! one method + path; the gateway builds URLs only through this enum.
//!
//! | Endpoint          | Method | Path                                |
//! |-------------------|--------|-------------------------------------|
//! | `Status`          | GET    | `/server/status`                    |
//! | `CreateWallet`    | GET    | `/wallet/create/{network}`          |
//! | `RestoreWallet`   | POST   | `/wallet/restore`                   |
//! | `Balance`         | GET    | `/wallet/balance/{address}/{network}` |
//! | `LunaRate`        | GET    | `/market/rate/uluna/uusd`           |
//! | `EarnBalance`     | POST   | `/anchor/balance`                   |
//! | `EarnMarket`      | POST   | `/anchor/market`                    |
//! | `AnchorDeposit`   | POST   | `/anchor/deposit`                   |
//! | `AnchorWithdraw`  | POST   | `/anchor/withdraw`                  |
//! | `SwapPreview`     | POST   | `/wallet/swap/preview`              |
//! | `SwapCommit`      | POST   | `/wallet/swap`                      |
//! | `SendPreview`     | POST   | `/wallet/send/preview`              |
//! | `SendCommit`      | POST   | `/wallet/send`                      |
//! | `ValidateAddress` | GET    | `/wallet/validate/{address}`        |

use reqwest::Method;

use crate::types::Network;

/// One call in the backend catalogue, with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    Status,
    CreateWallet { network: Network },
    RestoreWallet,
    Balance { address: &'a str, network: Network },
    LunaRate,
    EarnBalance,
    EarnMarket,
    AnchorDeposit,
    AnchorWithdraw,
    SwapPreview,
    SwapCommit,
    SendPreview,
    SendCommit,
    ValidateAddress { address: &'a str },
}

impl Endpoint<'_> {
    /// Stable name for logs and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Status => "status",
            Endpoint::CreateWallet { .. } => "create_wallet",
            Endpoint::RestoreWallet => "restore_wallet",
            Endpoint::Balance { .. } => "balance",
            Endpoint::LunaRate => "luna_rate",
            Endpoint::EarnBalance => "earn_balance",
            Endpoint::EarnMarket => "earn_market",
            Endpoint::AnchorDeposit => "anchor_deposit",
            Endpoint::AnchorWithdraw => "anchor_withdraw",
            Endpoint::SwapPreview => "swap_preview",
            Endpoint::SwapCommit => "swap_commit",
            Endpoint::SendPreview => "send_preview",
            Endpoint::SendCommit => "send_commit",
            Endpoint::ValidateAddress { .. } => "validate_address",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Endpoint::Status
            | Endpoint::CreateWallet { .. }
            | Endpoint::Balance { .. }
            | Endpoint::LunaRate
            | Endpoint::ValidateAddress { .. } => Method::GET,
            _ => Method::POST,
        }
    }

    /// Absolute path, starting with `/`.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Status => "/server/status".to_string(),
            Endpoint::CreateWallet { network } => format!("/wallet/create/{}", network.id()),
            Endpoint::RestoreWallet => "/wallet/restore".to_string(),
            Endpoint::Balance { address, network } => {
                format!("/wallet/balance/{}/{}", address, network.id())
            }
            Endpoint::LunaRate => "/market/rate/uluna/uusd".to_string(),
            Endpoint::EarnBalance => "/anchor/balance".to_string(),
            Endpoint::EarnMarket => "/anchor/market".to_string(),
            Endpoint::AnchorDeposit => "/anchor/deposit".to_string(),
            Endpoint::AnchorWithdraw => "/anchor/withdraw".to_string(),
            Endpoint::SwapPreview => "/wallet/swap/preview".to_string(),
            Endpoint::SwapCommit => "/wallet/swap".to_string(),
            Endpoint::SendPreview => "/wallet/send/preview".to_string(),
            Endpoint::SendCommit => "/wallet/send".to_string(),
            Endpoint::ValidateAddress { address } => format!("/wallet/validate/{}", address),
        }
    }
}
