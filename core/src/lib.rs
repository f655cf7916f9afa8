// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Terraplanet — Client Core
//!
//! The wallet's blockchain logic lives in a bundled local backend. This crate
//! boots that backend, keeps it alive, authenticates every call to it, and
//! turns its raw JSON into wallet operations.
//!
//! ## Architecture
//!
//! Leaves first, each layer only talks to the ones above it:
//!
//! - **vault** — Encrypted secrets and plain settings on sled. Holds the
//!   install credential and the wallet mnemonic.
//! - **gateway** — reqwest client with a Basic-Auth default header and the
//!   fixed endpoint catalogue.
//! - **boot** — Supervisor (one OS thread per launch attempt), readiness
//!   poller, and the restart loop that ties them together.
//! - **api** — `WalletApi`: balances, earn, swap/send previews and commits,
//!   wallet creation and restore.
//! - **config** — Constants and the `Default`-implementing config structs.
//! - **metrics** — Prometheus counters for boot and RPC health.
//!
//! Construct each component once and pass references down; nothing in here
//! is a process-wide global.

pub mod api;
pub mod boot;
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod types;
pub mod vault;

pub use types::{Denom, Network, Wallet};
