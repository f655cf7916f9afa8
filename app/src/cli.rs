//! # CLI Interface
//!
//! Command-line structure for the `terraplanet` binary. Every flag has a
//! `TERRAPLANET_*` environment fallback.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use terraplanet_core::Network;

/// Terraplanet wallet client.
///
/// Boots the bundled wallet backend, keeps it alive and talks to it over an
/// authenticated loopback connection.
#[derive(Parser, Debug)]
#[command(
    name = "terraplanet",
    about = "Terraplanet wallet client",
    version,
    propagate_version = true
)]
pub struct TerraplanetCli {
    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "TERRAPLANET_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the backend, wait until it is ready and keep it alive.
    Run(RunArgs),
    /// Send one authenticated status probe to a running backend.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// App-private data directory: vault and extracted backend live here.
    #[arg(long, short = 'd', env = "TERRAPLANET_DATA_DIR", default_value = ".terraplanet")]
    pub data_dir: PathBuf,

    /// Bundled backend payload, copied into the data directory on every start.
    #[arg(long, env = "TERRAPLANET_PAYLOAD_DIR", default_value = "nodejs-project")]
    pub payload_dir: PathBuf,

    /// Interpreter that runs the backend entry script.
    #[arg(long, env = "TERRAPLANET_NODE_BINARY", default_value = "node")]
    pub node_binary: PathBuf,

    /// Base URL of the backend.
    #[arg(long, env = "TERRAPLANET_BACKEND_URL", default_value = "http://127.0.0.1:4938")]
    pub backend_url: String,

    /// Switch network before booting (`test` or `main`). Persisted.
    #[arg(long, env = "TERRAPLANET_NETWORK")]
    pub network: Option<Network>,

    /// Hand the credential to the backend through the environment instead
    /// of launch arguments.
    #[arg(long, env = "TERRAPLANET_CREDENTIAL_ENV")]
    pub credential_env: bool,

    /// Seconds between two health checks once the backend is ready.
    #[arg(long, env = "TERRAPLANET_CHECK_INTERVAL", default_value_t = 30)]
    pub check_interval: u64,

    /// Dump Prometheus metrics to stdout on exit.
    #[arg(long)]
    pub print_metrics: bool,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Base URL of the backend.
    #[arg(long, env = "TERRAPLANET_BACKEND_URL", default_value = "http://127.0.0.1:4938")]
    pub backend_url: String,

    /// Install credential username. Read from the vault when omitted.
    #[arg(long, env = "TERRAPLANET_USERNAME", requires = "password")]
    pub username: Option<String>,

    /// Install credential password. Read from the vault when omitted.
    #[arg(long, env = "TERRAPLANET_PASSWORD", requires = "username", hide_env_values = true)]
    pub password: Option<String>,

    /// Data directory holding the vault.
    #[arg(long, short = 'd', env = "TERRAPLANET_DATA_DIR", default_value = ".terraplanet")]
    pub data_dir: PathBuf,
}
