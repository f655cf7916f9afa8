// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Terraplanet
//!
//! Entry point for the `terraplanet` binary: the application shell that
//! constructs each core component exactly once and wires them together.
//!
//! - `run`     — boot the backend, wait for Ready, keep it healthy
//! - `status`  — one authenticated status probe
//! - `version` — print build version information

mod cli;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;

use terraplanet_core::api::WalletApi;
use terraplanet_core::boot::{BootSequence, LaunchRequest, NodeLauncher, Supervisor};
use terraplanet_core::config::{
    BackendConfig, BootConfig, CredentialTransport, GatewayConfig, SECRET_INSTALL_CREDENTIAL,
};
use terraplanet_core::gateway::{Gateway, StatusProbe};
use terraplanet_core::metrics::ClientMetrics;
use terraplanet_core::vault::{InstallCredential, Vault};

use cli::{Commands, TerraplanetCli};
use logging::LogFormat;

/// Name of the sled database inside the data directory.
const VAULT_DIR: &str = "vault";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TerraplanetCli::parse();
    let format = LogFormat::from_str_lossy(&cli.log_format);

    match cli.command {
        Commands::Run(args) => {
            logging::init_logging(logging::DEFAULT_FILTER, format);
            run(args).await
        }
        Commands::Status(args) => {
            logging::init_logging("warn", format);
            query_status(args).await
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Boots the backend and keeps it alive until Ctrl+C / SIGTERM.
async fn run(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        data_dir = %args.data_dir.display(),
        payload = %args.payload_dir.display(),
        backend = %args.backend_url,
        "starting terraplanet"
    );

    // --- Vault & credential ---
    std::fs::create_dir_all(&args.data_dir).with_context(|| {
        format!("failed to create data directory: {}", args.data_dir.display())
    })?;
    let vault_path = args.data_dir.join(VAULT_DIR);
    let vault = Arc::new(
        Vault::open(&vault_path)
            .with_context(|| format!("failed to open vault at {}", vault_path.display()))?,
    );
    let credential =
        InstallCredential::load_or_create(&vault).context("failed to load install credential")?;

    // --- Gateway & facade ---
    let metrics = ClientMetrics::new();
    let gateway_config = GatewayConfig {
        base_url: args.backend_url.clone(),
        ..GatewayConfig::default()
    };
    let gateway = Arc::new(
        Gateway::new(&gateway_config, &credential)
            .context("failed to build backend client")?
            .with_metrics(metrics.clone()),
    );
    let api = WalletApi::new(Arc::clone(&gateway), Arc::clone(&vault));
    if let Some(network) = args.network {
        api.set_network(network).context("failed to store network")?;
    }
    let settings = api.init_settings().context("failed to initialize settings")?;
    tracing::info!(network = %settings.network, gas = %settings.gas_denom, "settings loaded");

    // --- Supervisor & boot loop ---
    let mut backend = BackendConfig::new(&args.payload_dir, &args.data_dir);
    backend.program = args.node_binary.clone();
    if args.credential_env {
        backend.credential_transport = CredentialTransport::Environment;
    }
    let supervisor = Supervisor::new(NodeLauncher::new(backend)).with_metrics(metrics.clone());
    let sequence = BootSequence::new(
        supervisor,
        gateway.clone(),
        LaunchRequest {
            credential,
            network: settings.network,
        },
        BootConfig::default(),
    )
    .with_metrics(metrics.clone());

    let handle = sequence.start();
    tokio::select! {
        ready = handle.wait_ready() => {
            if !ready {
                bail!("boot was cancelled before the backend became ready");
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown requested during boot");
            tokio::task::block_in_place(|| sequence.shutdown());
            return Ok(());
        }
    }

    // --- Wallet summary ---
    match api.load_wallet() {
        Ok(Some(wallet)) => {
            tracing::info!(address = %wallet.address, "wallet loaded");
            match api.overview().await {
                Ok(overview) => tracing::info!(
                    total = %overview.total_display(),
                    coins = overview.coins.len(),
                    earn = overview.earn_deposit,
                    apy = overview.earn_apy,
                    "wallet overview"
                ),
                Err(e) => tracing::warn!(error = %e, kind = ?e.kind(), "overview unavailable"),
            }
        }
        Ok(None) => tracing::info!("no wallet stored yet"),
        Err(e) => tracing::warn!(error = %e, kind = ?e.kind(), "stored wallet unreadable"),
    }

    // --- Health checks until shutdown ---
    let mut checks = tokio::time::interval(Duration::from_secs(args.check_interval.max(1)));
    checks.tick().await;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = checks.tick() => {
                if !sequence.check().await {
                    tracing::warn!(state = %sequence.state(), "health check failed");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tokio::task::block_in_place(|| sequence.shutdown());
    if args.print_metrics {
        print!("{}", metrics.encode());
    }
    tracing::info!("terraplanet stopped");
    Ok(())
}

/// Probes a running backend once and prints its status.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let credential = match (args.username, args.password) {
        (Some(username), Some(password)) => InstallCredential { username, password },
        _ => {
            let vault_path = args.data_dir.join(VAULT_DIR);
            let vault = Vault::open(&vault_path).with_context(|| {
                format!(
                    "failed to open vault at {} (is `terraplanet run` holding it?)",
                    vault_path.display()
                )
            })?;
            vault
                .load_secret_json::<InstallCredential>(SECRET_INSTALL_CREDENTIAL)
                .context("failed to read install credential")?
                .context("no install credential stored; run `terraplanet run` first")?
        }
    };

    let config = GatewayConfig {
        base_url: args.backend_url,
        ..GatewayConfig::default()
    };
    let gateway = Gateway::new(&config, &credential).context("failed to build backend client")?;
    let status = gateway
        .status()
        .await
        .with_context(|| format!("backend at {} did not answer", gateway.base_url()))?;

    println!("{}", status.status);
    if !status.is_healthy() {
        bail!("backend is not healthy");
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("{}", version_text());
}

/// Binary version plus the backend address it talks to by default.
fn version_text() -> String {
    format!(
        "terraplanet {}\nbackend     {}",
        env!("CARGO_PKG_VERSION"),
        GatewayConfig::default().base_url
    )
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
