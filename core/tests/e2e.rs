//! End-to-end tests against an in-process fake backend.
//!
//! Each test binds its own axum server on an ephemeral loopback port and
//! drives the real `Gateway` (reqwest, Basic-Auth default header) through
//! `WalletApi` and `BootSequence`. The fake checks the Authorization header
//! on every route and records which endpoints were hit and with what body.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use serde_json::{json, Value};

use terraplanet_core::api::{ErrorKind, SendRequest, SwapRequest, WalletApi};
use terraplanet_core::boot::{
    BackendLauncher, BackendProcess, BootSequence, LaunchRequest, ServiceState, Supervisor,
    SupervisorError,
};
use terraplanet_core::config::{BootConfig, GatewayConfig, PollerConfig, SECRET_WALLET};
use terraplanet_core::gateway::{Gateway, StatusProbe};
use terraplanet_core::metrics::ClientMetrics;
use terraplanet_core::vault::{InstallCredential, Vault};
use terraplanet_core::{Denom, Network, Wallet};

// ---------------------------------------------------------------------------
// Fake Backend
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeBackend {
    expected_auth: String,
    rate_fails: AtomicBool,
    /// Status answers "starting" this many times before "ok".
    warmup: AtomicUsize,
    hits: Mutex<HashMap<&'static str, usize>>,
    bodies: Mutex<HashMap<&'static str, Value>>,
    seen_auth: Mutex<Option<String>>,
}

type Shared = Arc<FakeBackend>;
type Reply = Result<Json<Value>, StatusCode>;

impl FakeBackend {
    fn hit(&self, name: &'static str, headers: &HeaderMap) -> Result<(), StatusCode> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.seen_auth.lock() = auth.clone();
        if auth.as_deref() != Some(self.expected_auth.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        *self.hits.lock().entry(name).or_insert(0) += 1;
        Ok(())
    }

    fn hits(&self, name: &str) -> usize {
        self.hits.lock().get(name).copied().unwrap_or(0)
    }

    fn total_hits(&self) -> usize {
        self.hits.lock().values().sum()
    }

    fn body(&self, name: &str) -> Value {
        self.bodies.lock().get(name).cloned().unwrap_or(Value::Null)
    }
}

const MNEMONIC: &str = "wheel flock tired elbow exhibit";
const PREVIEW_BODY: &str = r#"{"auth_info":{"fee":"{\"amount\":[{\"denom\":\"uusd\",\"amount\":\"1234\"}],\"gas_limit\":\"150000\"}"}}"#;

async fn status(State(b): State<Shared>, headers: HeaderMap) -> Reply {
    b.hit("status", &headers)?;
    let warming = b
        .warmup
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    let status = if warming { "starting" } else { "ok" };
    Ok(Json(json!({ "status": status })))
}

async fn create(
    State(b): State<Shared>,
    headers: HeaderMap,
    Path(network): Path<String>,
) -> Reply {
    b.hit("create_wallet", &headers)?;
    Ok(Json(json!({
        "acc_address": format!("terra1{}wallet", network),
        "mnemonic": MNEMONIC,
    })))
}

async fn restore(State(b): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    b.hit("restore_wallet", &headers)?;
    b.bodies.lock().insert("restore_wallet", body);
    Ok(Json(json!({ "acc_address": "terra1restored" })))
}

async fn balance(
    State(b): State<Shared>,
    headers: HeaderMap,
    Path((_address, _network)): Path<(String, String)>,
) -> Reply {
    b.hit("balance", &headers)?;
    let coins = json!([
        { "denom": "uusd", "amount": "2500000" },
        { "denom": "uluna", "amount": "2500000" },
        { "denom": "ukrw", "amount": "999" },
    ]);
    Ok(Json(json!({ "native": [coins.to_string()] })))
}

async fn rate(State(b): State<Shared>, headers: HeaderMap) -> Reply {
    b.hit("luna_rate", &headers)?;
    if b.rate_fails.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({ "token": "uusd", "amount": "5.0" })))
}

async fn earn_balance(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.hit("earn_balance", &headers)?;
    b.bodies.lock().insert("earn_balance", body);
    Ok(Json(json!({ "total_deposit_balance_in_ust": "10.25" })))
}

async fn earn_market(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Reply {
    b.hit("earn_market", &headers)?;
    Ok(Json(json!({ "APY": 0.1834 })))
}

async fn anchor_deposit(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.hit("anchor_deposit", &headers)?;
    b.bodies.lock().insert("anchor_deposit", body);
    Ok(Json(json!({ "txhash": "ABC" })))
}

async fn swap_preview(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<String, StatusCode> {
    b.hit("swap_preview", &headers)?;
    b.bodies.lock().insert("swap_preview", body);
    Ok(PREVIEW_BODY.to_string())
}

async fn swap_commit(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<String, StatusCode> {
    b.hit("swap_commit", &headers)?;
    b.bodies.lock().insert("swap_commit", body);
    Ok(r#"{"txhash":"SWAP"}"#.to_string())
}

async fn send_preview(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<String, StatusCode> {
    b.hit("send_preview", &headers)?;
    b.bodies.lock().insert("send_preview", body);
    Ok(PREVIEW_BODY.to_string())
}

async fn send_commit(
    State(b): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<String, StatusCode> {
    b.hit("send_commit", &headers)?;
    b.bodies.lock().insert("send_commit", body);
    Ok(r#"{"txhash":"SEND"}"#.to_string())
}

async fn validate(
    State(b): State<Shared>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> Reply {
    b.hit("validate_address", &headers)?;
    Ok(Json(json!({ "valid": address.starts_with("terra1") })))
}

/// Starts the fake backend and returns its base URL.
async fn serve(backend: Shared) -> String {
    let app = Router::new()
        .route("/server/status", get(status))
        .route("/wallet/create/:network", get(create))
        .route("/wallet/restore", post(restore))
        .route("/wallet/balance/:address/:network", get(balance))
        .route("/market/rate/uluna/uusd", get(rate))
        .route("/anchor/balance", post(earn_balance))
        .route("/anchor/market", post(earn_market))
        .route("/anchor/deposit", post(anchor_deposit))
        .route("/wallet/swap/preview", post(swap_preview))
        .route("/wallet/swap", post(swap_commit))
        .route("/wallet/send/preview", post(send_preview))
        .route("/wallet/send", post(send_commit))
        .route("/wallet/validate/:address", get(validate))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend");
    });
    format!("http://{}", addr)
}

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

struct Harness {
    backend: Shared,
    vault: Arc<Vault>,
    gateway: Arc<Gateway>,
    api: WalletApi<Gateway>,
    credential: InstallCredential,
}

async fn setup() -> Harness {
    let vault = Arc::new(Vault::open_temporary().expect("temp vault"));
    let credential = InstallCredential::load_or_create(&vault).expect("credential");
    let backend = Arc::new(FakeBackend {
        expected_auth: credential.authorization_header(),
        ..FakeBackend::default()
    });
    let base_url = serve(Arc::clone(&backend)).await;

    let config = GatewayConfig {
        base_url,
        ..GatewayConfig::default()
    };
    let gateway = Arc::new(Gateway::new(&config, &credential).expect("gateway"));
    let api = WalletApi::new(Arc::clone(&gateway), Arc::clone(&vault));
    Harness {
        backend,
        vault,
        gateway,
        api,
        credential,
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn authorization_header_is_exact() {
    let h = setup().await;
    let status = h.gateway.status().await.unwrap();
    assert!(status.is_healthy());

    let expected = format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", h.credential.username, h.credential.password))
    );
    assert_eq!(h.backend.seen_auth.lock().as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn wrong_credential_is_auth_failure() {
    let h = setup().await;
    let stranger = InstallCredential::generate();
    let config = GatewayConfig {
        base_url: h.gateway.base_url().to_string(),
        ..GatewayConfig::default()
    };
    let gateway = Arc::new(Gateway::new(&config, &stranger).unwrap());

    let err = gateway.status().await.unwrap_err();
    assert!(err.is_auth_failure());

    let api = WalletApi::new(gateway, Arc::clone(&h.vault));
    let err = api.create_wallet().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(h.backend.total_hits(), 0);
}

#[tokio::test]
async fn credential_survives_reload() {
    let h = setup().await;
    let again = InstallCredential::load_or_create(&h.vault).unwrap();
    assert_eq!(again, h.credential);
}

// ---------------------------------------------------------------------------
// Wallet Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_wallet_is_persisted_without_further_calls() {
    let h = setup().await;
    let wallet = h.api.create_wallet().await.unwrap();
    assert_eq!(wallet.address, "terra1testwallet");
    assert_eq!(h.backend.total_hits(), 1);

    let stored = h.vault.load_secret(SECRET_WALLET).unwrap().unwrap();
    let stored: Wallet = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, wallet);

    // A fresh facade over the same vault sees the same pair, still without RPC.
    let fresh = WalletApi::new(Arc::clone(&h.gateway), Arc::clone(&h.vault));
    assert_eq!(fresh.load_wallet().unwrap(), Some(wallet));
    assert_eq!(h.backend.total_hits(), 1);
}

#[tokio::test]
async fn create_follows_network_setting() {
    let h = setup().await;
    h.api.set_network(Network::Main).unwrap();
    let wallet = h.api.create_wallet().await.unwrap();
    assert_eq!(wallet.address, "terra1mainwallet");
}

#[tokio::test]
async fn restore_sends_mnemonic_once() {
    let h = setup().await;
    let wallet = h.api.restore_wallet(MNEMONIC).await.unwrap();
    assert_eq!(wallet.address, "terra1restored");
    assert_eq!(h.backend.body("restore_wallet"), json!({ "mnemonic": MNEMONIC }));

    h.api.restore_wallet(MNEMONIC).await.unwrap();
    assert_eq!(h.backend.hits("restore_wallet"), 1);
}

// ---------------------------------------------------------------------------
// Balances & Overview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn balance_is_converted_and_valued() {
    let h = setup().await;
    h.api.create_wallet().await.unwrap();

    let coins = h.api.get_balance().await.unwrap();
    assert_eq!(coins.len(), 2);

    let stable = coins.iter().find(|c| c.denom == Denom::Stable).unwrap();
    assert_eq!(stable.quantity, 2.5);
    assert_eq!(stable.fiat_amount, 2.5);

    let staking = coins.iter().find(|c| c.denom == Denom::Staking).unwrap();
    assert_eq!(staking.quantity, 2.5);
    assert_eq!(staking.fiat_amount, 12.5);
    assert_eq!(h.api.staking_rate(), 5.0);
}

#[tokio::test]
async fn overview_aggregates_everything() {
    let h = setup().await;
    h.api.create_wallet().await.unwrap();

    let overview = h.api.overview().await.unwrap();
    assert_eq!(overview.earn_deposit, 10.25);
    assert_eq!(overview.earn_apy, 0.1834);
    assert_eq!(overview.total_display(), "25.25");
    assert_eq!(overview.gas_denom, Denom::Stable);
    assert_eq!(
        h.backend.body("earn_balance"),
        json!({ "mnemonic": MNEMONIC, "network": "test" })
    );
}

#[tokio::test]
async fn rate_failure_fails_balance_and_overview() {
    let h = setup().await;
    h.api.create_wallet().await.unwrap();
    h.backend.rate_fails.store(true, Ordering::SeqCst);

    assert!(h.api.get_balance().await.is_err());
    assert_eq!(h.backend.hits("balance"), 0);

    let err = h.api.overview().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

// ---------------------------------------------------------------------------
// Previews & Commits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_preview_fee_and_commit_body() {
    let h = setup().await;
    let wallet = h.api.create_wallet().await.unwrap();

    let preview = h
        .api
        .send_preview(SendRequest {
            token: Denom::Stable,
            amount: "1.5".into(),
            recipient: "terra1friend".into(),
            memo: Some("lunch".into()),
        })
        .await
        .unwrap();
    assert!((preview.fee - 0.001234).abs() < 1e-12);
    assert!(h.backend.body("send_preview").get("memo").is_none());

    h.api.send_commit(&preview).await.unwrap();
    assert_eq!(
        h.backend.body("send_commit"),
        json!({
            "fee_token": "uusd",
            "token": "uusd",
            "amount": "1.5",
            "dst_addr": "terra1friend",
            "mnemonic": wallet.mnemonic,
            "network": "test",
            "memo": "lunch",
        })
    );
    assert_eq!(h.backend.hits("luna_rate"), 2);
}

#[tokio::test]
async fn swap_commit_reuses_preview_parameters() {
    let h = setup().await;
    let wallet = h.api.create_wallet().await.unwrap();
    h.api.set_gas_denom(Denom::Staking).unwrap();

    let preview = h
        .api
        .swap_preview(SwapRequest {
            from: Denom::Staking,
            to: Denom::Stable,
            amount: "3".into(),
        })
        .await
        .unwrap();
    assert!((preview.fee - 0.001234).abs() < 1e-12);
    assert_eq!(h.backend.body("swap_preview")["address"], json!(wallet.address));

    // Settings changed after the preview do not leak into the commit.
    h.api.set_gas_denom(Denom::Stable).unwrap();
    h.api.swap_commit(&preview).await.unwrap();

    let body = h.backend.body("swap_commit");
    assert_eq!(body["fee_token"], "uluna");
    assert_eq!(body["src"], "uluna");
    assert_eq!(body["dst"], "uusd");
    assert_eq!(body["amount"], "3");
    assert!(body.get("address").is_none());
}

#[tokio::test]
async fn anchor_deposit_uses_stable_token() {
    let h = setup().await;
    h.api.create_wallet().await.unwrap();
    h.api.anchor_deposit("100").await.unwrap();
    let body = h.backend.body("anchor_deposit");
    assert_eq!(body["token"], "uusd");
    assert_eq!(body["amount"], "100");
}

#[tokio::test]
async fn validate_address_round_trip() {
    let h = setup().await;
    assert!(h.api.validate_address("terra1abc").await.unwrap());
    assert!(!h.api.validate_address("cosmos1abc").await.unwrap());
    assert_eq!(h.backend.hits("validate_address"), 2);
}

// ---------------------------------------------------------------------------
// Boot Sequence
// ---------------------------------------------------------------------------

/// Launcher that "starts" the in-process fake, failing the first attempt.
struct InProcessLauncher {
    calls: AtomicUsize,
}

struct InProcess {
    alive: bool,
}

impl BackendProcess for InProcess {
    fn is_alive(&mut self) -> bool {
        self.alive
    }

    fn kill(&mut self) -> io::Result<()> {
        self.alive = false;
        Ok(())
    }
}

impl BackendLauncher for InProcessLauncher {
    fn launch(&self, _request: &LaunchRequest) -> Result<Box<dyn BackendProcess>, SupervisorError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(SupervisorError::Launch(io::Error::new(
                io::ErrorKind::NotFound,
                "node missing",
            )));
        }
        Ok(Box::new(InProcess { alive: true }))
    }
}

#[tokio::test]
async fn boot_reaches_ready_through_gateway() {
    let h = setup().await;
    h.backend.warmup.store(3, Ordering::SeqCst);
    let metrics = ClientMetrics::new();

    let supervisor = Supervisor::new(InProcessLauncher {
        calls: AtomicUsize::new(0),
    })
    .with_metrics(metrics.clone());
    let config = BootConfig {
        poller: PollerConfig {
            interval: Duration::from_millis(10),
            max_attempts: None,
        },
        restart_delay: Duration::from_millis(10),
    };
    let sequence = BootSequence::new(
        supervisor,
        h.gateway.clone(),
        LaunchRequest {
            credential: h.credential.clone(),
            network: Network::Test,
        },
        config,
    )
    .with_metrics(metrics.clone());

    let handle = sequence.start();
    let ready = tokio::time::timeout(Duration::from_secs(10), handle.wait_ready())
        .await
        .expect("boot timed out");
    assert!(ready);
    assert_eq!(sequence.state(), ServiceState::Ready);
    assert!(sequence.supervisor().is_running());
    assert_eq!(h.backend.hits("status"), 4);
    assert_eq!(metrics.launch_failures_total.get(), 1);
    assert_eq!(metrics.boot_attempts_total.get(), 2);

    assert!(sequence.check().await);
    sequence.shutdown();
    assert!(!sequence.supervisor().is_running());
}
