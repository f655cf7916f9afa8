//! # Client Configuration & Constants
//!
//! Every magic number in the client lives here. The backend contract is
//! fixed (loopback host, fixed port, fixed timeouts), so most of these are
//! plain constants; the handful of knobs an embedder may reasonably want to
//! turn are grouped into `Default`-implementing config structs below.

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Backend Endpoint
// ---------------------------------------------------------------------------

/// Loopback host the bundled backend binds to.
pub const BACKEND_HOST: &str = "127.0.0.1";

/// Fixed port the bundled backend listens on.
pub const BACKEND_PORT: u16 = 4938;

/// Connect timeout for every gateway call.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Total request timeout (write + read) for every gateway call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Value of the `status` field the backend reports once it is healthy.
pub const STATUS_OK: &str = "ok";

// ---------------------------------------------------------------------------
// Boot Timing
// ---------------------------------------------------------------------------

/// Interval between two status probes while the backend is coming up.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How often the supervisor worker checks whether its child is still alive.
pub const SUPERVISOR_WATCH_INTERVAL: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// On-chain amounts are integers in micro-units. 1 display unit = 1e6 micro.
pub const MICRO_PER_UNIT: f64 = 1_000_000.0;

/// Staking rate assumed before the first successful rate fetch.
pub const DEFAULT_STAKING_RATE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// Width of each rendered credential half: 64 random bits in hex.
pub const CREDENTIAL_HEX_WIDTH: usize = 16;

// ---------------------------------------------------------------------------
// Vault Keys
// ---------------------------------------------------------------------------

/// Secret name of the per-install Basic-Auth pair.
pub const SECRET_INSTALL_CREDENTIAL: &str = "install_credential";

/// Secret name of the persisted wallet (address + mnemonic).
pub const SECRET_WALLET: &str = "wallet";

/// Plain setting holding the selected network id.
pub const SETTING_NETWORK: &str = "current_network";

/// Plain setting holding the gas-payment denomination id.
pub const SETTING_PAY_GAS: &str = "pay_gas";

// ---------------------------------------------------------------------------
// Backend Payload
// ---------------------------------------------------------------------------

/// Directory name of the extracted backend inside the app's private storage.
pub const PAYLOAD_DIR_NAME: &str = "nodejs-project";

/// Entry script of the backend, relative to the extracted payload.
pub const PAYLOAD_ENTRY: &str = "bin/www";

/// Environment variables used when the credential is handed over through
/// the environment instead of argv.
pub const ENV_BACKEND_USERNAME: &str = "TERRAPLANET_USERNAME";
pub const ENV_BACKEND_PASSWORD: &str = "TERRAPLANET_PASSWORD";

// ---------------------------------------------------------------------------
// Config Structs
// ---------------------------------------------------------------------------

/// Settings for the authenticated loopback HTTP client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Connect timeout per call.
    pub connect_timeout: Duration,
    /// Total timeout per call.
    pub request_timeout: Duration,
    /// Skip certificate verification on this client instance. Only has an
    /// effect when `base_url` is `https://`.
    pub accept_self_signed: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{}:{}", BACKEND_HOST, BACKEND_PORT),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            accept_self_signed: true,
        }
    }
}

/// How the install credential reaches the backend process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialTransport {
    /// Positional launch arguments (`<entry> <username> <password> <network>`).
    #[default]
    Arguments,
    /// `TERRAPLANET_USERNAME` / `TERRAPLANET_PASSWORD` environment variables.
    Environment,
}

/// Where the bundled backend comes from and how it is launched.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Interpreter used to run the backend entry script.
    pub program: PathBuf,
    /// Read-only bundled payload, copied fresh on every cold start.
    pub payload_source: PathBuf,
    /// App-private directory the payload is extracted into.
    pub data_dir: PathBuf,
    /// Credential hand-over mechanism.
    pub credential_transport: CredentialTransport,
}

impl BackendConfig {
    /// Creates a config with the default interpreter (`node`) and argv
    /// credential transport.
    pub fn new(payload_source: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("node"),
            payload_source: payload_source.into(),
            data_dir: data_dir.into(),
            credential_transport: CredentialTransport::default(),
        }
    }

    /// Target directory of the extracted payload.
    pub fn extract_dir(&self) -> PathBuf {
        self.data_dir.join(PAYLOAD_DIR_NAME)
    }
}

/// Readiness poll settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay between two status probes.
    pub interval: Duration,
    /// Give up (and restart the boot) after this many probes. `None` polls
    /// forever, which is the shipped behaviour: availability beats resource
    /// economy for a wallet that cannot work without its backend.
    pub max_attempts: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: STATUS_POLL_INTERVAL,
            max_attempts: None,
        }
    }
}

/// Boot loop settings.
#[derive(Debug, Clone, Default)]
pub struct BootConfig {
    pub poller: PollerConfig,
    /// Pause between a failed attempt and the next launch. Zero restarts
    /// immediately.
    pub restart_delay: Duration,
}
