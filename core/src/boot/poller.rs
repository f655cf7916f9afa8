//! # Readiness Poller
//!
//! Probes `/server/status` at a fixed interval until the backend answers
//! healthy, the attempt budget runs out, or the caller cancels. Failed
//! probes are expected while the backend starts and are logged at debug.

use std::fmt;
use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::gateway::StatusProbe;
use crate::metrics::ClientMetrics;

/// Lifecycle of the backend as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Payload extraction and process launch in progress.
    Starting,
    /// Process launched, waiting for a healthy status.
    Connecting,
    /// Backend answered healthy. Gateway calls may proceed.
    Ready,
    /// The current attempt failed; a new one follows.
    Failed,
    /// Shut down. Nothing runs until the next `start()`.
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Starting => "starting",
            ServiceState::Connecting => "connecting",
            ServiceState::Ready => "ready",
            ServiceState::Failed => "failed",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// How a poll run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready,
    /// `max_attempts` probes were made without a healthy answer.
    Exhausted,
    Cancelled,
}

pub struct ReadinessPoller {
    probe: Arc<dyn StatusProbe>,
    config: PollerConfig,
    metrics: Option<ClientMetrics>,
}

impl ReadinessPoller {
    pub fn new(probe: Arc<dyn StatusProbe>, config: PollerConfig) -> Self {
        Self {
            probe,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Polls until healthy. The first probe goes out immediately.
    ///
    /// No probe is issued after this returns; an in-flight probe is dropped
    /// on cancellation.
    pub async fn wait_until_ready(&self, cancel: &CancellationToken) -> PollOutcome {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = ticker.tick() => {}
            }

            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    tracing::warn!(attempts, "backend never reported healthy");
                    return PollOutcome::Exhausted;
                }
            }
            attempts += 1;
            if let Some(m) = &self.metrics {
                m.status_polls_total.inc();
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.probe.status() => result,
            };

            match result {
                Ok(status) if status.is_healthy() => {
                    tracing::debug!(attempts, "backend healthy");
                    return PollOutcome::Ready;
                }
                Ok(status) => {
                    tracing::debug!(attempt = attempts, status = %status.status, "backend not ready");
                }
                Err(e) => {
                    tracing::debug!(attempt = attempts, error = %e, "status probe failed");
                }
            }
        }
    }
}
