//! # Prometheus Metrics
//!
//! Operational counters for the boot loop and the gateway. Everything is
//! registered in a dedicated [`prometheus::Registry`] with the `terraplanet`
//! prefix so embedding applications can merge or expose it as they see fit.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Holds every metric handle of the client core.
///
/// Cheap to clone: prometheus handles are reference-counted internally.
#[derive(Clone)]
pub struct ClientMetrics {
    registry: Registry,
    /// Launch attempts made by the supervisor.
    pub boot_attempts_total: IntCounter,
    /// Launch attempts that failed before the process was up.
    pub launch_failures_total: IntCounter,
    /// Status probes issued by the readiness poller.
    pub status_polls_total: IntCounter,
    /// Transitions into the `Ready` state.
    pub ready_transitions_total: IntCounter,
    /// 1 while the backend is ready, 0 otherwise.
    pub backend_ready: IntGauge,
    /// Failed gateway calls, labelled by endpoint name.
    pub rpc_failures_total: IntCounterVec,
}

impl ClientMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("terraplanet".into()), None)
            .expect("failed to create prometheus registry");

        let boot_attempts_total =
            IntCounter::new("boot_attempts_total", "Backend launch attempts")
                .expect("metric creation");
        registry
            .register(Box::new(boot_attempts_total.clone()))
            .expect("metric registration");

        let launch_failures_total = IntCounter::new(
            "launch_failures_total",
            "Backend launch attempts that failed to start the process",
        )
        .expect("metric creation");
        registry
            .register(Box::new(launch_failures_total.clone()))
            .expect("metric registration");

        let status_polls_total = IntCounter::new(
            "status_polls_total",
            "Status probes issued while waiting for the backend",
        )
        .expect("metric creation");
        registry
            .register(Box::new(status_polls_total.clone()))
            .expect("metric registration");

        let ready_transitions_total = IntCounter::new(
            "ready_transitions_total",
            "Number of times the backend became ready",
        )
        .expect("metric creation");
        registry
            .register(Box::new(ready_transitions_total.clone()))
            .expect("metric registration");

        let backend_ready = IntGauge::new("backend_ready", "1 while the backend answers healthy")
            .expect("metric creation");
        registry
            .register(Box::new(backend_ready.clone()))
            .expect("metric registration");

        let rpc_failures_total = IntCounterVec::new(
            Opts::new("rpc_failures_total", "Failed backend calls by endpoint"),
            &["endpoint"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_failures_total.clone()))
            .expect("metric registration");

        Self {
            registry,
            boot_attempts_total,
            launch_failures_total,
            status_polls_total,
            ready_transitions_total,
            backend_ready,
            rpc_failures_total,
        }
    }

    /// Records one failed gateway call.
    pub fn record_rpc_failure(&self, endpoint: &str) {
        self.rpc_failures_total.with_label_values(&[endpoint]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition
    /// format.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
