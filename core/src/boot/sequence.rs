//! # Boot Sequence
//!
//! Couples the supervisor and the readiness poller into one restart loop:
//!
//! ```text
//!   Starting ──launch ok──▶ Connecting ──healthy──▶ Ready
//!      ▲  │                     │
//!      │  └──launch error──┐    └──budget exhausted──┐
//!      │                   ▼                          ▼
//!      └──────────────── Failed ◀────────────────────┘
//! ```
//!
//! The loop has no attempt limit. Only the live attempt is cancellable; a
//! new `start()` cancels the previous one first and resets the state to
//! `Starting`. `shutdown()` leaves it at `Stopped`. A cancelled attempt
//! never publishes again.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::launcher::{BackendLauncher, LaunchRequest};
use super::poller::{PollOutcome, ReadinessPoller, ServiceState};
use super::supervisor::Supervisor;
use crate::config::BootConfig;
use crate::gateway::StatusProbe;
use crate::metrics::ClientMetrics;

struct Inner<L: BackendLauncher> {
    supervisor: Arc<Supervisor<L>>,
    poller: ReadinessPoller,
    probe: Arc<dyn StatusProbe>,
    request: LaunchRequest,
    config: BootConfig,
    state: watch::Sender<ServiceState>,
    metrics: Option<ClientMetrics>,
}

impl<L: BackendLauncher> Inner<L> {
    /// Publishes `state` unless this attempt was cancelled. The check runs
    /// under the channel lock, so a superseded attempt cannot overwrite the
    /// state of its successor.
    fn publish(&self, cancel: &CancellationToken, state: ServiceState) -> bool {
        let published = self.state.send_if_modified(|current| {
            if cancel.is_cancelled() {
                return false;
            }
            *current = state;
            true
        });
        if published {
            tracing::debug!(%state, "service state");
        }
        published
    }

    /// Waits out the restart delay. False if cancelled meanwhile.
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        if self.config.restart_delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.restart_delay) => true,
        }
    }

    async fn stop_supervisor(&self) {
        let supervisor = Arc::clone(&self.supervisor);
        if let Err(e) = tokio::task::spawn_blocking(move || supervisor.stop()).await {
            tracing::error!(error = %e, "supervisor stop task failed");
        }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            if cancel.is_cancelled() {
                return;
            }
            self.publish(&cancel, ServiceState::Starting);

            let supervisor = Arc::clone(&self.supervisor);
            let request = self.request.clone();
            let launched =
                tokio::task::spawn_blocking(move || supervisor.launch(&request)).await;

            match launched {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "backend launch failed, restarting");
                    self.publish(&cancel, ServiceState::Failed);
                    if !self.pause(&cancel).await {
                        return;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, "launch task failed, restarting");
                    self.publish(&cancel, ServiceState::Failed);
                    if !self.pause(&cancel).await {
                        return;
                    }
                    continue;
                }
            }

            self.publish(&cancel, ServiceState::Connecting);
            match self.poller.wait_until_ready(&cancel).await {
                PollOutcome::Ready => {
                    if self.publish(&cancel, ServiceState::Ready) {
                        if let Some(m) = &self.metrics {
                            m.ready_transitions_total.inc();
                            m.backend_ready.set(1);
                        }
                        tracing::info!("backend ready");
                    }
                    return;
                }
                PollOutcome::Exhausted => {
                    self.publish(&cancel, ServiceState::Failed);
                    self.stop_supervisor().await;
                    if !self.pause(&cancel).await {
                        return;
                    }
                }
                PollOutcome::Cancelled => return,
            }
        }
    }
}

struct Attempt {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns the restart loop and the published [`ServiceState`].
pub struct BootSequence<L: BackendLauncher> {
    inner: Arc<Inner<L>>,
    current: Mutex<Option<Attempt>>,
}

impl<L: BackendLauncher> BootSequence<L> {
    pub fn new(
        supervisor: Supervisor<L>,
        probe: Arc<dyn StatusProbe>,
        request: LaunchRequest,
        config: BootConfig,
    ) -> Self {
        let poller = ReadinessPoller::new(Arc::clone(&probe), config.poller.clone());
        let (state, _) = watch::channel(ServiceState::Starting);
        Self {
            inner: Arc::new(Inner {
                supervisor: Arc::new(supervisor),
                poller,
                probe,
                request,
                config,
                state,
                metrics: None,
            }),
            current: Mutex::new(None),
        }
    }

    /// Attaches metric handles to the loop and its poller. Call before
    /// `start()`.
    pub fn with_metrics(self, metrics: ClientMetrics) -> Self {
        let Self { inner, current } = self;
        let inner = match Arc::try_unwrap(inner) {
            Ok(mut inner) => {
                inner.poller = inner.poller.with_metrics(metrics.clone());
                inner.metrics = Some(metrics);
                Arc::new(inner)
            }
            Err(shared) => {
                tracing::warn!("boot sequence already started, metrics not attached");
                shared
            }
        };
        Self { inner, current }
    }

    /// Begins a new boot attempt, cancelling any previous one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> BootHandle {
        let mut current = self.current.lock();
        if let Some(prev) = current.take() {
            prev.cancel.cancel();
            prev.task.abort();
        }
        if let Some(m) = &self.inner.metrics {
            m.backend_ready.set(0);
        }
        self.inner.state.send_replace(ServiceState::Starting);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&self.inner).run(cancel.clone()));
        *current = Some(Attempt {
            cancel: cancel.clone(),
            task,
        });

        BootHandle {
            state: self.inner.state.subscribe(),
            cancel,
        }
    }

    /// One status probe, as run when the app returns to the foreground.
    ///
    /// Healthy: returns true. Unhealthy while `Ready` or `Failed`: the live
    /// process is interrupted and a new attempt starts. While an attempt is
    /// in flight, or after `shutdown()`, nothing is restarted.
    pub async fn check(&self) -> bool {
        match self.inner.probe.status().await {
            Ok(status) if status.is_healthy() => true,
            outcome => {
                let state = self.state();
                match state {
                    ServiceState::Starting | ServiceState::Connecting => {
                        tracing::debug!(%state, "status check failed during boot, leaving it running");
                        return false;
                    }
                    ServiceState::Stopped => {
                        tracing::debug!("status check failed after shutdown, not restarting");
                        return false;
                    }
                    ServiceState::Ready | ServiceState::Failed => {}
                }
                match outcome {
                    Ok(status) => tracing::warn!(status = %status.status, "backend unhealthy, restarting"),
                    Err(e) => tracing::warn!(error = %e, "backend unreachable, restarting"),
                }
                self.inner.stop_supervisor().await;
                self.start();
                false
            }
        }
    }

    /// Cancels the live attempt, kills the backend and publishes
    /// `Stopped`. Blocks briefly; this is the synchronous teardown path.
    pub fn shutdown(&self) {
        let mut current = self.current.lock();
        if let Some(prev) = current.take() {
            prev.cancel.cancel();
            prev.task.abort();
        }
        self.inner.supervisor.stop();
        if let Some(m) = &self.inner.metrics {
            m.backend_ready.set(0);
        }
        self.inner.state.send_replace(ServiceState::Stopped);
        tracing::debug!(state = %ServiceState::Stopped, "service state");
    }

    pub fn state(&self) -> ServiceState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.inner.state.subscribe()
    }

    pub fn supervisor(&self) -> &Supervisor<L> {
        &self.inner.supervisor
    }
}

/// Observer of one boot attempt.
#[derive(Clone)]
pub struct BootHandle {
    state: watch::Receiver<ServiceState>,
    cancel: CancellationToken,
}

impl BootHandle {
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.state.clone()
    }

    /// Resolves once the backend is `Ready`. False if the attempt was
    /// cancelled or the sequence dropped first.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.state.clone();
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            ready = async move { rx.wait_for(|s| *s == ServiceState::Ready).await.is_ok() } => ready,
        }
    }

    /// Stops polling. The process, if launched, keeps running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
