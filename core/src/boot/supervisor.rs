//! # Process Supervisor
//!
//! Owns the backend process. Each launch attempt runs on its own named OS
//! thread which keeps the process handle and watches it until interrupted.
//! Launching again always interrupts the previous worker first, so at most
//! one backend is alive per supervisor.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::launcher::{BackendLauncher, LaunchRequest};
use crate::config::SUPERVISOR_WATCH_INTERVAL;
use crate::metrics::ClientMetrics;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The process could not be spawned.
    #[error("backend launch failed: {0}")]
    Launch(#[source] io::Error),

    /// The bundled payload could not be extracted.
    #[error("backend payload error at {path}: {source}")]
    Payload {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

struct Worker {
    thread: JoinHandle<()>,
    interrupt: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
}

impl Worker {
    /// Signals the worker, waits for it to kill its process and exit.
    fn interrupt(self) {
        self.interrupt.store(true, Ordering::SeqCst);
        self.thread.thread().unpark();
        if self.thread.join().is_err() {
            tracing::error!("backend worker thread panicked");
        }
    }

    /// Signals the worker without waiting. The thread kills its process
    /// on its own and exits.
    fn detach(self) {
        self.interrupt.store(true, Ordering::SeqCst);
        self.thread.thread().unpark();
    }
}

pub struct Supervisor<L: BackendLauncher> {
    launcher: Arc<L>,
    worker: Mutex<Option<Worker>>,
    /// Serializes whole launch attempts, including payload extraction.
    launching: Mutex<()>,
    attempts: AtomicU64,
    metrics: Option<ClientMetrics>,
}

impl<L: BackendLauncher> Supervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            worker: Mutex::new(None),
            launching: Mutex::new(()),
            attempts: AtomicU64::new(0),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Starts a fresh backend, interrupting any previous one first.
    ///
    /// Blocks until the worker reports whether the process came up. Call
    /// from a blocking context.
    pub fn launch(&self, request: &LaunchRequest) -> Result<(), SupervisorError> {
        let _guard = self.launching.lock();
        self.stop();

        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(m) = &self.metrics {
            m.boot_attempts_total.inc();
        }

        let interrupt = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let thread = {
            let launcher = Arc::clone(&self.launcher);
            let request = request.clone();
            let interrupt = Arc::clone(&interrupt);
            let alive = Arc::clone(&alive);
            thread::Builder::new()
                .name(format!("backend-{}", attempt))
                .spawn(move || {
                    let mut process = match launcher.launch(&request) {
                        Ok(process) => process,
                        Err(e) => {
                            let _ = tx.send(Err(e));
                            return;
                        }
                    };
                    alive.store(true, Ordering::SeqCst);
                    let _ = tx.send(Ok(()));

                    while !interrupt.load(Ordering::SeqCst) {
                        if !process.is_alive() {
                            tracing::warn!(attempt, "backend process exited");
                            break;
                        }
                        thread::park_timeout(SUPERVISOR_WATCH_INTERVAL);
                    }
                    if let Err(e) = process.kill() {
                        tracing::warn!(attempt, error = %e, "failed to kill backend process");
                    }
                    alive.store(false, Ordering::SeqCst);
                })
                .map_err(SupervisorError::Launch)?
        };

        let outcome = rx.recv().unwrap_or_else(|_| {
            Err(SupervisorError::Launch(io::Error::other(
                "backend worker exited before reporting",
            )))
        });

        match outcome {
            Ok(()) => {
                tracing::info!(attempt, "backend launched");
                *self.worker.lock() = Some(Worker {
                    thread,
                    interrupt,
                    alive,
                });
                Ok(())
            }
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.launch_failures_total.inc();
                }
                let _ = thread.join();
                Err(e)
            }
        }
    }

    /// Interrupts the live worker, if any, and waits for its process to die.
    pub fn stop(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            tracing::debug!("interrupting backend worker");
            worker.interrupt();
        }
    }

    /// True while the latest launched process is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .map_or(false, |w| w.alive.load(Ordering::SeqCst))
    }

    /// Launch attempts made so far, failed ones included.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }
}

/// Dropping only signals the worker; it may run on an async worker thread.
/// Call [`Supervisor::stop`] first to wait for the process to die.
impl<L: BackendLauncher> Drop for Supervisor<L> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.detach();
        }
    }
}
