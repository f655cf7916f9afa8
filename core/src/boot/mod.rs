//! # Boot Module — Backend Lifecycle
//!
//! ```text
//! launcher.rs   — payload extraction + process spawn (NodeLauncher)
//! supervisor.rs — one worker thread per attempt, kill-before-relaunch
//! poller.rs     — ServiceState, readiness polling with cancellation
//! sequence.rs   — BootSequence: the unbounded restart loop + BootHandle
//! ```

pub mod launcher;
pub mod poller;
pub mod sequence;
pub mod supervisor;

pub use launcher::{BackendLauncher, BackendProcess, LaunchRequest, NodeLauncher};
pub use poller::{PollOutcome, ReadinessPoller, ServiceState};
pub use sequence::{BootHandle, BootSequence};
pub use supervisor::{Supervisor, SupervisorError};
