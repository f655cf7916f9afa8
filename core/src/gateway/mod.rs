//! # Gateway Module — Authenticated Backend RPC
//!
//! ```text
//! endpoint.rs — fixed catalogue of (method, path) pairs
//! types.rs    — request/response bodies with the backend's field names
//! client.rs   — Gateway (reqwest) + StatusProbe / BackendRpc traits
//! error.rs    — GatewayError
//! ```

pub mod client;
pub mod endpoint;
pub mod error;
pub mod types;

pub use client::{BackendRpc, Gateway, StatusProbe};
pub use endpoint::Endpoint;
pub use error::{GatewayError, GatewayResult};
