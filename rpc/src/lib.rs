//! HTTP API for the verification service.
//!
//! Provides endpoints for:
//! - Document submission and the caller's own status
//! - Status and request history per user
//! - The admin review queue, request detail and review decisions
//! - Health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod notify;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use identity::Caller;
pub use metrics::RpcMetrics;
pub use notify::BroadcastSink;
pub use server::{router, AppState, RpcServer};
