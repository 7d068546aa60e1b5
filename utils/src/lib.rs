//! Shared utilities for the verification service.

pub mod logging;
pub mod spans;

pub use logging::{init_logging, LogFormat, LoggingError};
