//! Telemetry and logging infrastructure
//!
//! Structured logging for the monitor grid built on tracing.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogGuard};
