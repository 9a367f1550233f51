//! Prelude module - commonly used types for convenient import.

pub use crate::{LogConfig, LogFormat, LogTarget, LoggingGuard, setup_logging};
pub use crate::{TelemetryError, TelemetryResult};
