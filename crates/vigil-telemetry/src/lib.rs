//! Vigil Telemetry - Logging for the Vigil daemon and libraries.
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), vigil_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("vigil_policy=trace");
//!
//! let _guard = setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, LoggingGuard, session_span, setup_logging};
