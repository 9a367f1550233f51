//! Vigil Test - Shared test utilities for the Vigil workspace.
//!
//! Mock collaborators and recorders used as a dev-dependency by the other
//! crates.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vigil-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use vigil_test::{MockValidator, RecordingExecutor, RecordingSink};
//!
//! let validator = MockValidator::new().deny("navigate", "blocked domain");
//! let executor = RecordingExecutor::new();
//! let sink = RecordingSink::new();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
