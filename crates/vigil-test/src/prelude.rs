//! Prelude module - commonly used test utilities.
//!
//! Use `use vigil_test::prelude::*;` in test modules.

pub use crate::{MockProvisioner, MockValidator, RecordingExecutor, RecordingSink};

pub use crate::{init_test_tracing, test_action, test_session_id};
