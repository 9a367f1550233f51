//! Test fixtures for common types.

use serde_json::Value;
use tracing_subscriber::EnvFilter;
use vigil_core::{ProposedAction, SessionId};

/// Create a test session ID.
#[must_use]
pub fn test_session_id() -> SessionId {
    SessionId::new()
}

/// Create an action with a single argument.
#[must_use]
pub fn test_action(name: &str, key: &str, value: impl Into<Value>) -> ProposedAction {
    ProposedAction::new(name).with_arg(key, value)
}

/// Navigation to a domain the demo policies block.
#[must_use]
pub fn blocked_navigation() -> ProposedAction {
    test_action("navigate", "url", "https://chase.com")
}

/// Install a test-writer subscriber honouring `RUST_LOG`. Safe to call
/// from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
