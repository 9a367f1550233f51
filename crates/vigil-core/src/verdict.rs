//! Validation verdicts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reason attached to a deny verdict when the validator gave none.
pub const DEFAULT_DENY_REASON: &str = "Policy violation";

/// The validation strategy that produced a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Rule-based constraints (regex, length limits).
    #[default]
    Deterministic,
    /// Model-based judgement.
    Llm,
}

impl ValidationMode {
    /// Interpret the validator's mode metadata. Unknown values fall back to
    /// [`ValidationMode::Deterministic`].
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("llm") => Self::Llm,
            _ => Self::Deterministic,
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deterministic => f.write_str("deterministic"),
            Self::Llm => f.write_str("llm"),
        }
    }
}

/// Allow/deny outcome as it appears on the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// The action may run.
    Allow,
    /// The action needs a reviewer.
    Deny,
}

/// Result of one validation call. Exactly one per validated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    /// Whether the policy allows the action.
    pub allowed: bool,
    /// Human-readable explanation.
    pub reason: Option<String>,
    /// Strategy that produced the verdict.
    pub mode: ValidationMode,
    /// Wall time of the validation call.
    pub latency: Duration,
}

impl ValidationVerdict {
    /// An allow verdict.
    #[must_use]
    pub fn allow(mode: ValidationMode) -> Self {
        Self {
            allowed: true,
            reason: None,
            mode,
            latency: Duration::ZERO,
        }
    }

    /// A deny verdict with a reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>, mode: ValidationMode) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            mode,
            latency: Duration::ZERO,
        }
    }

    /// Attach a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Record the measured latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The event-stream form of the outcome.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        if self.allowed {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }

    /// Deny reason, defaulting to [`DEFAULT_DENY_REASON`].
    #[must_use]
    pub fn deny_reason(&self) -> String {
        self.reason
            .clone()
            .unwrap_or_else(|| DEFAULT_DENY_REASON.to_string())
    }

    /// Latency rounded to whole milliseconds.
    #[must_use]
    pub fn latency_ms(&self) -> u64 {
        u64::try_from(self.latency.as_millis()).unwrap_or(u64::MAX)
    }
}
