//! Actions proposed by the agent and the results handed back to it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Action kinds that go through policy validation.
///
/// Every other action kind bypasses validation and is trusted unconditionally.
pub const VALIDATED_ACTIONS: &[&str] = &["navigate", "search", "click", "input", "extract", "scroll"];

/// Maximum rendered length (in characters) of one argument value in events.
pub const MAX_ARG_CHARS: usize = 200;

/// Suffix appended to an argument value cut at [`MAX_ARG_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// One candidate operation emitted by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    /// Action kind, e.g. `navigate` or `click`.
    pub name: String,
    /// Flat argument map.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ProposedAction {
    /// Create an action with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Build an action from a name and an arbitrary parameter value.
    ///
    /// Object parameters become the argument map; anything else is wrapped
    /// as `{"value": params}`.
    #[must_use]
    pub fn from_params(name: impl Into<String>, params: Value) -> Self {
        let args = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            },
        };
        Self {
            name: name.into(),
            args,
        }
    }

    /// Whether this action kind is subject to validation.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        VALIDATED_ACTIONS.contains(&self.name.as_str())
    }

    /// Arguments rendered for the event stream, see [`truncate_args`].
    #[must_use]
    pub fn display_args(&self) -> Map<String, Value> {
        truncate_args(&self.args)
    }
}

/// Cap every argument value at [`MAX_ARG_CHARS`] characters.
///
/// Values whose rendering fits are passed through untouched (keeping their
/// JSON type). Longer values are replaced by a string of the first
/// [`MAX_ARG_CHARS`] characters followed by [`TRUNCATION_MARKER`].
#[must_use]
pub fn truncate_args(args: &Map<String, Value>) -> Map<String, Value> {
    args.iter()
        .map(|(key, value)| (key.clone(), truncate_value(value)))
        .collect()
}

fn truncate_value(value: &Value) -> Value {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.chars().count() > MAX_ARG_CHARS {
        let mut cut: String = rendered.chars().take(MAX_ARG_CHARS).collect();
        cut.push_str(TRUNCATION_MARKER);
        Value::String(cut)
    } else {
        value.clone()
    }
}

/// What the agent sees after an action was handled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Output produced by execution, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Error or rejection message, if the action did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the agent declared the task complete with this action.
    #[serde(default)]
    pub is_done: bool,
}

impl ActionResult {
    /// A successful result carrying `output`.
    #[must_use]
    pub fn ok(output: impl Into<Value>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::default()
        }
    }

    /// A result for an action that was not executed.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Mark the result as the final one of the task.
    #[must_use]
    pub fn done(mut self) -> Self {
        self.is_done = true;
        self
    }

    /// Whether the action failed or was rejected.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validated_set_membership() {
        for name in ["navigate", "search", "click", "input", "extract", "scroll"] {
            assert!(ProposedAction::new(name).is_validated(), "{name}");
        }
        assert!(!ProposedAction::new("done").is_validated());
        assert!(!ProposedAction::new("go_back").is_validated());
        assert!(!ProposedAction::new("Navigate").is_validated());
    }

    #[test]
    fn short_values_are_verbatim() {
        let action = ProposedAction::new("input")
            .with_arg("text", "hello")
            .with_arg("index", 4);
        let rendered = action.display_args();
        assert_eq!(rendered["text"], json!("hello"));
        assert_eq!(rendered["index"], json!(4));
    }

    #[test]
    fn value_at_limit_is_verbatim() {
        let exact = "a".repeat(MAX_ARG_CHARS);
        let action = ProposedAction::new("input").with_arg("text", exact.clone());
        assert_eq!(action.display_args()["text"], json!(exact));
    }

    #[test]
    fn long_values_are_cut_with_marker() {
        let long = "x".repeat(MAX_ARG_CHARS + 50);
        let action = ProposedAction::new("input").with_arg("text", long);
        let rendered = action.display_args();
        let text = rendered["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), 203);
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let long = "é".repeat(MAX_ARG_CHARS + 1);
        let action = ProposedAction::new("input").with_arg("text", long);
        let text = action.display_args()["text"].as_str().unwrap().to_string();
        assert!(text.starts_with(&"é".repeat(MAX_ARG_CHARS)));
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn long_non_string_values_are_rendered_then_cut() {
        let big: Vec<u32> = (0..200).collect();
        let action = ProposedAction::new("extract").with_arg("ids", json!(big));
        let rendered = action.display_args();
        let text = rendered["ids"].as_str().unwrap();
        assert!(text.starts_with("[0,1,2"));
        assert!(text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn from_params_wraps_scalars() {
        let action = ProposedAction::from_params("scroll", json!(true));
        assert_eq!(action.args["value"], json!(true));

        let action = ProposedAction::from_params("click", json!({"index": 3}));
        assert_eq!(action.args["index"], json!(3));

        let action = ProposedAction::from_params("done", Value::Null);
        assert!(action.args.is_empty());
    }

    #[test]
    fn action_result_shapes() {
        let ok = ActionResult::ok("navigated");
        assert!(!ok.is_error());
        let rejected = ActionResult::rejected("Denied by reviewer");
        assert!(rejected.is_error());
        assert_eq!(rejected.error.as_deref(), Some("Denied by reviewer"));
        assert!(ActionResult::ok("fin").done().is_done);
    }
}
