//! The fixed policy set provisioned for demo sessions.

use serde::{Deserialize, Serialize};
use vigil_core::ValidationMode;

/// Domains the demo `navigate` policy refuses.
const BLOCKED_DOMAINS_PATTERN: &str =
    r"^(?!.*(chase|wellsfargo|bankofamerica|paypal|venmo)\.com).*$";

const CLICK_POLICY_DESCRIPTION: &str = "Block clicks on buttons that commit financial transactions \
     such as Buy Now, Purchase, Submit Payment, Place Order, or Checkout. \
     Allow all other clicks including navigation links, form inputs, and menu items.";

/// A policy as submitted to the validator service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDefinition {
    /// Action kind the policy applies to.
    pub tool_name: String,
    /// Validation strategy.
    pub mode: ValidationMode,
    /// Per-argument rules (deterministic mode).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ArgumentConstraint>,
    /// Judge instructions (model-based mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_config: Option<LlmPolicyConfig>,
}

/// A rule on one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentConstraint {
    /// Argument the rule reads.
    pub argument_name: String,
    /// Whether the rule is active.
    pub enabled: bool,
    /// Pattern the value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Maximum value length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

impl ArgumentConstraint {
    fn regex(argument: &str, pattern: &str) -> Self {
        Self {
            argument_name: argument.to_string(),
            enabled: true,
            regex: Some(pattern.to_string()),
            max_length: None,
        }
    }

    fn max_length(argument: &str, limit: u32) -> Self {
        Self {
            argument_name: argument.to_string(),
            enabled: true,
            regex: None,
            max_length: Some(limit),
        }
    }
}

/// Instructions for a model-based policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmPolicyConfig {
    /// What to block.
    pub description: String,
    /// Situations that override the block.
    #[serde(default)]
    pub exceptions: Vec<String>,
}

/// The demo policy set: `navigate`, `input`, `click` and `search`.
#[must_use]
pub fn demo_policies() -> Vec<PolicyDefinition> {
    vec![
        PolicyDefinition {
            tool_name: "navigate".to_string(),
            mode: ValidationMode::Deterministic,
            constraints: vec![ArgumentConstraint::regex("url", BLOCKED_DOMAINS_PATTERN)],
            llm_config: None,
        },
        PolicyDefinition {
            tool_name: "input".to_string(),
            mode: ValidationMode::Deterministic,
            constraints: vec![ArgumentConstraint::max_length("text", 500)],
            llm_config: None,
        },
        PolicyDefinition {
            tool_name: "click".to_string(),
            mode: ValidationMode::Llm,
            constraints: Vec::new(),
            llm_config: Some(LlmPolicyConfig {
                description: CLICK_POLICY_DESCRIPTION.to_string(),
                exceptions: vec![
                    "If the button is clearly a search or navigation action, allow the click"
                        .to_string(),
                    "If the button adds an item to a cart without completing purchase, allow the click"
                        .to_string(),
                ],
            }),
        },
        PolicyDefinition {
            tool_name: "search".to_string(),
            mode: ValidationMode::Deterministic,
            constraints: vec![ArgumentConstraint::max_length("query", 200)],
            llm_config: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn demo_set_covers_four_tools() {
        let names: Vec<String> = demo_policies().into_iter().map(|p| p.tool_name).collect();
        assert_eq!(names, vec!["navigate", "input", "click", "search"]);
    }

    #[test]
    fn demo_policies_are_validated_actions() {
        for policy in demo_policies() {
            assert!(
                vigil_core::VALIDATED_ACTIONS.contains(&policy.tool_name.as_str()),
                "{}",
                policy.tool_name
            );
        }
    }

    #[test]
    fn navigate_policy_wire_shape() {
        let navigate = &demo_policies()[0];
        let json = serde_json::to_value(navigate).unwrap();
        assert_eq!(
            json,
            json!({
                "toolName": "navigate",
                "mode": "deterministic",
                "constraints": [{
                    "argumentName": "url",
                    "enabled": true,
                    "regex": BLOCKED_DOMAINS_PATTERN,
                }],
            })
        );
    }

    #[test]
    fn click_policy_is_model_based() {
        let click = &demo_policies()[2];
        let json = serde_json::to_value(click).unwrap();
        assert_eq!(json["mode"], "llm");
        assert!(json.get("constraints").is_none());
        assert_eq!(json["llmConfig"]["exceptions"].as_array().unwrap().len(), 2);
        assert!(
            json["llmConfig"]["description"]
                .as_str()
                .unwrap()
                .contains("Submit Payment")
        );
    }

    #[test]
    fn length_limits() {
        let policies = demo_policies();
        assert_eq!(policies[1].constraints[0].max_length, Some(500));
        assert_eq!(policies[3].constraints[0].max_length, Some(200));
        assert_eq!(policies[3].constraints[0].argument_name, "query");
    }
}
