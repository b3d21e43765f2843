use super::pattern::matches_tool_pattern;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tools a sandboxed session may never run.
pub const SANDBOX_DENIED_TOOLS: &[&str] = &["write", "edit", "exec", "bash", "apply_patch"];

/// Where a policy rule came from.
///
/// Layers are ordered: a later layer overrides an earlier one for `Allow` and
/// `Ask` outcomes. `Deny` ignores the ordering entirely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLayer {
    Global,
    Provider,
    Agent,
    Profile,
    Sandbox,
}

impl PolicyLayer {
    pub const fn priority(self) -> u8 {
        match self {
            Self::Global => 1,
            Self::Provider => 2,
            Self::Agent => 3,
            Self::Profile => 4,
            Self::Sandbox => 5,
        }
    }
}

/// Verdict for a proposed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyDecision {
    /// Run without asking.
    Allow,
    /// Refuse outright.
    Deny,
    /// Escalate to a human.
    Ask,
}

impl fmt::Display for PolicyDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Ask => "ask",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub tool_pattern: String,
    pub decision: PolicyDecision,
    pub reason: String,
}

impl PolicyRule {
    pub fn new(
        tool_pattern: impl Into<String>,
        decision: PolicyDecision,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            tool_pattern: tool_pattern.into(),
            decision,
            reason: reason.into(),
        }
    }

    pub fn allow(tool_pattern: impl Into<String>) -> Self {
        Self::new(tool_pattern, PolicyDecision::Allow, "")
    }

    pub fn ask(tool_pattern: impl Into<String>) -> Self {
        Self::new(tool_pattern, PolicyDecision::Ask, "")
    }

    pub fn deny(tool_pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(tool_pattern, PolicyDecision::Deny, reason)
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        matches_tool_pattern(&self.tool_pattern, tool_name)
    }
}

/// Layered allow/deny/ask evaluation per tool name.
///
/// Rules are kept in registration order. The engine holds no interior
/// mutability, so a built engine can be shared across threads and evaluated
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    rules: Vec<(PolicyLayer, PolicyRule)>,
}

impl PolicyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single global rule allowing every tool.
    pub fn default_policy() -> Self {
        let mut engine = Self::new();
        engine.add_rule(PolicyLayer::Global, PolicyRule::allow("*"));
        engine
    }

    /// [`default_policy`](Self::default_policy) plus sandbox-layer denials
    /// for every tool in [`SANDBOX_DENIED_TOOLS`].
    pub fn sandbox_policy() -> Self {
        let mut engine = Self::default_policy();
        for tool in SANDBOX_DENIED_TOOLS {
            engine.add_rule(PolicyLayer::Sandbox, PolicyRule::deny(*tool, "sandboxed"));
        }
        engine
    }

    pub fn add_rule(&mut self, layer: PolicyLayer, rule: PolicyRule) {
        self.rules.push((layer, rule));
    }

    pub fn rules(&self) -> &[(PolicyLayer, PolicyRule)] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide whether `tool_name` may run.
    ///
    /// Any matching `Deny` rule, from any layer, forces `Deny`. Otherwise the
    /// matching rule from the highest layer wins, with the last-registered
    /// rule winning ties inside a layer. No match at all means `Allow`.
    pub fn evaluate(&self, tool_name: &str) -> PolicyDecision {
        let mut winner: Option<(u8, PolicyDecision)> = None;

        for (layer, rule) in &self.rules {
            if !rule.matches(tool_name) {
                continue;
            }
            if rule.decision == PolicyDecision::Deny {
                return PolicyDecision::Deny;
            }
            let priority = layer.priority();
            if winner.map_or(true, |(best, _)| priority >= best) {
                winner = Some((priority, rule.decision));
            }
        }

        winner.map_or(PolicyDecision::Allow, |(_, decision)| decision)
    }

    /// Reason of the first-registered matching deny rule with a non-empty reason.
    ///
    /// This follows registration order, not layer priority, so it need not
    /// belong to the highest-layer denial.
    pub fn get_deny_reason(&self, tool_name: &str) -> Option<&str> {
        self.rules
            .iter()
            .map(|(_, rule)| rule)
            .filter(|rule| rule.decision == PolicyDecision::Deny && !rule.reason.is_empty())
            .find(|rule| rule.matches(tool_name))
            .map(|rule| rule.reason.as_str())
    }
}
