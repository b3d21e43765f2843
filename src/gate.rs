//! Pre-execution gate for proposed tool calls.
//!
//! [`ToolGate`] runs every call through the security checks in a fixed order
//! before the registry sees it:
//!
//! 1. [`PolicyEngine`] verdict (deny, ask, allow)
//! 2. [`WorkspaceGuard`] for tools that take filesystem paths
//! 3. [`validate_url`] for tools that take a URL
//! 4. [`ToolRegistry::execute`]
//! 5. credential scrubbing of the result
//!
//! All collaborators are passed in explicitly; there is no process-wide state.

use crate::config::{Config, ConfigError};
use crate::security::{contains_sensitive, scrub, Decision, PolicyDecision, PolicyEngine, WorkspaceGuard};
use crate::tools::{validate_url, ToolRegistry, ToolResult, DEFAULT_FILE_TOOLS, DEFAULT_NETWORK_TOOLS};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

const PATH_KEYS: &[&str] = &["path", "file_path"];
const PATH_LIST_KEYS: &[&str] = &["paths"];
const URL_KEY: &str = "url";

/// A tool call proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    /// Serialized (JSON) arguments.
    pub input: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
        }
    }
}

/// What happened to a tool call at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The handler ran; output already scrubbed when scrubbing is on.
    Executed(ToolResult),
    /// Refused by policy, or arguments could not be inspected.
    Denied { reason: String },
    /// Policy wants a human to confirm the call.
    NeedsApproval { tool: String },
    PathBlocked { path: String, decision: Decision },
    UrlBlocked { url: String },
    UnknownTool { tool: String },
}

impl GateOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }
}

pub struct ToolGate {
    registry: ToolRegistry,
    policy: RwLock<Arc<PolicyEngine>>,
    guard: WorkspaceGuard,
    file_tools: HashSet<String>,
    network_tools: HashSet<String>,
    scrub_output: bool,
    resolve_symlinks: bool,
}

fn to_set(names: &[&str]) -> HashSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

impl ToolGate {
    pub fn new(registry: ToolRegistry, policy: PolicyEngine, guard: WorkspaceGuard) -> Self {
        Self {
            registry,
            policy: RwLock::new(Arc::new(policy)),
            guard,
            file_tools: to_set(DEFAULT_FILE_TOOLS),
            network_tools: to_set(DEFAULT_NETWORK_TOOLS),
            scrub_output: true,
            resolve_symlinks: false,
        }
    }

    /// Build a gate from config, disabling the tools it lists.
    pub fn from_config(config: &Config, mut registry: ToolRegistry) -> Result<Self, ConfigError> {
        let guard = config.build_guard()?;
        let policy = config.build_policy()?;
        for name in &config.tools.disabled {
            if !registry.set_enabled(name, false) {
                tracing::warn!(tool = %name, "tools.disabled names an unregistered tool");
            }
        }
        Ok(Self::new(registry, policy, guard)
            .with_file_tools(config.tools.file_tools.iter().cloned())
            .with_network_tools(config.tools.network_tools.iter().cloned())
            .with_output_scrubbing(config.tools.scrub_output)
            .with_symlink_resolution(config.workspace.resolve_symlinks))
    }

    pub fn with_file_tools<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.file_tools = names.into_iter().collect();
        self
    }

    pub fn with_network_tools<I: IntoIterator<Item = String>>(mut self, names: I) -> Self {
        self.network_tools = names.into_iter().collect();
        self
    }

    pub fn with_output_scrubbing(mut self, enabled: bool) -> Self {
        self.scrub_output = enabled;
        self
    }

    pub fn with_symlink_resolution(mut self, enabled: bool) -> Self {
        self.resolve_symlinks = enabled;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    pub fn guard(&self) -> &WorkspaceGuard {
        &self.guard
    }

    /// Snapshot of the current policy.
    pub fn policy(&self) -> Arc<PolicyEngine> {
        self.policy.read().clone()
    }

    /// Swap in a new policy. Calls already past the policy step keep the old one.
    pub fn replace_policy(&self, policy: PolicyEngine) {
        *self.policy.write() = Arc::new(policy);
        tracing::info!("tool policy replaced");
    }

    pub async fn dispatch(&self, call: &ToolCall) -> GateOutcome {
        self.dispatch_inner(call, false).await
    }

    /// Like [`dispatch`](Self::dispatch) for a call a human already approved.
    /// `Ask` is treated as `Allow`; `Deny` still refuses.
    pub async fn dispatch_approved(&self, call: &ToolCall) -> GateOutcome {
        self.dispatch_inner(call, true).await
    }

    async fn dispatch_inner(&self, call: &ToolCall, approved: bool) -> GateOutcome {
        if let Some(outcome) = self.check_policy(&call.name, approved) {
            return outcome;
        }

        let is_file_tool = self.file_tools.contains(&call.name);
        let is_network_tool = self.network_tools.contains(&call.name);
        if is_file_tool || is_network_tool {
            let Ok(args) = serde_json::from_str::<Value>(&call.input) else {
                tracing::warn!(tool = %call.name, "unparseable arguments; refusing call");
                return GateOutcome::Denied {
                    reason: "tool arguments are not valid JSON".into(),
                };
            };
            if is_file_tool {
                if let Some(outcome) = self.check_paths(&call.name, &args) {
                    return outcome;
                }
            }
            if is_network_tool {
                if let Some(outcome) = self.check_url(&call.name, &args) {
                    return outcome;
                }
            }
        }

        tracing::debug!(tool = %call.name, args = %scrub(&call.input), "executing tool call");
        let Some(result) = self.registry.execute(&call.name, &call.input).await else {
            tracing::warn!(tool = %call.name, "model requested an unknown tool");
            return GateOutcome::UnknownTool {
                tool: call.name.clone(),
            };
        };

        GateOutcome::Executed(if self.scrub_output {
            scrub_result(result)
        } else {
            result
        })
    }

    fn check_policy(&self, tool: &str, approved: bool) -> Option<GateOutcome> {
        let policy = self.policy();
        match policy.evaluate(tool) {
            PolicyDecision::Deny => {
                let reason = policy
                    .get_deny_reason(tool)
                    .unwrap_or("denied by policy")
                    .to_string();
                tracing::warn!(tool, %reason, "tool call denied by policy");
                Some(GateOutcome::Denied { reason })
            }
            PolicyDecision::Ask if !approved => {
                tracing::info!(tool, "tool call needs approval");
                Some(GateOutcome::NeedsApproval {
                    tool: tool.to_string(),
                })
            }
            PolicyDecision::Ask | PolicyDecision::Allow => None,
        }
    }

    fn check_paths(&self, tool: &str, args: &Value) -> Option<GateOutcome> {
        let paths = match collect_paths(args) {
            Ok(paths) => paths,
            Err(reason) => {
                tracing::warn!(tool, reason, "cannot inspect file tool arguments; refusing call");
                return Some(GateOutcome::Denied {
                    reason: reason.to_string(),
                });
            }
        };
        let blocked = if self.resolve_symlinks {
            paths
                .iter()
                .map(|path| (*path, self.guard.check_resolved(path)))
                .find(|(_, decision)| !decision.is_allowed())
        } else {
            self.guard
                .check_batch(&paths)
                .into_iter()
                .find(|(_, decision)| !decision.is_allowed())
        };

        let (path, decision) = blocked?;
        tracing::warn!(tool, path = %scrub(path), %decision, "path blocked by workspace guard");
        Some(GateOutcome::PathBlocked {
            path: path.to_string(),
            decision,
        })
    }

    fn check_url(&self, tool: &str, args: &Value) -> Option<GateOutcome> {
        let url = args.get(URL_KEY).and_then(Value::as_str).unwrap_or_default();
        if validate_url(url) {
            return None;
        }
        tracing::warn!(tool, url = %scrub(url), "destination blocked as local/private");
        Some(GateOutcome::UrlBlocked {
            url: url.to_string(),
        })
    }
}

/// Every path a file tool's arguments name.
///
/// Arguments the guard cannot fully inspect are an error: a non-object body,
/// a path key holding something other than a string (or list of strings),
/// or no path at all.
fn collect_paths(args: &Value) -> Result<Vec<&str>, &'static str> {
    let Some(object) = args.as_object() else {
        return Err("file tool arguments must be a JSON object");
    };

    let mut paths = Vec::new();
    for key in PATH_KEYS {
        match object.get(*key) {
            None => {}
            Some(Value::String(path)) => paths.push(path.as_str()),
            Some(_) => return Err("path argument must be a string"),
        }
    }
    for key in PATH_LIST_KEYS {
        match object.get(*key) {
            None => {}
            Some(Value::Array(list)) => {
                for item in list {
                    let Some(path) = item.as_str() else {
                        return Err("paths argument must be a list of strings");
                    };
                    paths.push(path);
                }
            }
            Some(_) => return Err("paths argument must be a list of strings"),
        }
    }

    if paths.is_empty() {
        return Err("file tool call names no path");
    }
    Ok(paths)
}

fn scrub_in_place(text: &mut String) {
    if contains_sensitive(text) {
        *text = scrub(text).into_owned();
    }
}

fn scrub_result(mut result: ToolResult) -> ToolResult {
    scrub_in_place(&mut result.output);
    if let Some(error) = result.error.as_mut() {
        scrub_in_place(error);
    }
    result
}
