use crate::security::pattern::{validate_path_pattern, validate_tool_pattern};
use crate::security::{PolicyDecision, PolicyEngine, PolicyLayer, PolicyRule, RuleKind, WorkspaceGuard};
use crate::tools::{DEFAULT_FILE_TOOLS, DEFAULT_NETWORK_TOOLS};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

/// Environment variable overriding `workspace.root`.
pub const WORKSPACE_ENV: &str = "CLAWGATE_WORKSPACE";
/// Environment variable overriding `policy.preset`.
pub const POLICY_PRESET_ENV: &str = "CLAWGATE_POLICY_PRESET";

/// Configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("workspace.root must not be empty")]
    EmptyWorkspaceRoot,
    #[error("workspace.root must be an absolute path, got '{0}'")]
    RelativeWorkspaceRoot(String),
    #[error("invalid pattern '{pattern}' in {field}: {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        reason: &'static str,
    },
    #[error("unknown policy preset '{0}' (expected default, sandbox or none)")]
    UnknownPreset(String),
}

// ── Top-level config ──────────────────────────────────────────────

/// Top-level clawgate configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Path the config was loaded from. Computed, never serialized.
    #[serde(skip)]
    #[schemars(skip)]
    pub config_path: PathBuf,

    pub workspace: WorkspaceConfig,
    pub policy: PolicyConfig,
    pub tools: ToolsConfig,
}

// ── Workspace ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace root. `~` is expanded; must be absolute afterwards.
    pub root: String,
    /// Permit dotfiles and dot-directories below the root. Default: `false`.
    pub allow_hidden: bool,
    /// Skip the symlink-escape pass even when `resolve_symlinks` is set.
    pub allow_symlinks: bool,
    /// Canonicalize paths on the real filesystem before allowing them. Default: `false`.
    pub resolve_symlinks: bool,
    /// Allow/deny rules, evaluated deny-first.
    pub rules: Vec<GuardRuleConfig>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: "~/.clawgate/workspace".into(),
            allow_hidden: false,
            allow_symlinks: false,
            resolve_symlinks: false,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GuardRuleConfig {
    /// `exact`, `*suffix` or `prefix*`.
    pub pattern: String,
    pub kind: RuleKind,
    #[serde(default)]
    pub reason: String,
}

// ── Policy ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PolicyPreset {
    /// Allow every tool at the global layer.
    #[default]
    Default,
    /// Default plus sandbox-layer denials for mutating tools.
    Sandbox,
    /// No preset rules at all.
    None,
}

impl FromStr for PolicyPreset {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "sandbox" => Ok(Self::Sandbox),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PolicyConfig {
    pub preset: PolicyPreset,
    /// Extra rules appended after the preset, in file order.
    pub rules: Vec<PolicyRuleConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyRuleConfig {
    pub layer: PolicyLayer,
    /// Exact tool name, `*`, or `prefix*`.
    pub tool: String,
    pub decision: PolicyDecision,
    #[serde(default)]
    pub reason: String,
}

// ── Tools ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ToolsConfig {
    /// Tools registered but disabled at startup.
    pub disabled: Vec<String>,
    /// Tools whose arguments carry filesystem paths.
    pub file_tools: Vec<String>,
    /// Tools whose arguments carry a URL.
    pub network_tools: Vec<String>,
    /// Redact credentials in tool output. Default: `true`.
    pub scrub_output: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            file_tools: DEFAULT_FILE_TOOLS.iter().map(|s| (*s).to_string()).collect(),
            network_tools: DEFAULT_NETWORK_TOOLS.iter().map(|s| (*s).to_string()).collect(),
            scrub_output: true,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────

impl Config {
    /// `<platform config dir>/clawgate/config.toml`, when a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "clawgate").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path).await {
            Ok(contents) => Self::from_toml(&contents)
                .with_context(|| format!("Invalid config at {}", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found; using defaults");
                Self::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var(WORKSPACE_ENV) {
            if !root.trim().is_empty() {
                self.workspace.root = root;
            }
        }

        if let Ok(raw) = std::env::var(POLICY_PRESET_ENV) {
            match raw.parse::<PolicyPreset>() {
                Ok(preset) => self.policy.preset = preset,
                Err(err) => tracing::warn!("ignoring {POLICY_PRESET_ENV}: {err}"),
            }
        }
    }

    /// The workspace root with `~` expanded.
    pub fn workspace_root(&self) -> std::result::Result<String, ConfigError> {
        let raw = self.workspace.root.trim();
        if raw.is_empty() {
            return Err(ConfigError::EmptyWorkspaceRoot);
        }
        let expanded = shellexpand::tilde(raw).into_owned();
        if !Path::new(&expanded).is_absolute() {
            return Err(ConfigError::RelativeWorkspaceRoot(expanded));
        }
        Ok(expanded)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.workspace_root()?;

        for rule in &self.workspace.rules {
            validate_path_pattern(&rule.pattern).map_err(|reason| ConfigError::InvalidPattern {
                field: "workspace.rules",
                pattern: rule.pattern.clone(),
                reason,
            })?;
        }

        for rule in &self.policy.rules {
            validate_tool_pattern(&rule.tool).map_err(|reason| ConfigError::InvalidPattern {
                field: "policy.rules",
                pattern: rule.tool.clone(),
                reason,
            })?;
        }

        Ok(())
    }

    pub fn build_guard(&self) -> std::result::Result<WorkspaceGuard, ConfigError> {
        self.validate()?;
        let mut guard = WorkspaceGuard::new(self.workspace_root()?)
            .with_allow_hidden(self.workspace.allow_hidden)
            .with_allow_symlinks(self.workspace.allow_symlinks);
        for rule in &self.workspace.rules {
            guard.add_rule(rule.pattern.clone(), rule.kind, rule.reason.clone());
        }
        Ok(guard)
    }

    pub fn build_policy(&self) -> std::result::Result<PolicyEngine, ConfigError> {
        self.validate()?;
        let mut engine = match self.policy.preset {
            PolicyPreset::Default => PolicyEngine::default_policy(),
            PolicyPreset::Sandbox => PolicyEngine::sandbox_policy(),
            PolicyPreset::None => PolicyEngine::new(),
        };
        for rule in &self.policy.rules {
            engine.add_rule(
                rule.layer,
                PolicyRule::new(rule.tool.clone(), rule.decision, rule.reason.clone()),
            );
        }
        Ok(engine)
    }
}
