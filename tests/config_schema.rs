//! Config Schema Boundary Tests
//!
//! Validates: config defaults, unknown/invalid input handling, env overrides,
//! and the construction of guards and policy engines from TOML.

use clawgate::config::{Config, ConfigError, PolicyPreset, POLICY_PRESET_ENV, WORKSPACE_ENV};
use clawgate::security::{Decision, PolicyDecision};

// ─────────────────────────────────────────────────────────────────────────────
// Parsing boundaries
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn config_empty_file_yields_defaults() {
    let parsed: Config = toml::from_str("").expect("empty config should parse");
    assert_eq!(parsed.policy.preset, PolicyPreset::Default);
    assert!(parsed.workspace.rules.is_empty());
    assert!(parsed.tools.scrub_output);
}

#[test]
fn config_unknown_keys_parse_without_error() {
    let toml_str = r#"
totally_unknown_key = "should be ignored"

[workspace]
root = "/srv/ws"
another_fake = 42
"#;
    let parsed: Config = toml::from_str(toml_str).expect("unknown keys should be ignored");
    assert_eq!(parsed.workspace.root, "/srv/ws");
}

#[test]
fn config_wrong_type_for_allow_hidden_fails() {
    let toml_str = r#"
[workspace]
allow_hidden = "yes"
"#;
    let result: Result<Config, _> = toml::from_str(toml_str);
    assert!(result.is_err(), "string for bool should fail to parse");
}

#[test]
fn config_unknown_rule_kind_fails() {
    let toml_str = r#"
[[workspace.rules]]
pattern = "*.pem"
kind = "maybe"
"#;
    let result: Result<Config, _> = toml::from_str(toml_str);
    assert!(result.is_err(), "rule kind must be allow or deny");
}

#[test]
fn config_unknown_layer_fails() {
    let toml_str = r#"
[[policy.rules]]
layer = "tenant"
tool = "bash"
decision = "deny"
"#;
    let result: Result<Config, _> = toml::from_str(toml_str);
    assert!(result.is_err(), "layer must be one of the five known layers");
}

#[test]
fn config_uppercase_decision_fails() {
    let toml_str = r#"
[[policy.rules]]
layer = "global"
tool = "bash"
decision = "DENY"
"#;
    let result: Result<Config, _> = toml::from_str(toml_str);
    assert!(result.is_err(), "decisions are lowercase");
}

#[test]
fn config_rule_reason_is_optional() {
    let toml_str = r#"
[[policy.rules]]
layer = "sandbox"
tool = "exec"
decision = "deny"
"#;
    let parsed: Config = toml::from_str(toml_str).unwrap();
    assert!(parsed.policy.rules[0].reason.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn config_relative_root_fails_validation() {
    let parsed = Config::from_toml("[workspace]\nroot = \"ws\"\n").unwrap();
    assert!(matches!(
        parsed.validate(),
        Err(ConfigError::RelativeWorkspaceRoot(_))
    ));
}

#[test]
fn config_middle_wildcard_fails_validation() {
    let parsed = Config::from_toml(
        r#"
[workspace]
root = "/ws"

[[workspace.rules]]
pattern = "/ws/*/secrets"
kind = "deny"
"#,
    )
    .unwrap();
    let err = parsed.validate().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    assert!(err.to_string().contains("/ws/*/secrets"));
}

#[test]
fn config_empty_tool_pattern_fails_validation() {
    let parsed = Config::from_toml(
        r#"
[workspace]
root = "/ws"

[[policy.rules]]
layer = "global"
tool = ""
decision = "allow"
"#,
    )
    .unwrap();
    assert!(parsed.build_policy().is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Built components
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn config_guard_honours_trailing_slash_root_and_rules() {
    let parsed = Config::from_toml(
        r#"
[workspace]
root = "/srv/agent/"

[[workspace.rules]]
pattern = "/srv/agent/public*"
kind = "allow"
"#,
    )
    .unwrap();
    let guard = parsed.build_guard().unwrap();
    assert_eq!(guard.workspace_root(), "/srv/agent");
    assert_eq!(guard.check("/srv/agent/public/index.html"), Decision::Allowed);
    assert_eq!(guard.check("/srv/agent/private/x"), Decision::DeniedByRule);
    assert_eq!(guard.check("/srv/agent-evil/x"), Decision::DeniedOutsideWorkspace);
}

#[test]
fn config_later_rule_at_same_layer_wins() {
    let parsed = Config::from_toml(
        r#"
[workspace]
root = "/ws"

[policy]
preset = "none"

[[policy.rules]]
layer = "agent"
tool = "browser*"
decision = "ask"

[[policy.rules]]
layer = "agent"
tool = "browser_open"
decision = "allow"
"#,
    )
    .unwrap();
    let policy = parsed.build_policy().unwrap();
    assert_eq!(policy.evaluate("browser_open"), PolicyDecision::Allow);
    assert_eq!(policy.evaluate("browser_click"), PolicyDecision::Ask);
    assert_eq!(policy.evaluate("read"), PolicyDecision::Allow);
}

#[test]
fn config_low_layer_deny_beats_sandbox_allow() {
    let parsed = Config::from_toml(
        r#"
[workspace]
root = "/ws"

[[policy.rules]]
layer = "global"
tool = "exec"
decision = "deny"
reason = "no shells"

[[policy.rules]]
layer = "sandbox"
tool = "exec"
decision = "allow"
"#,
    )
    .unwrap();
    let policy = parsed.build_policy().unwrap();
    assert_eq!(policy.evaluate("exec"), PolicyDecision::Deny);
    assert_eq!(policy.get_deny_reason("exec"), Some("no shells"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Environment overrides
// ─────────────────────────────────────────────────────────────────────────────

// The only test in this binary touching these variables.
#[test]
fn config_env_overrides_apply_and_bad_preset_is_ignored() {
    std::env::set_var(WORKSPACE_ENV, "/from/env");
    std::env::set_var(POLICY_PRESET_ENV, "SANDBOX");
    let mut config = Config::default();
    config.apply_env_overrides();
    assert_eq!(config.workspace.root, "/from/env");
    assert_eq!(config.policy.preset, PolicyPreset::Sandbox);

    std::env::set_var(POLICY_PRESET_ENV, "paranoid");
    config.apply_env_overrides();
    assert_eq!(config.policy.preset, PolicyPreset::Sandbox);

    std::env::remove_var(WORKSPACE_ENV);
    std::env::remove_var(POLICY_PRESET_ENV);
}

#[test]
fn config_json_schema_names_sections() {
    let schema = schemars::schema_for!(Config);
    let json = serde_json::to_value(&schema).unwrap();
    let properties = json["properties"].as_object().expect("object schema");
    for section in ["workspace", "policy", "tools"] {
        assert!(properties.contains_key(section), "missing {section}");
    }
    assert!(!properties.contains_key("config_path"));
}
