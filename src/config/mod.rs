pub mod schema;

pub use schema::{
    Config, ConfigError, GuardRuleConfig, PolicyConfig, PolicyPreset, PolicyRuleConfig,
    ToolsConfig, WorkspaceConfig, POLICY_PRESET_ENV, WORKSPACE_ENV,
};
