use super::traits::{ToolHandler, ToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    File,
    Exec,
    Web,
    Memory,
    Session,
    Cron,
    Image,
    Message,
    Browser,
    Custom,
}

/// Static description of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub category: ToolCategory,
    /// JSON schema of the tool's parameters, exported as `input_schema`.
    pub parameters_schema: Option<serde_json::Value>,
    pub requires_approval: bool,
    pub sandboxed: bool,
}

impl ToolDef {
    pub fn new(name: impl Into<String>, category: ToolCategory) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category,
            parameters_schema: None,
            requires_approval: false,
            sandboxed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.parameters_schema = Some(schema);
        self
    }

    pub fn with_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    pub fn with_sandboxed(mut self, sandboxed: bool) -> Self {
        self.sandboxed = sandboxed;
        self
    }
}

pub struct ToolEntry {
    pub def: ToolDef,
    handler: Arc<dyn ToolHandler>,
    pub enabled: bool,
}

impl ToolEntry {
    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("def", &self.def)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Function-calling description sent to the LLM provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "is_empty_str")]
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<&'a serde_json::Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_empty_str(s: &&str) -> bool {
    s.is_empty()
}

/// Name-keyed tool dispatch.
///
/// Registration is last-writer-wins. Mutation (`register`, `set_enabled`)
/// happens during setup; lookups and execution only need `&self`.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolEntry>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the tool named `def.name`; it starts enabled.
    pub fn register<H>(&mut self, def: ToolDef, handler: H)
    where
        H: ToolHandler + 'static,
    {
        self.register_shared(def, Arc::new(handler));
    }

    pub fn register_shared(&mut self, def: ToolDef, handler: Arc<dyn ToolHandler>) {
        let name = def.name.clone();
        let previous = self.tools.insert(
            name.clone(),
            ToolEntry {
                def,
                handler,
                enabled: true,
            },
        );
        if previous.is_some() {
            tracing::debug!(tool = %name, "tool re-registered; previous handler replaced");
        } else {
            tracing::debug!(tool = %name, "tool registered");
        }
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.get(name)
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.tools.get(name).is_some_and(|entry| entry.enabled)
    }

    /// Returns `false` when no such tool is registered.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some(entry) = self.tools.get_mut(name) else {
            return false;
        };
        entry.enabled = enabled;
        true
    }

    /// Run a tool by name.
    ///
    /// `None` means the tool is unknown. A disabled tool yields a failed
    /// result and its handler is never invoked.
    pub async fn execute(&self, name: &str, input: &str) -> Option<ToolResult> {
        let entry = self.tools.get(name)?;
        if !entry.enabled {
            tracing::warn!(tool = %name, "refusing to execute disabled tool");
            return Some(ToolResult::failure("tool is disabled"));
        }

        let result = match entry.handler.execute(input).await {
            Ok(result) => result,
            Err(err) => ToolResult::failure(err.to_string()),
        };
        Some(result)
    }

    pub fn list_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn list_by_category(&self, category: ToolCategory) -> Vec<&str> {
        self.tools
            .values()
            .filter(|entry| entry.def.category == category)
            .map(|entry| entry.def.name.as_str())
            .collect()
    }

    /// Specs for every enabled tool, sorted by name.
    pub fn tool_specs(&self) -> Vec<ToolSpec<'_>> {
        let mut specs: Vec<ToolSpec<'_>> = self
            .tools
            .values()
            .filter(|entry| entry.enabled)
            .map(|entry| ToolSpec {
                name: &entry.def.name,
                description: &entry.def.description,
                input_schema: entry.def.parameters_schema.as_ref(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(b.name));
        specs
    }

    /// JSON array of `{name, description?, input_schema?}` for enabled tools.
    pub fn build_tools_json(&self) -> String {
        serde_json::to_string(&self.tool_specs()).unwrap_or_else(|err| {
            tracing::error!("failed to serialize tool specs: {err}");
            String::from("[]")
        })
    }
}

/// Read the optional `timeout_ms` parameter from a tool call.
///
/// Accepted for API compatibility only; nothing in this crate enforces it.
pub fn tool_timeout_ms(input: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(input)
        .ok()?
        .get("timeout_ms")?
        .as_u64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn execute(&self, input: &str) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::ok(input))
        }
    }

    struct Fixed(&'static str);

    #[async_trait]
    impl ToolHandler for Fixed {
        async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
            Ok(ToolResult::ok(self.0))
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl ToolHandler for Counting {
        async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(ToolResult::ok("counted"))
        }
    }

    struct Failing;

    #[async_trait]
    impl ToolHandler for Failing {
        async fn execute(&self, _input: &str) -> anyhow::Result<ToolResult> {
            anyhow::bail!("disk on fire")
        }
    }

    #[tokio::test]
    async fn execute_delegates_to_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("echo", ToolCategory::Custom), Echo);
        let result = registry.execute("echo", r#"{"a":1}"#).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn unknown_tool_is_none() {
        let registry = ToolRegistry::new();
        assert!(registry.execute("missing", "{}").await.is_none());
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn re_registering_replaces_entry() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("tool", ToolCategory::Custom), Fixed("first"));
        registry.register(
            ToolDef::new("tool", ToolCategory::Exec).with_description("second"),
            Fixed("second"),
        );
        assert_eq!(registry.count(), 1);
        let entry = registry.get("tool").unwrap();
        assert_eq!(entry.def.category, ToolCategory::Exec);
        assert_eq!(entry.def.description, "second");
        assert_eq!(registry.execute("tool", "").await.unwrap().output, "second");
    }

    #[tokio::test]
    async fn re_registering_re_enables() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("tool", ToolCategory::Custom), Echo);
        registry.set_enabled("tool", false);
        registry.register(ToolDef::new("tool", ToolCategory::Custom), Echo);
        assert!(registry.is_enabled("tool"));
    }

    #[tokio::test]
    async fn disabled_tool_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolDef::new("counter", ToolCategory::Custom),
            Counting(calls.clone()),
        );

        assert!(registry.set_enabled("counter", false));
        let result = registry.execute("counter", "{}").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("tool is disabled"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert!(registry.set_enabled("counter", true));
        assert!(registry.execute("counter", "{}").await.unwrap().success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_enabled_on_unknown_tool_is_false() {
        let mut registry = ToolRegistry::new();
        assert!(!registry.set_enabled("ghost", true));
    }

    #[tokio::test]
    async fn handler_error_becomes_failed_result() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("fail", ToolCategory::File), Failing);
        let result = registry.execute("fail", "{}").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("disk on fire"));
    }

    #[test]
    fn listing_by_name_and_category() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("read", ToolCategory::File), Echo);
        registry.register(ToolDef::new("write", ToolCategory::File), Echo);
        registry.register(ToolDef::new("bash", ToolCategory::Exec), Echo);

        let mut names = registry.list_names();
        names.sort_unstable();
        assert_eq!(names, vec!["bash", "read", "write"]);

        let mut files = registry.list_by_category(ToolCategory::File);
        files.sort_unstable();
        assert_eq!(files, vec!["read", "write"]);
        assert!(registry.list_by_category(ToolCategory::Web).is_empty());

        assert!(registry.unregister("bash"));
        assert!(!registry.unregister("bash"));
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn tools_json_for_empty_registry_is_empty_array() {
        assert_eq!(ToolRegistry::new().build_tools_json(), "[]");
    }

    #[test]
    fn tools_json_omits_disabled_tools_and_empty_fields() {
        let mut registry = ToolRegistry::new();
        registry.register(
            ToolDef::new("web_fetch", ToolCategory::Web)
                .with_description("Fetch a URL")
                .with_schema(json!({"type": "object", "properties": {"url": {"type": "string"}}})),
            Echo,
        );
        registry.register(ToolDef::new("bare", ToolCategory::Custom), Echo);
        registry.register(ToolDef::new("hidden", ToolCategory::Custom), Echo);
        registry.set_enabled("hidden", false);

        let raw = registry.build_tools_json();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"name": "bare"},
                {
                    "name": "web_fetch",
                    "description": "Fetch a URL",
                    "input_schema": {"type": "object", "properties": {"url": {"type": "string"}}}
                }
            ])
        );
        assert!(raw.starts_with(r#"[{"name":"bare"},{"name":"web_fetch","description":"Fetch a URL","input_schema":"#));
    }

    #[test]
    fn tools_json_is_empty_when_everything_is_disabled() {
        let mut registry = ToolRegistry::new();
        registry.register(ToolDef::new("a", ToolCategory::Custom), Echo);
        registry.set_enabled("a", false);
        assert_eq!(registry.build_tools_json(), "[]");
    }

    #[test]
    fn timeout_ms_is_parsed_when_present() {
        assert_eq!(tool_timeout_ms(r#"{"command":"ls","timeout_ms":5000}"#), Some(5000));
        assert_eq!(tool_timeout_ms(r#"{"command":"ls"}"#), None);
        assert_eq!(tool_timeout_ms(r#"{"timeout_ms":"soon"}"#), None);
        assert_eq!(tool_timeout_ms("not json"), None);
    }
}
