use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a tool execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Capability behind a registered tool name.
///
/// Handlers receive the raw serialized parameters (JSON) and are responsible
/// for parsing them. They may block on process, disk or network I/O; the
/// registry imposes no timeout. Returning `Err` is reported to the caller
/// as a failed [`ToolResult`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn execute(&self, input: &str) -> anyhow::Result<ToolResult>;
}
