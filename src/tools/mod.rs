//! Tool subsystem for agent-callable capabilities.
//!
//! Each tool is a [`ToolDef`] paired with a [`ToolHandler`] implementation,
//! stored by name in a [`ToolRegistry`]. The registry dispatches calls,
//! honours the enabled flag and exports enabled tools in the
//! function-calling format LLM providers expect.
//!
//! The registry makes no security decisions itself. Callers consult the
//! [`security`](crate::security) checks and [`url_validation`] first, or use
//! [`ToolGate`](crate::gate::ToolGate), which does it in order.

pub mod registry;
pub mod traits;
pub mod url_validation;

pub use registry::{tool_timeout_ms, ToolCategory, ToolDef, ToolEntry, ToolRegistry, ToolSpec};
pub use traits::{ToolHandler, ToolResult};
pub use url_validation::validate_url;

/// Tool names that receive filesystem paths by default.
pub const DEFAULT_FILE_TOOLS: &[&str] = &[
    "read",
    "write",
    "edit",
    "apply_patch",
    "file_read",
    "file_write",
    "file_edit",
    "glob_search",
    "content_search",
];

/// Tool names that receive URLs by default.
pub const DEFAULT_NETWORK_TOOLS: &[&str] = &["web_fetch", "http_request", "browser_open"];
