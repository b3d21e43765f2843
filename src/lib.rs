#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::needless_raw_string_hashes,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

pub mod config;
pub mod gate;
pub mod security;
pub mod tools;

pub use config::{Config, ConfigError};
pub use gate::{GateOutcome, ToolCall, ToolGate};
pub use security::{Decision, PolicyDecision, PolicyEngine, PolicyLayer, PolicyRule, WorkspaceGuard};
pub use tools::{ToolDef, ToolHandler, ToolRegistry, ToolResult};
