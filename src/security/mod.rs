//! Security subsystem deciding whether a proposed tool call may proceed.
//!
//! [`PolicyEngine`] layers allow/deny/ask rules per tool name, with deny
//! always winning. [`WorkspaceGuard`] confines filesystem paths to a
//! workspace root through a fixed sequence of lexical checks, with an opt-in
//! symlink-aware pass. [`CredentialScrubber`] redacts secret-looking tokens
//! before text is logged or returned to the model.
//!
//! Network destinations are classified by
//! [`tools::url_validation`](crate::tools::url_validation).
//!
//! Every check here returns a classification value; none of them panic or
//! return errors, so a failing check can never fail open.

pub mod path;
pub mod pattern;
pub mod policy;
pub mod scrubber;
pub mod workspace_guard;

pub use path::normalize_path;
pub use policy::{PolicyDecision, PolicyEngine, PolicyLayer, PolicyRule};
pub use scrubber::{contains_sensitive, scrub, CredentialScrubber, REDACTION_MARKER};
pub use workspace_guard::{Decision, GuardRule, RuleKind, WorkspaceGuard};
