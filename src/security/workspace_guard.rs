use super::path::{
    has_hidden_component, has_null_byte, has_traversal, is_within_root, normalize_path,
};
use super::pattern::matches_path_pattern;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a workspace containment check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    DeniedTraversal,
    DeniedOutsideWorkspace,
    /// Only produced by [`WorkspaceGuard::check_resolved`].
    DeniedSymlinkEscape,
    DeniedByRule,
    DeniedNullByte,
    DeniedHidden,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allowed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::DeniedTraversal => "denied_traversal",
            Self::DeniedOutsideWorkspace => "denied_outside_workspace",
            Self::DeniedSymlinkEscape => "denied_symlink_escape",
            Self::DeniedByRule => "denied_by_rule",
            Self::DeniedNullByte => "denied_null_byte",
            Self::DeniedHidden => "denied_hidden",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Allow,
    Deny,
}

/// A single allow/deny pattern owned by a [`WorkspaceGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardRule {
    pub pattern: String,
    pub kind: RuleKind,
    pub reason: String,
}

/// Filesystem containment for one workspace root.
///
/// Built once per session, then shared read-only. [`check`](Self::check) is a
/// purely lexical evaluation in a fixed order:
///
/// 1. NUL byte in the raw path
/// 2. `..` component in the raw path
/// 3. normalization (`//`, `/./`, trailing `/`)
/// 4. containment under the root
/// 5. dotfiles below the root, unless `allow_hidden`
/// 6. deny rules
/// 7. allow rules, when any exist
///
/// Steps 1 and 2 run on the raw string so that normalization cannot launder
/// a traversal or truncate at a NUL.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    workspace_root: String,
    rules: Vec<GuardRule>,
    allow_hidden: bool,
    allow_symlinks: bool,
}

#[derive(Serialize)]
struct GuardSnapshot<'a> {
    workspace_root: &'a str,
    allow_hidden: bool,
    allow_symlinks: bool,
    rules: Vec<RuleSnapshot<'a>>,
}

#[derive(Serialize)]
struct RuleSnapshot<'a> {
    pattern: &'a str,
    kind: RuleKind,
}

impl WorkspaceGuard {
    pub fn new(workspace_root: impl Into<String>) -> Self {
        let root = workspace_root.into();
        let workspace_root = normalize_path(&root).into_owned();
        Self {
            workspace_root,
            rules: Vec::new(),
            allow_hidden: false,
            allow_symlinks: false,
        }
    }

    pub fn with_allow_hidden(mut self, allow_hidden: bool) -> Self {
        self.allow_hidden = allow_hidden;
        self
    }

    pub fn with_allow_symlinks(mut self, allow_symlinks: bool) -> Self {
        self.allow_symlinks = allow_symlinks;
        self
    }

    pub fn workspace_root(&self) -> &str {
        &self.workspace_root
    }

    pub fn allow_hidden(&self) -> bool {
        self.allow_hidden
    }

    pub fn allow_symlinks(&self) -> bool {
        self.allow_symlinks
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> &[GuardRule] {
        &self.rules
    }

    pub fn add_rule(&mut self, pattern: impl Into<String>, kind: RuleKind, reason: impl Into<String>) {
        self.rules.push(GuardRule {
            pattern: pattern.into(),
            kind,
            reason: reason.into(),
        });
    }

    pub fn add_allow_pattern(&mut self, pattern: impl Into<String>) {
        self.add_rule(pattern, RuleKind::Allow, String::new());
    }

    pub fn add_deny_pattern(&mut self, pattern: impl Into<String>) {
        self.add_rule(pattern, RuleKind::Deny, String::new());
    }

    fn rules_of(&self, kind: RuleKind) -> impl Iterator<Item = &GuardRule> {
        self.rules.iter().filter(move |rule| rule.kind == kind)
    }

    pub fn check(&self, path: &str) -> Decision {
        if has_null_byte(path) {
            return Decision::DeniedNullByte;
        }
        if has_traversal(path) {
            return Decision::DeniedTraversal;
        }

        let normalized = normalize_path(path);
        let root = self.workspace_root.as_str();

        if !is_within_root(&normalized, root) {
            return Decision::DeniedOutsideWorkspace;
        }

        if !self.allow_hidden && has_hidden_component(&normalized, root) {
            return Decision::DeniedHidden;
        }

        if self
            .rules_of(RuleKind::Deny)
            .any(|rule| matches_path_pattern(&rule.pattern, &normalized))
        {
            return Decision::DeniedByRule;
        }

        let mut allow_rules = self.rules_of(RuleKind::Allow).peekable();
        if allow_rules.peek().is_some()
            && !allow_rules.any(|rule| matches_path_pattern(&rule.pattern, &normalized))
        {
            return Decision::DeniedByRule;
        }

        Decision::Allowed
    }

    /// First non-allowed decision across `paths`, or `Allowed` when all pass.
    pub fn check_all<I, S>(&self, paths: I) -> Decision
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .map(|path| self.check(path.as_ref()))
            .find(|decision| !decision.is_allowed())
            .unwrap_or(Decision::Allowed)
    }

    /// Evaluate every path independently, reporting each decision.
    pub fn check_batch<'p, S: AsRef<str>>(&self, paths: &'p [S]) -> Vec<(&'p str, Decision)> {
        paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                (path, self.check(path))
            })
            .collect()
    }

    /// Reason of the first deny rule (in insertion order) matching `path`.
    pub fn deny_reason(&self, path: &str) -> Option<&str> {
        let normalized = normalize_path(path);
        self.rules_of(RuleKind::Deny)
            .find(|rule| matches_path_pattern(&rule.pattern, &normalized))
            .map(|rule| rule.reason.as_str())
            .filter(|reason| !reason.is_empty())
    }

    /// Lexical [`check`](Self::check) followed by a filesystem-aware symlink pass.
    ///
    /// The path (or its deepest existing ancestor) and the workspace root are
    /// canonicalized; a canonical path outside the canonical root yields
    /// [`Decision::DeniedSymlinkEscape`]. Any I/O error other than "not
    /// found" also yields `DeniedSymlinkEscape`. Skipped when
    /// `allow_symlinks` is set.
    pub fn check_resolved(&self, path: &str) -> Decision {
        let lexical = self.check(path);
        if !lexical.is_allowed() || self.allow_symlinks {
            return lexical;
        }

        let canonical_root = match Path::new(&self.workspace_root).canonicalize() {
            Ok(root) => root,
            Err(err) => {
                tracing::debug!(root = %self.workspace_root, "cannot canonicalize workspace root: {err}");
                return Decision::DeniedSymlinkEscape;
            }
        };

        let normalized = normalize_path(path);
        match resolve_existing_prefix(Path::new(normalized.as_ref())) {
            Ok(resolved) if resolved.starts_with(&canonical_root) => Decision::Allowed,
            Ok(resolved) => {
                tracing::debug!(
                    path,
                    resolved = %resolved.display(),
                    "resolved path escapes workspace"
                );
                Decision::DeniedSymlinkEscape
            }
            Err(err) => {
                tracing::debug!(path, "cannot resolve path: {err}");
                Decision::DeniedSymlinkEscape
            }
        }
    }

    /// JSON description of the root, flags and rules (reasons omitted).
    pub fn serialize(&self) -> String {
        let snapshot = GuardSnapshot {
            workspace_root: &self.workspace_root,
            allow_hidden: self.allow_hidden,
            allow_symlinks: self.allow_symlinks,
            rules: self
                .rules
                .iter()
                .map(|rule| RuleSnapshot {
                    pattern: &rule.pattern,
                    kind: rule.kind,
                })
                .collect(),
        };
        serde_json::to_string(&snapshot).unwrap_or_else(|err| {
            tracing::error!("failed to serialize workspace guard: {err}");
            String::from("{}")
        })
    }
}

const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// missing tail, so paths that are about to be created can still be checked.
///
/// A dangling symlink along the way is followed to its target, since a write
/// through it lands wherever the target points.
fn resolve_existing_prefix(path: &Path) -> io::Result<PathBuf> {
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    let mut hops = 0;
    loop {
        match current.canonicalize() {
            Ok(mut resolved) => {
                for component in missing.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let is_dangling_link = fs::symlink_metadata(&current)
                    .is_ok_and(|meta| meta.file_type().is_symlink());
                if is_dangling_link {
                    hops += 1;
                    if hops > MAX_SYMLINK_HOPS {
                        return Err(io::Error::other("too many levels of symbolic links"));
                    }
                    let target = fs::read_link(&current)?;
                    current = match current.parent() {
                        Some(parent) => parent.join(target),
                        None => target,
                    };
                    continue;
                }

                let (Some(parent), Some(name)) = (current.parent(), current.file_name()) else {
                    return Err(err);
                };
                missing.push(name.to_os_string());
                current = parent.to_path_buf();
            }
            Err(err) => return Err(err),
        }
    }
}
