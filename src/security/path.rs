//! Lexical path primitives used by [`WorkspaceGuard`](super::WorkspaceGuard).
//!
//! Everything here operates on path *strings*. Nothing touches the
//! filesystem, resolves symlinks or consults the current directory, so the
//! results are deterministic for a given input.

use std::borrow::Cow;

/// True when the raw path contains a NUL byte anywhere.
pub fn has_null_byte(path: &str) -> bool {
    path.as_bytes().contains(&0)
}

/// True when `..` appears as a whole path component.
///
/// A component is bounded by `/` or the start/end of the string on both
/// sides, so `foo..bar` and `..hidden` are not traversal.
pub fn has_traversal(path: &str) -> bool {
    path.split('/').any(|component| component == "..")
}

fn is_normalized(path: &str) -> bool {
    if path == "/" || path == "." {
        return true;
    }
    let body = path.strip_prefix('/').unwrap_or(path);
    body.split('/').all(|c| !c.is_empty() && c != ".")
}

/// Lexically normalize a path.
///
/// Collapses repeated separators, drops `.` segments and the trailing `/`.
/// `..` segments are kept verbatim; callers reject them with
/// [`has_traversal`] before normalizing. Returns the input unchanged (and
/// unallocated) when it is already normal.
///
/// Normalization is idempotent: `normalize_path(&normalize_path(p)) == normalize_path(p)`.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }

    let absolute = path.starts_with('/');
    let mut out = String::with_capacity(path.len());
    if absolute {
        out.push('/');
    }
    for component in path.split('/').filter(|c| !c.is_empty() && *c != ".") {
        if out.len() > usize::from(absolute) {
            out.push('/');
        }
        out.push_str(component);
    }
    if out.is_empty() {
        out.push('.');
    }
    Cow::Owned(out)
}

/// The part of `path` below `root`, without the joining `/`.
///
/// Returns `None` when `path` is not `root` itself or a descendant of it.
/// Matching is component-aware: `/workspace-other` is not inside `/workspace`.
pub fn relative_to_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root == "/" {
        return path.strip_prefix('/');
    }
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

/// True when `path` equals `root` or lies beneath it.
pub fn is_within_root(path: &str, root: &str) -> bool {
    relative_to_root(path, root).is_some()
}

/// True when any component of `path` strictly below `root` is a dotfile.
///
/// The bare `.` and `..` components are ignored here; traversal is rejected
/// separately and normalization removes `.`.
pub fn has_hidden_component(path: &str, root: &str) -> bool {
    let Some(rest) = relative_to_root(path, root) else {
        return false;
    };
    rest.split('/')
        .any(|c| c.starts_with('.') && c != "." && c != "..")
}
