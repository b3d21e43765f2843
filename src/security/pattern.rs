//! Single-wildcard glob matching shared by the guard and the policy engine.
//!
//! Patterns support at most one `*`, placed at the start or the end. There is
//! no mid-string wildcard, no `?`, no character class and no recursive `**`.

/// Match a workspace rule pattern against a normalized path.
///
/// `*suffix` matches by suffix, `prefix*` matches by prefix, anything else
/// must be equal. A leading `*` takes precedence, so `*` alone matches
/// everything.
pub fn matches_path_pattern(pattern: &str, candidate: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix('*') {
        return candidate.ends_with(suffix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return candidate.starts_with(prefix);
    }
    pattern == candidate
}

/// Match a policy tool pattern against a tool name.
///
/// `*` matches every tool, `prefix*` matches by prefix, anything else must be
/// equal. Leading wildcards are not supported for tool names.
pub fn matches_tool_pattern(pattern: &str, tool_name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return tool_name.starts_with(prefix);
    }
    pattern == tool_name
}

/// Reject workspace patterns the matcher cannot express.
pub fn validate_path_pattern(pattern: &str) -> Result<(), &'static str> {
    if pattern.is_empty() {
        return Err("pattern is empty");
    }
    match pattern.matches('*').count() {
        0 => Ok(()),
        1 if pattern.starts_with('*') || pattern.ends_with('*') => Ok(()),
        1 => Err("wildcard must be leading or trailing"),
        _ => Err("only a single wildcard is supported"),
    }
}

/// Reject tool patterns the matcher cannot express.
pub fn validate_tool_pattern(pattern: &str) -> Result<(), &'static str> {
    if pattern.is_empty() {
        return Err("pattern is empty");
    }
    match pattern.matches('*').count() {
        0 => Ok(()),
        1 if pattern.ends_with('*') => Ok(()),
        1 => Err("tool patterns only support a trailing wildcard"),
        _ => Err("only a single wildcard is supported"),
    }
}
