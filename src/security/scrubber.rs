//! Credential redaction for text that is about to be logged or echoed back
//! to the model.
//!
//! The scan is a single left-to-right pass over a fixed prefix table. When a
//! prefix matches, the whole token (up to the next delimiter) is replaced by
//! [`REDACTION_MARKER`].

use std::borrow::Cow;

/// Token prefixes treated as secrets, checked in this order at every offset.
pub const SENSITIVE_PREFIXES: &[&str] = &[
    "sk-ant-", // Anthropic
    "sk-",     // OpenAI-style
    "gsk_",    // Groq
    "Bearer ",
    "ghp_",  // GitHub
    "xoxb-", // Slack bot
    "xoxp-", // Slack user
    "AKIA",  // AWS access key id
    "glpat-", // GitLab
    "npm_",
];

pub const REDACTION_MARKER: &str = "[REDACTED]";

fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\n' | b'\r' | b'\t' | b',' | b'"' | b'\'' | b'}' | b']'
    )
}

fn prefix_at(bytes: &[u8], offset: usize) -> Option<&'static str> {
    let rest = &bytes[offset..];
    SENSITIVE_PREFIXES
        .iter()
        .copied()
        .find(|prefix| rest.starts_with(prefix.as_bytes()))
}

/// Cheap pre-check: does `text` contain any known secret prefix?
pub fn contains_sensitive(text: &str) -> bool {
    SENSITIVE_PREFIXES.iter().any(|prefix| text.contains(prefix))
}

/// Replace every secret-looking token in `text` with [`REDACTION_MARKER`].
///
/// Clean input is returned borrowed, without allocating.
pub fn scrub(text: &str) -> Cow<'_, str> {
    if !contains_sensitive(text) {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut i = 0;

    while i < bytes.len() {
        let Some(prefix) = prefix_at(bytes, i) else {
            i += 1;
            continue;
        };
        // Prefixes start with ASCII and delimiters are ASCII, so both ends
        // of the token sit on char boundaries.
        out.push_str(&text[copied_to..i]);
        out.push_str(REDACTION_MARKER);
        let mut end = i + prefix.len();
        while end < bytes.len() && !is_delimiter(bytes[end]) {
            end += 1;
        }
        i = end;
        copied_to = end;
    }

    out.push_str(&text[copied_to..]);
    Cow::Owned(out)
}

/// Stateless handle over [`scrub`] and [`contains_sensitive`], for callers
/// that inject the scrubber as a collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialScrubber;

impl CredentialScrubber {
    pub fn new() -> Self {
        Self
    }

    pub fn scrub<'a>(&self, text: &'a str) -> Cow<'a, str> {
        scrub(text)
    }

    pub fn contains_sensitive(&self, text: &str) -> bool {
        contains_sensitive(text)
    }
}
