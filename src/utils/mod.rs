//! Utility modules for common functionality.
//!
//! Logging setup and small helpers shared by the shell, the wizard and the
//! AI call sites.

pub mod logger;

use std::path::PathBuf;

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

/// Remove one layer of matching quotes around a token.
pub fn strip_quotes(token: &str) -> &str {
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

/// Truncate text to at most `max_bytes`, keeping the tail.
/// Preserves UTF-8 boundaries and adds a marker if truncated.
pub fn truncate_tail(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }

    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }

    format!("...[truncated]\n{}", &text[start..])
}
