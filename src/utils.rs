use std::path::PathBuf;

/// Filler used in place of characters that are unsafe in a storage key.
pub const KEY_FILLER: char = '_';

/// Maps an arbitrary identifier to a filename-safe key.
///
/// Every character outside `[A-Za-z0-9]` becomes [`KEY_FILLER`], so distinct
/// identifiers that differ only in punctuation map to the same key
/// (`%1.2` and `%1_2` both become `_1_2`).
pub fn sanitize_key(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { KEY_FILLER })
        .collect()
}

/// Truncates a string to max_chars characters, appending "..." if truncated.
/// Safe for UTF-8 multi-byte characters.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncate_at = max_chars.saturating_sub(3);
        let byte_index = s
            .char_indices()
            .nth(truncate_at)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        format!("{}...", &s[..byte_index])
    }
}

/// Expands a leading `~` against the current user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(home) => home,
        None => return PathBuf::from(path),
    };

    if path == "~" {
        home
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

pub fn shell_single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
