//! Metric name sanitization.

/// Convert a free-form logical name into a backend-safe metric name.
///
/// Lowercases, then replaces every character outside `[A-Za-z0-9]` with `_`.
/// A non-empty `prefix` is joined with `_` before sanitizing, so it is
/// normalized the same way as the name. Never fails.
pub fn sanitize(name: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return substitute(name);
    }
    substitute(&format!("{prefix}_{name}"))
}

fn substitute(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
