//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// First line of `s`, truncated. Used for one-line progress and log previews.
pub fn preview(s: &str, max_len: usize) -> String {
    let first = s.lines().next().unwrap_or("");
    let mut out = truncate(first, max_len);
    if first.len() < s.trim_end().len() && !out.ends_with("...") {
        out.push_str(" ...");
    }
    out
}
