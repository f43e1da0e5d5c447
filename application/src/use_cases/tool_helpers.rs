//! Shared helpers for the session tool loops.

use storytime_domain::core::string::truncate;
use storytime_domain::tool::entities::ToolCall;

/// Extract a short preview string from tool call arguments.
///
/// Looks for well-known keys first, then falls back to the first string
/// value found. Argument maps are unordered, so the fallback is arbitrary
/// when several strings are present.
pub(crate) fn tool_args_preview(call: &ToolCall) -> String {
    let keys = ["segment_title", "title", "query", "report_name", "source"];
    for key in &keys {
        if let Some(serde_json::Value::String(s)) = call.arguments.get(*key) {
            return truncate(s, 50);
        }
    }
    for value in call.arguments.values() {
        if let Some(s) = value.as_str() {
            return truncate(s, 50);
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_title_key_preferred() {
        let call = ToolCall::new("write_segment_text")
            .with_arg("segment_title", "Mainz, 1440")
            .with_arg("text", "Long text that should not be shown");
        assert_eq!(tool_args_preview(&call), "Mainz, 1440");
    }

    #[test]
    fn test_fallback_to_any_string() {
        let call = ToolCall::new("x").with_arg("other", "value");
        assert_eq!(tool_args_preview(&call), "value");
    }

    #[test]
    fn test_long_values_truncated() {
        let call = ToolCall::new("web_search").with_arg("query", "q".repeat(80));
        let preview = tool_args_preview(&call);
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 50);
    }

    #[test]
    fn test_no_string_args() {
        let call = ToolCall::new("calculate_evaluation_metrics").with_arg("total", 3);
        assert_eq!(tool_args_preview(&call), "");
    }
}
