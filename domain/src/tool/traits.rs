//! Tool domain traits
//!
//! Pure validation of tool calls against their definitions. Dispatch lives
//! in the application layer.

use super::entities::{ToolCall, ToolDefinition};
use serde_json::Value;

/// Validator for tool calls
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String>;
}

/// Default implementation of ToolValidator
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String> {
        for param in &definition.parameters {
            match call.arguments.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'",
                        param.name, definition.name
                    ));
                }
                Some(value) if !value.is_null() => {
                    if !type_matches(&param.param_type, value) {
                        return Err(format!(
                            "Parameter '{}' for tool '{}' must be of type {}",
                            param.name, definition.name, param.param_type
                        ));
                    }
                    if !param.allowed.is_empty()
                        && !value
                            .as_str()
                            .is_some_and(|s| param.allowed.iter().any(|a| a == s))
                    {
                        return Err(format!(
                            "Parameter '{}' for tool '{}' must be one of: {}",
                            param.name,
                            definition.name,
                            param.allowed.join(", ")
                        ));
                    }
                }
                _ => {}
            }
        }

        for arg_name in call.arguments.keys() {
            if !definition.parameters.iter().any(|p| &p.name == arg_name) {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, definition.name
                ));
            }
        }

        Ok(())
    }
}

/// Numbers may arrive as numeric strings; the typed getters on
/// [`ToolCall`] accept both.
fn type_matches(param_type: &str, value: &Value) -> bool {
    let numeric_string = || {
        value
            .as_str()
            .is_some_and(|s| s.trim().parse::<f64>().is_ok())
    };
    match param_type {
        "number" => value.is_number() || numeric_string(),
        "integer" => value.is_i64() || value.is_u64() || numeric_string(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array() || value.is_string(),
        _ => value.is_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::ToolParameter;

    fn definition() -> ToolDefinition {
        ToolDefinition::new("test", "test tool")
            .with_parameter(ToolParameter::new("required_param", "A required param", true))
            .with_parameter(
                ToolParameter::new("count", "A number", false).with_type("integer"),
            )
            .with_parameter(
                ToolParameter::new("size", "Image size", false)
                    .with_allowed(["1024x1024", "1792x1024"]),
            )
    }

    #[test]
    fn test_validator_missing_required() {
        let result = DefaultToolValidator.validate(&ToolCall::new("test"), &definition());
        assert!(result.unwrap_err().contains("Missing required parameter"));

        let call = ToolCall::new("test").with_arg("required_param", Value::Null);
        assert!(DefaultToolValidator.validate(&call, &definition()).is_err());
    }

    #[test]
    fn test_validator_unknown_param() {
        let call = ToolCall::new("test")
            .with_arg("required_param", "x")
            .with_arg("unknown_param", "value");
        let result = DefaultToolValidator.validate(&call, &definition());
        assert!(result.unwrap_err().contains("Unknown parameter"));
    }

    #[test]
    fn test_validator_type_mismatch() {
        let call = ToolCall::new("test")
            .with_arg("required_param", "x")
            .with_arg("count", true);
        let result = DefaultToolValidator.validate(&call, &definition());
        assert!(result.unwrap_err().contains("must be of type integer"));

        let call = ToolCall::new("test")
            .with_arg("required_param", "x")
            .with_arg("count", "12");
        assert!(DefaultToolValidator.validate(&call, &definition()).is_ok());
    }

    #[test]
    fn test_validator_allowed_values() {
        let call = ToolCall::new("test")
            .with_arg("required_param", "x")
            .with_arg("size", "10x10");
        let result = DefaultToolValidator.validate(&call, &definition());
        assert!(result.unwrap_err().contains("must be one of"));
    }

    #[test]
    fn test_validator_valid_call() {
        let call = ToolCall::new("test")
            .with_arg("required_param", "value1")
            .with_arg("count", 3)
            .with_arg("size", "1024x1024");
        assert!(DefaultToolValidator.validate(&call, &definition()).is_ok());
    }
}
