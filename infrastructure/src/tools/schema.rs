//! JSON Schema tool converter.
//!
//! Default implementation of [`ToolSchemaPort`] that produces provider-neutral
//! JSON Schema for the native tool-use API. Provider adapters wrap it in
//! their own envelope (see `providers::openai`).

use storytime_application::ports::tool_schema::ToolSchemaPort;
use storytime_domain::tool::entities::ToolDefinition;

/// Default implementation producing provider-neutral JSON Schema.
///
/// Handles param_type → JSON Schema type mapping:
/// - `"number"`, `"integer"`, `"boolean"` map to themselves
/// - `"array"` → `"array"` of strings
/// - anything else → `"string"`
///
/// Parameters with allowed values get an `enum`.
pub struct JsonSchemaToolConverter;

impl ToolSchemaPort for JsonSchemaToolConverter {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &tool.parameters {
            let schema_type = match param.param_type.as_str() {
                "number" => "number",
                "integer" => "integer",
                "boolean" => "boolean",
                "array" => "array",
                _ => "string",
            };

            let mut prop = serde_json::Map::new();
            prop.insert("type".to_string(), serde_json::json!(schema_type));
            prop.insert(
                "description".to_string(),
                serde_json::json!(param.description),
            );
            if schema_type == "array" {
                prop.insert("items".to_string(), serde_json::json!({"type": "string"}));
            }
            if !param.allowed.is_empty() {
                prop.insert("enum".to_string(), serde_json::json!(param.allowed));
            }
            properties.insert(param.name.clone(), serde_json::Value::Object(prop));

            if param.required {
                required.push(serde_json::json!(param.name));
            }
        }

        serde_json::json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storytime_domain::tool::entities::{ToolParameter, ToolSpec};

    #[test]
    fn test_tool_to_schema() {
        let converter = JsonSchemaToolConverter;
        let tool = ToolDefinition::new("generate_and_add_image", "Illustrate a segment")
            .with_parameter(ToolParameter::new("segment_title", "Segment", true))
            .with_parameter(
                ToolParameter::new("size", "Image size", false)
                    .with_allowed(["1024x1024", "1792x1024"]),
            )
            .with_parameter(ToolParameter::new("replace", "Replace", false).with_type("boolean"));

        let schema = converter.tool_to_schema(&tool);

        assert_eq!(schema["name"], "generate_and_add_image");
        assert_eq!(schema["input_schema"]["type"], "object");

        let props = &schema["input_schema"]["properties"];
        assert_eq!(props["segment_title"]["type"], "string");
        assert_eq!(props["size"]["enum"][1], "1792x1024");
        assert_eq!(props["replace"]["type"], "boolean");
        assert!(props["replace"].get("enum").is_none());

        let required = schema["input_schema"]["required"].as_array().unwrap();
        assert_eq!(required, &vec![serde_json::json!("segment_title")]);
    }

    #[test]
    fn test_array_parameters_have_items() {
        let tool = ToolDefinition::new("t", "d")
            .with_parameter(ToolParameter::new("urls", "URLs", true).with_type("array"));
        let schema = JsonSchemaToolConverter.tool_to_schema(&tool);
        assert_eq!(
            schema["input_schema"]["properties"]["urls"]["items"]["type"],
            "string"
        );
    }

    #[test]
    fn test_all_tools_schema_keeps_registration_order() {
        let spec = ToolSpec::new()
            .register(ToolDefinition::new("set_story_title", "Title"))
            .register(ToolDefinition::new("add_story_segment", "Segment"));

        let tools = JsonSchemaToolConverter.all_tools_schema(&spec);
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "set_story_title");
        assert_eq!(tools[1]["name"], "add_story_segment");
    }
}
