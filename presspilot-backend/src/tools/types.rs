use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// JSON Schema property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            default: None,
            enum_values: None,
        }
    }

    pub fn integer(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "integer".to_string(),
            description: description.into(),
            default: None,
            enum_values: None,
        }
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "boolean".to_string(),
            description: description.into(),
            default: None,
            enum_values: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Tool input schema using JSON Schema format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: vec![],
        }
    }
}

/// Tool definition that gets serialized into the LLM client's
/// function-calling schema. Immutable after registry construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// The one canonical invocation shape every pipeline stage downstream
/// of the normalizer consumes: a name and a flat parameter map with no
/// wrapper nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl CanonicalRequest {
    pub fn new(name: impl Into<String>) -> Self {
        CanonicalRequest {
            name: name.into(),
            parameters: Map::new(),
        }
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }
}

/// Handler results come in a small number of shapes; keeping them as a
/// tagged variant lets the formatter branch exhaustively instead of
/// sniffing value types.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Table {
        command_type: Option<String>,
        text: String,
    },
    Structured(Value),
}

/// Result of tool execution, wrapped into the wire envelope by the
/// response formatter.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub tool: String,
    pub output: ToolOutput,
    pub error: Option<String>,
}

impl ToolResult {
    pub fn text(tool: impl Into<String>, text: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            tool: tool.into(),
            output: ToolOutput::Text(text.into()),
            error: None,
        }
    }

    pub fn table(tool: impl Into<String>, command_type: Option<String>, text: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            tool: tool.into(),
            output: ToolOutput::Table {
                command_type,
                text: text.into(),
            },
            error: None,
        }
    }

    pub fn structured(tool: impl Into<String>, value: Value) -> Self {
        ToolResult {
            success: true,
            tool: tool.into(),
            output: ToolOutput::Structured(value),
            error: None,
        }
    }

    pub fn failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        let msg = message.into();
        ToolResult {
            success: false,
            tool: tool.into(),
            output: ToolOutput::Text(String::new()),
            error: Some(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_serializes_enum_and_default() {
        let schema = PropertySchema::string("kind")
            .with_enum(&["summary", "all"])
            .with_default(Value::from("summary"));
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "string");
        assert_eq!(json["enum"][0], "summary");
        assert_eq!(json["default"], "summary");
    }

    #[test]
    fn failure_carries_error_not_success() {
        let r = ToolResult::failure("wp_api", "boom");
        assert!(!r.success);
        assert_eq!(r.error.as_deref(), Some("boom"));
    }
}
