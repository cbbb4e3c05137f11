use crate::tools::types::{ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition for the LLM client's schema
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with already-normalized parameters
    async fn execute(&self, params: &Map<String, Value>) -> ToolResult;

    /// Returns the tool's name
    fn name(&self) -> String {
        self.definition().name
    }
}

/// Registry that holds all available tools. Built once at startup;
/// `register` is the only mutation hook and is not used after the
/// registry has been shared.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. A later registration under the same name
    /// replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool definitions for serializing into the client's
    /// function-calling schema, in stable name order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name. Parameter binding happens here so no
    /// handler ever sees a request missing a declared parameter:
    /// schema defaults are filled in, then required fields checked.
    pub async fn execute(&self, name: &str, params: &Map<String, Value>) -> ToolResult {
        let tool = match self.get(name) {
            Some(t) => t,
            None => return ToolResult::failure(name, format!("tool '{}' not found", name)),
        };
        let definition = tool.definition();

        let mut bound = params.clone();
        for (key, schema) in &definition.input_schema.properties {
            if let Some(default) = &schema.default {
                bound.entry(key.clone()).or_insert_with(|| default.clone());
            }
        }

        if let Some(missing) = missing_required(&definition, &bound) {
            return ToolResult::failure(
                name,
                format!("missing required parameter: {}", missing),
            );
        }

        tool.execute(&bound).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts a plain closure into a registrable tool, for capabilities
/// defined outside the builtin set.
pub struct CallbackTool {
    definition: ToolDefinition,
    handler: Box<dyn Fn(&Map<String, Value>) -> ToolResult + Send + Sync>,
}

impl CallbackTool {
    pub fn new(
        definition: ToolDefinition,
        handler: impl Fn(&Map<String, Value>) -> ToolResult + Send + Sync + 'static,
    ) -> Self {
        CallbackTool {
            definition,
            handler: Box::new(handler),
        }
    }
}

#[async_trait]
impl Tool for CallbackTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: &Map<String, Value>) -> ToolResult {
        (self.handler)(params)
    }
}

/// First declared-required parameter that is absent, null, or blank.
fn missing_required(definition: &ToolDefinition, params: &Map<String, Value>) -> Option<String> {
    definition
        .input_schema
        .required
        .iter()
        .find(|key| match params.get(key.as_str()) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            _ => false,
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{PropertySchema, ToolInputSchema};

    struct MockTool {
        definition: ToolDefinition,
    }

    impl MockTool {
        fn new(name: &str, required: &[&str]) -> Self {
            let mut schema = ToolInputSchema::default();
            for key in required {
                schema
                    .properties
                    .insert(key.to_string(), PropertySchema::string("required field"));
                schema.required.push(key.to_string());
            }
            MockTool {
                definition: ToolDefinition {
                    name: name.to_string(),
                    description: format!("Mock {} tool", name),
                    input_schema: schema,
                },
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn definition(&self) -> ToolDefinition {
            self.definition.clone()
        }

        async fn execute(&self, _params: &Map<String, Value>) -> ToolResult {
            ToolResult::text(self.definition.name.clone(), "mock result")
        }
    }

    #[tokio::test]
    async fn register_and_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("test_tool", &[])));

        assert!(registry.has_tool("test_tool"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.len(), 1);

        let result = registry.execute("test_tool", &Map::new()).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn unknown_tool_is_a_structured_failure() {
        let registry = ToolRegistry::new();
        let result = registry.execute("ghost", &Map::new()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn missing_required_parameter_names_the_parameter() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("needs_type", &["type"])));

        let result = registry.execute("needs_type", &Map::new()).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("missing required parameter: type")
        );

        let mut params = Map::new();
        params.insert("type".to_string(), Value::from("  "));
        let result = registry.execute("needs_type", &params).await;
        assert!(!result.success, "blank values do not satisfy required");
    }

    #[tokio::test]
    async fn callback_tool_receives_bound_defaults() {
        let mut schema = ToolInputSchema::default();
        schema.properties.insert(
            "greeting".to_string(),
            PropertySchema::string("salutation").with_default(Value::from("hello")),
        );
        let definition = ToolDefinition {
            name: "greet".to_string(),
            description: "Greets".to_string(),
            input_schema: schema,
        };

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CallbackTool::new(definition, |params| {
            let greeting = params.get("greeting").and_then(Value::as_str).unwrap_or("?");
            ToolResult::text("greet", greeting.to_string())
        })));

        let result = registry.execute("greet", &Map::new()).await;
        assert!(result.success);
        match result.output {
            crate::tools::types::ToolOutput::Text(text) => assert_eq!(text, "hello"),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn definitions_come_back_in_name_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(MockTool::new("zeta", &[])));
        registry.register(Arc::new(MockTool::new("alpha", &[])));
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
