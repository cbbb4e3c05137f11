//! Pass-through API tool: binds normalized parameters directly to the
//! site action executor.

use crate::site::SiteAdapter;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TOOL_NAME: &str = "wp_api";

pub struct WpApiTool {
    definition: ToolDefinition,
    site: Arc<dyn SiteAdapter>,
}

impl WpApiTool {
    pub fn new(site: Arc<dyn SiteAdapter>) -> Self {
        let mut schema = ToolInputSchema::default();
        schema.properties.insert(
            "action".to_string(),
            PropertySchema::string("The site action to perform").with_enum(&[
                "create_post",
                "create_page",
                "update_post",
                "get_post",
                "get_posts",
                "delete_post",
                "create_user",
                "get_users",
                "create_membership",
                "get_memberships",
            ]),
        );
        schema.required.push("action".to_string());
        schema.properties.insert(
            "title".to_string(),
            PropertySchema::string("Title for content-creation actions"),
        );
        schema.properties.insert(
            "content".to_string(),
            PropertySchema::string("Body text for content-creation actions"),
        );
        schema.properties.insert(
            "status".to_string(),
            PropertySchema::string("Publication status (defaults to draft)"),
        );
        schema.properties.insert(
            "id".to_string(),
            PropertySchema::integer("Record id for single-record actions"),
        );

        WpApiTool {
            definition: ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: "Perform a site content or account action: create, read, \
                              update, and delete posts, pages, users, and memberships."
                    .to_string(),
                input_schema: schema,
            },
            site,
        }
    }
}

#[async_trait]
impl Tool for WpApiTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: &Map<String, Value>) -> ToolResult {
        let action = match params.get("action").and_then(Value::as_str) {
            Some(a) if !a.trim().is_empty() => a.trim().to_string(),
            _ => return ToolResult::failure(TOOL_NAME, "missing required parameter: action"),
        };

        match self.site.execute_action(&action, params) {
            Ok(Value::String(s)) => ToolResult::text(TOOL_NAME, s),
            Ok(value) => ToolResult::structured(TOOL_NAME, value),
            Err(e) => ToolResult::failure(TOOL_NAME, format!("action '{}' failed: {}", action, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::site::SqliteSite;
    use crate::tools::types::ToolOutput;
    use tempfile::tempdir;

    fn api_tool() -> (tempfile::TempDir, Arc<Database>, WpApiTool) {
        let dir = tempdir().unwrap();
        let db = Arc::new(Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap());
        let tool = WpApiTool::new(Arc::new(SqliteSite::new(db.clone())));
        (dir, db, tool)
    }

    #[tokio::test]
    async fn create_post_returns_structured_record() {
        let (_dir, db, tool) = api_tool();
        let mut params = Map::new();
        params.insert("action".to_string(), Value::from("create_post"));
        params.insert("title".to_string(), Value::from("Hello"));
        params.insert("content".to_string(), Value::from("Body"));

        let result = tool.execute(&params).await;
        assert!(result.success);
        match result.output {
            ToolOutput::Structured(value) => {
                assert_eq!(value["title"], "Hello");
                assert_eq!(value["status"], "draft");
            }
            other => panic!("expected structured output, got {:?}", other),
        }
        assert_eq!(db.list_posts(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failure_envelope_names_the_action() {
        let (_dir, _db, tool) = api_tool();
        let mut params = Map::new();
        params.insert("action".to_string(), Value::from("create_post"));

        let result = tool.execute(&params).await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("create_post"));
        assert!(error.contains("title"));
    }

    #[tokio::test]
    async fn unknown_action_is_caught_at_the_boundary() {
        let (_dir, _db, tool) = api_tool();
        let mut params = Map::new();
        params.insert("action".to_string(), Value::from("explode"));

        let result = tool.execute(&params).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("explode"));
    }
}
