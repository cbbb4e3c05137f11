//! Log-query tool over the tool execution audit trail.

use crate::db::tables::history_window;
use crate::db::Database;
use crate::tools::format::relative_time;
use crate::tools::registry::Tool;
use crate::tools::types::{PropertySchema, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::models::parse_stored_timestamp;

pub const TOOL_NAME: &str = "plugin_logs";

fn param_i64(params: &Map<String, Value>, key: &str) -> Option<i64> {
    match params.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

pub struct PluginLogsTool {
    definition: ToolDefinition,
    db: Arc<Database>,
    default_days: i64,
}

impl PluginLogsTool {
    pub fn new(db: Arc<Database>, default_days: i64) -> Self {
        let mut schema = ToolInputSchema::default();
        schema.properties.insert(
            "days".to_string(),
            PropertySchema::integer(
                "How many days back to look; 0 means the whole history",
            )
            .with_default(Value::from(default_days)),
        );
        schema.properties.insert(
            "summary_only".to_string(),
            PropertySchema::boolean("Return only the aggregate summary, no detail rows"),
        );
        schema.properties.insert(
            "limit".to_string(),
            PropertySchema::integer("Detail rows per page (default 25)"),
        );
        schema.properties.insert(
            "offset".to_string(),
            PropertySchema::integer("Detail row offset for paging"),
        );

        PluginLogsTool {
            definition: ToolDefinition {
                name: TOOL_NAME.to_string(),
                description: "Query the tool activity log: counts by action, most \
                              active tools, and a paged detail listing."
                    .to_string(),
                input_schema: schema,
            },
            db,
            default_days,
        }
    }
}

#[async_trait]
impl Tool for PluginLogsTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: &Map<String, Value>) -> ToolResult {
        let days = param_i64(params, "days").unwrap_or(self.default_days);
        let summary_only = params
            .get("summary_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let limit = param_i64(params, "limit").filter(|n| *n > 0).unwrap_or(25);
        let offset = param_i64(params, "offset").filter(|n| *n >= 0).unwrap_or(0);

        let now = Utc::now();
        // days == 0 means the whole history, no cutoff.
        let since = history_window(now, days);

        let summary = match self.db.tool_execution_summary(since) {
            Ok(s) => s,
            Err(e) => return ToolResult::failure(TOOL_NAME, format!("log query failed: {}", e)),
        };

        let mut body = json!({
            "period_days": days,
            "summary": {
                "total": summary.total,
                "by_action": summary.by_action
                    .iter()
                    .map(|(action, count)| json!({"action": action, "count": count}))
                    .collect::<Vec<_>>(),
                "most_active_tools": summary.most_active_tools
                    .iter()
                    .map(|(tool, count)| json!({"tool": tool, "count": count}))
                    .collect::<Vec<_>>(),
            },
        });

        if !summary_only {
            let rows = match self.db.tool_execution_history(since, limit, offset) {
                Ok(rows) => rows,
                Err(e) => {
                    return ToolResult::failure(TOOL_NAME, format!("log query failed: {}", e))
                }
            };
            let logs: Vec<Value> = rows
                .into_iter()
                .map(|row| {
                    let when = parse_stored_timestamp(&row.executed_at);
                    json!({
                        "tool": row.tool,
                        "action": row.action,
                        "success": row.success,
                        "error": row.error,
                        "executed_at": row.executed_at,
                        "time_ago": relative_time(when, now),
                    })
                })
                .collect();
            body["logs"] = Value::Array(logs);
            body["limit"] = Value::from(limit);
            body["offset"] = Value::from(offset);
        }

        ToolResult::structured(TOOL_NAME, body)
    }
}
