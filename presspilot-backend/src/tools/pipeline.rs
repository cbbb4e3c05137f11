//! The tool invocation pipeline: normalize, recover missing content,
//! validate (fail-open), dispatch, format. One synchronous pass per
//! request; all collaborators are injected at construction.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, error};
use serde_json::Value;

use crate::conversation::ConversationReader;
use crate::db::Database;
use crate::models::ToolExecution;
use crate::tools::format::envelope;
use crate::tools::normalize::normalize;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::{CanonicalRequest, ToolResult};
use crate::tools::validation::{self, CommandValidator};
use crate::tools::{recovery, validation::ValidationOutcome};

pub struct ToolPipeline {
    registry: Arc<ToolRegistry>,
    conversation: Arc<dyn ConversationReader>,
    validator: Option<Arc<dyn CommandValidator>>,
    db: Arc<Database>,
}

impl ToolPipeline {
    pub fn new(
        registry: Arc<ToolRegistry>,
        conversation: Arc<dyn ConversationReader>,
        validator: Option<Arc<dyn CommandValidator>>,
        db: Arc<Database>,
    ) -> Self {
        Self {
            registry,
            conversation,
            validator,
            db,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one raw request through every stage and produce the wire
    /// envelope. No stage failure escapes unstructured.
    pub async fn run(&self, raw: &Value) -> Value {
        let mut request = match normalize(raw) {
            Ok(req) => req,
            Err(e) => {
                let tool = raw
                    .get("tool")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                return envelope(&ToolResult::failure(tool, e.to_string()), None);
            }
        };

        if recovery::needs_recovery(&request) {
            recovery::recover(&mut request, self.conversation.as_ref());
        }

        let ValidationOutcome {
            request, message, ..
        } = validation::run(request, raw, self.validator.as_deref()).await;
        if !message.is_empty() {
            debug!("validation: {} ({})", message, request.name);
        }

        let started = Instant::now();
        let result = self
            .registry
            .execute(&request.name, &request.parameters)
            .await;
        self.audit(&request, &result, started.elapsed().as_millis() as i64);

        envelope(&result, request.param_str("command"))
    }

    fn audit(&self, request: &CanonicalRequest, result: &ToolResult, duration_ms: i64) {
        let record = ToolExecution {
            id: None,
            tool: request.name.clone(),
            action: request.param_str("action").map(|s| s.to_string()),
            parameters: Value::Object(request.parameters.clone()),
            success: result.success,
            error: result.error.clone(),
            duration_ms: Some(duration_ms),
            executed_at: Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.db.insert_tool_execution(&record) {
            error!("failed to record tool execution: {}", e);
        }
    }
}
