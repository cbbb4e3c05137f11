//! Fail-open validation gate. A request may be handed to an external
//! validator collaborator, but no outcome of that call ever blocks
//! execution: rejections and transport errors both degrade to
//! "proceed with the original request" with a diagnostic message.

use async_trait::async_trait;
use log::warn;
use serde_json::{Map, Value};

use super::types::CanonicalRequest;

/// Tools whose requests never reach the external validator.
pub const BYPASSED_TOOLS: &[&str] = &["memberpress_info", "plugin_logs"];

/// Read-only API actions exempt from validation.
pub const BYPASSED_ACTIONS: &[&str] = &[
    "get_post",
    "get_posts",
    "get_users",
    "get_memberships",
    "get_transactions",
    "get_subscriptions",
];

/// Well-known safe read-only free-text commands.
pub const SAFE_COMMAND_PREFIXES: &[&str] = &[
    "wp post list",
    "wp user list",
    "wp plugin list",
    "wp option get",
];

/// Always carries the request onward; `accepted` records whether the
/// validator (when consulted) agreed, `message` carries diagnostics.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub request: CanonicalRequest,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidatorVerdict {
    pub success: bool,
    pub message: String,
}

/// External rule- or model-based validator.
#[async_trait]
pub trait CommandValidator: Send + Sync {
    async fn validate(
        &self,
        command_type: &str,
        command_data: &Map<String, Value>,
    ) -> Result<ValidatorVerdict, String>;
}

/// POSTs `{command_type, command_data}` to a validation service and
/// reads back `{success, message}`.
pub struct HttpValidator {
    client: reqwest::Client,
    url: String,
}

impl HttpValidator {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl CommandValidator for HttpValidator {
    async fn validate(
        &self,
        command_type: &str,
        command_data: &Map<String, Value>,
    ) -> Result<ValidatorVerdict, String> {
        let body = serde_json::json!({
            "command_type": command_type,
            "command_data": command_data,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("validator request failed: {}", e))?;
        let parsed: Value = response
            .json()
            .await
            .map_err(|e| format!("validator returned malformed response: {}", e))?;
        Ok(ValidatorVerdict {
            success: parsed
                .get("success")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            message: parsed
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        })
    }
}

/// Local rule-based validator, used when no external validation
/// service is configured. Flags obviously destructive free-text
/// command fragments; everything else passes.
pub struct RuleValidator;

/// Fragments that mark a command as destructive. Matched against
/// every string-valued parameter, case-insensitively.
const DESTRUCTIVE_FRAGMENTS: &[&str] = &[
    "db drop",
    "db reset",
    "site empty",
    "eval ",
    "eval-file",
    "rm -rf",
];

impl RuleValidator {
    fn flagged_fragment(command_data: &Map<String, Value>) -> Option<&'static str> {
        for value in command_data.values() {
            if let Some(text) = value.as_str() {
                let lowered = text.to_lowercase();
                for fragment in DESTRUCTIVE_FRAGMENTS {
                    if lowered.contains(fragment) {
                        return Some(fragment);
                    }
                }
            }
        }
        None
    }
}

#[async_trait]
impl CommandValidator for RuleValidator {
    async fn validate(
        &self,
        command_type: &str,
        command_data: &Map<String, Value>,
    ) -> Result<ValidatorVerdict, String> {
        match Self::flagged_fragment(command_data) {
            Some(fragment) => Ok(ValidatorVerdict {
                success: false,
                message: format!(
                    "'{}' carries a destructive command fragment: {}",
                    command_type, fragment
                ),
            }),
            None => Ok(ValidatorVerdict {
                success: true,
                message: "ok".to_string(),
            }),
        }
    }
}

fn starts_with_safe_prefix(command: &str) -> bool {
    let trimmed = command.trim_start();
    SAFE_COMMAND_PREFIXES
        .iter()
        .any(|p| trimmed.starts_with(p))
}

/// Bypass match against five signals: tool name, legacy `tool` field,
/// declared action, the `command` parameter, and a top-level `command`
/// on the raw request body.
pub fn is_bypassed(request: &CanonicalRequest, raw: &Value) -> bool {
    if BYPASSED_TOOLS.contains(&request.name.as_str()) {
        return true;
    }
    if let Some(tool) = raw.get("tool").and_then(Value::as_str) {
        if BYPASSED_TOOLS.contains(&tool) {
            return true;
        }
    }
    if let Some(action) = request.param_str("action") {
        if BYPASSED_ACTIONS.contains(&action) {
            return true;
        }
    }
    if let Some(command) = request.param_str("command") {
        if starts_with_safe_prefix(command) {
            return true;
        }
    }
    if let Some(command) = raw.get("command").and_then(Value::as_str) {
        if starts_with_safe_prefix(command) {
            return true;
        }
    }
    false
}

/// Run the gate. The returned outcome always carries the original
/// request, never a validator-modified one.
pub async fn run(
    request: CanonicalRequest,
    raw: &Value,
    validator: Option<&dyn CommandValidator>,
) -> ValidationOutcome {
    if is_bypassed(&request, raw) {
        return ValidationOutcome {
            accepted: true,
            request,
            message: "validation bypassed".to_string(),
        };
    }

    let validator = match validator {
        Some(v) => v,
        None => {
            return ValidationOutcome {
                accepted: true,
                request,
                message: "no validator configured".to_string(),
            }
        }
    };

    match validator.validate(&request.name, &request.parameters).await {
        Ok(verdict) if verdict.success => ValidationOutcome {
            accepted: true,
            request,
            message: verdict.message,
        },
        Ok(verdict) => {
            warn!(
                "validator rejected '{}' ({}); proceeding anyway",
                request.name, verdict.message
            );
            ValidationOutcome {
                accepted: true,
                request,
                message: format!("validator rejected the request: {}", verdict.message),
            }
        }
        Err(e) => {
            warn!("validator call failed for '{}': {}; proceeding", request.name, e);
            ValidationOutcome {
                accepted: true,
                request,
                message: format!("validator unavailable: {}", e),
            }
        }
    }
}
