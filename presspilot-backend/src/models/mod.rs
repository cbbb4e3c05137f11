//! Plain data records shared across the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single conversation turn, read-only to the tool pipeline.
/// `marker` tags assistant messages that carry recoverable content
/// (e.g. "blog-post" or "page").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Option<i64>,
    pub role: String,
    pub content: String,
    pub marker: Option<String>,
    pub created_at: String,
}

impl ConversationMessage {
    pub fn assistant(content: impl Into<String>) -> Self {
        ConversationMessage {
            id: None,
            role: "assistant".to_string(),
            content: content.into(),
            marker: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }
}

/// Tool execution record for the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    pub id: Option<i64>,
    pub tool: String,
    pub action: Option<String>,
    pub parameters: Value,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: Option<i64>,
    pub executed_at: String,
}

/// Aggregate view over the execution log for the log-query tool.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub total: i64,
    pub by_action: Vec<(String, i64)>,
    pub most_active_tools: Vec<(String, i64)>,
}

// --- Site records (CMS content store) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteUser {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub version: String,
}

// --- Commerce records (membership subsystem) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub title: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub member_email: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub member_email: String,
    pub membership: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSales {
    pub membership: String,
    pub sales: i64,
}

/// Counts used by the `memberpress_info` summary view.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CommerceCounts {
    pub members: i64,
    pub memberships: i64,
    pub transactions: i64,
    pub subscriptions: i64,
}

/// Parse an RFC 3339 timestamp stored by this backend, falling back to
/// the epoch for rows written by hand.
pub fn parse_stored_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default())
}
