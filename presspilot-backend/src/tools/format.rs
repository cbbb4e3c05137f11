//! Response formatting: the stable wire envelope, tabular-output
//! classification, output truncation, and human-relative timestamps.
//! Everything here is a pure function over already-produced results.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::types::{ToolOutput, ToolResult};

/// Raw command output beyond this many bytes is cut off.
pub const MAX_OUTPUT_LEN: usize = 10_000;
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

/// Ordered keyword table for classifying tabular output by the command
/// text that produced it. First hit wins.
const COMMAND_KEYWORDS: &[(&str, &str)] = &[
    ("user", "user"),
    ("post", "post"),
    ("plugin", "plugin"),
    ("member", "membership"),
    ("transaction", "transaction"),
    ("subscription", "subscription"),
];

pub fn classify_command(command: &str) -> Option<String> {
    let lowered = command.to_lowercase();
    COMMAND_KEYWORDS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, label)| label.to_string())
}

fn looks_tabular(text: &str) -> bool {
    text.contains('\t') || text.contains('\n')
}

/// Cap raw output at [`MAX_OUTPUT_LEN`], appending the truncation
/// marker when anything was dropped. The cut lands on a char boundary
/// at or below the ceiling.
pub fn truncate_output(text: &str) -> String {
    if text.len() <= MAX_OUTPUT_LEN {
        return text.to_string();
    }
    let mut end = MAX_OUTPUT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = text[..end].to_string();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Wrap a handler result into the wire envelope: `{success, tool,
/// result}` on success, `{success: false, tool, error}` otherwise.
/// Plain text that looks tabular is upgraded to a table object with a
/// `command_type` hint derived from the originating command text.
pub fn envelope(result: &ToolResult, command_text: Option<&str>) -> Value {
    if !result.success {
        return json!({
            "success": false,
            "tool": result.tool,
            "error": result.error.as_deref().unwrap_or("unknown error"),
        });
    }

    let rendered = match &result.output {
        ToolOutput::Text(text) if looks_tabular(text) => json!({
            "command_type": classify_command(command_text.unwrap_or("")),
            "text": text,
        }),
        ToolOutput::Text(text) => Value::from(text.clone()),
        ToolOutput::Table { command_type, text } => json!({
            "command_type": command_type,
            "text": text,
        }),
        ToolOutput::Structured(value) => value.clone(),
    };

    json!({
        "success": true,
        "tool": result.tool,
        "result": rendered,
    })
}

/// "3 days ago" style rendering with a fixed unit ladder.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    let (count, unit) = if days >= 365 {
        (days / 365, "year")
    } else if days >= 30 {
        (days / 30, "month")
    } else if days >= 7 {
        (days / 7, "week")
    } else if days >= 1 {
        (days, "day")
    } else if hours >= 1 {
        (hours, "hour")
    } else if minutes >= 1 {
        (minutes, "minute")
    } else {
        return "just now".to_string();
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
