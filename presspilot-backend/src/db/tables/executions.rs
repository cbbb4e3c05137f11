//! Tool execution audit log operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::{ExecutionSummary, ToolExecution};

/// Compute the lower bound of a day-count history window. Zero and
/// negative counts mean the whole history, and so does a count so
/// large the subtraction would leave the calendar - callers hand this
/// value straight from an unreliable client, so overflow must degrade
/// to unbounded instead of panicking.
pub fn history_window(now: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    if days <= 0 {
        return None;
    }
    chrono::Duration::try_days(days).and_then(|d| now.checked_sub_signed(d))
}

impl Database {
    pub fn insert_tool_execution(&self, exec: &ToolExecution) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tool_executions (tool, action, parameters, success, error, duration_ms, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                exec.tool,
                exec.action,
                exec.parameters.to_string(),
                exec.success as i64,
                exec.error,
                exec.duration_ms,
                exec.executed_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Paged detail rows, newest first, optionally bounded by a cutoff.
    pub fn tool_execution_history(
        &self,
        since: Option<DateTime<Utc>>,
        limit: i64,
        offset: i64,
    ) -> SqliteResult<Vec<ToolExecution>> {
        let conn = self.conn();
        let cutoff = since.map(|t| t.to_rfc3339()).unwrap_or_default();
        let mut stmt = conn.prepare(
            "SELECT id, tool, action, parameters, success, error, duration_ms, executed_at
             FROM tool_executions
             WHERE (?1 = '' OR executed_at >= ?1)
             ORDER BY executed_at DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![cutoff, limit, offset], |row| {
            let parameters: String = row.get(3)?;
            let success: i64 = row.get(4)?;
            Ok(ToolExecution {
                id: row.get(0)?,
                tool: row.get(1)?,
                action: row.get(2)?,
                parameters: serde_json::from_str(&parameters)
                    .unwrap_or(serde_json::Value::Null),
                success: success != 0,
                error: row.get(5)?,
                duration_ms: row.get(6)?,
                executed_at: row.get(7)?,
            })
        })?;
        rows.collect()
    }

    /// Counts by action type plus the most-active tools, for the log
    /// summary view.
    pub fn tool_execution_summary(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> SqliteResult<ExecutionSummary> {
        let conn = self.conn();
        let cutoff = since.map(|t| t.to_rfc3339()).unwrap_or_default();

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tool_executions WHERE (?1 = '' OR executed_at >= ?1)",
            params![cutoff],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT COALESCE(action, tool) AS kind, COUNT(*) AS n
             FROM tool_executions
             WHERE (?1 = '' OR executed_at >= ?1)
             GROUP BY kind ORDER BY n DESC",
        )?;
        let by_action = stmt
            .query_map(params![cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT tool, COUNT(*) AS n
             FROM tool_executions
             WHERE (?1 = '' OR executed_at >= ?1)
             GROUP BY tool ORDER BY n DESC LIMIT 5",
        )?;
        let most_active_tools = stmt
            .query_map(params![cutoff], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(ExecutionSummary {
            total,
            by_action,
            most_active_tools,
        })
    }

    /// Most recent execution timestamp per named tool. Used to annotate
    /// the plugin listing with activity history.
    pub fn last_activity_for_tool(&self, tool: &str) -> SqliteResult<Option<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT executed_at FROM tool_executions WHERE tool = ?1
             ORDER BY executed_at DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([tool], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(v) => Ok(Some(v?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn record(tool: &str, action: Option<&str>, at: DateTime<Utc>) -> ToolExecution {
        ToolExecution {
            id: None,
            tool: tool.to_string(),
            action: action.map(|s| s.to_string()),
            parameters: json!({}),
            success: true,
            error: None,
            duration_ms: Some(4),
            executed_at: at.to_rfc3339(),
        }
    }

    #[test]
    fn summary_counts_by_action_within_window() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        let now = Utc::now();
        db.insert_tool_execution(&record("wp_api", Some("create_post"), now)).unwrap();
        db.insert_tool_execution(&record("wp_api", Some("create_post"), now)).unwrap();
        db.insert_tool_execution(&record("wp_cli", None, now - Duration::days(40))).unwrap();

        let summary = db.tool_execution_summary(Some(now - Duration::days(7))).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.by_action, vec![("create_post".to_string(), 2)]);

        let unbounded = db.tool_execution_summary(None).unwrap();
        assert_eq!(unbounded.total, 3);
    }

    #[test]
    fn history_window_degrades_to_unbounded_on_overflow() {
        let now = Utc::now();
        assert!(history_window(now, 0).is_none());
        assert!(history_window(now, -3).is_none());
        assert_eq!(history_window(now, 7), Some(now - Duration::days(7)));
        assert!(history_window(now, i64::MAX).is_none());
    }

    #[test]
    fn history_is_paged_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        let now = Utc::now();
        for i in 0..5 {
            db.insert_tool_execution(&record("wp_cli", None, now - Duration::minutes(i)))
                .unwrap();
        }
        let page = db.tool_execution_history(None, 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert!(page[0].executed_at > page[1].executed_at);
    }
}
