//! Conversation transcript operations

use rusqlite::{params, Result as SqliteResult};

use super::super::Database;
use crate::models::ConversationMessage;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationMessage> {
    Ok(ConversationMessage {
        id: row.get(0)?,
        role: row.get(1)?,
        content: row.get(2)?,
        marker: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Database {
    pub fn insert_conversation_message(&self, msg: &ConversationMessage) -> SqliteResult<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO conversation_messages (role, content, marker, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![msg.role, msg.content, msg.marker, msg.created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Newest message whose marker matches the requested content kind.
    pub fn find_message_with_marker(&self, kind: &str) -> SqliteResult<Option<ConversationMessage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, role, content, marker, created_at FROM conversation_messages
             WHERE marker = ?1 ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([kind], row_to_message)?;
        rows.next().transpose()
    }

    /// Assistant messages newest-first, skipping `skip` from the top.
    pub fn assistant_message_at(&self, skip: i64) -> SqliteResult<Option<ConversationMessage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, role, content, marker, created_at FROM conversation_messages
             WHERE role = 'assistant' ORDER BY id DESC LIMIT 1 OFFSET ?1",
        )?;
        let mut rows = stmt.query_map([skip], row_to_message)?;
        rows.next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_lookup_prefers_newest() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        db.insert_conversation_message(
            &ConversationMessage::assistant("older").with_marker("blog-post"),
        )
        .unwrap();
        db.insert_conversation_message(
            &ConversationMessage::assistant("newer").with_marker("blog-post"),
        )
        .unwrap();

        let hit = db.find_message_with_marker("blog-post").unwrap().unwrap();
        assert_eq!(hit.content, "newer");
        assert!(db.find_message_with_marker("page").unwrap().is_none());
    }

    #[test]
    fn assistant_offset_walks_backwards() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("t.db").to_str().unwrap()).unwrap();
        db.insert_conversation_message(&ConversationMessage::assistant("first")).unwrap();
        let mut user = ConversationMessage::assistant("question");
        user.role = "user".to_string();
        db.insert_conversation_message(&user).unwrap();
        db.insert_conversation_message(&ConversationMessage::assistant("last")).unwrap();

        assert_eq!(db.assistant_message_at(0).unwrap().unwrap().content, "last");
        assert_eq!(db.assistant_message_at(1).unwrap().unwrap().content, "first");
        assert!(db.assistant_message_at(2).unwrap().is_none());
    }
}
