//! Conversation accessor consumed by content recovery.

use std::sync::Arc;

use crate::db::Database;
use crate::models::ConversationMessage;

/// Read-only view over prior conversation turns. The pipeline never
/// creates or mutates messages.
pub trait ConversationReader: Send + Sync {
    /// Message explicitly marked for the requested content kind.
    fn find_message_with_marker(&self, kind: &str) -> Option<ConversationMessage>;
    /// The assistant message before the most recent one.
    fn previous_assistant_message(&self) -> Option<ConversationMessage>;
    /// The most recent assistant message.
    fn latest_assistant_message(&self) -> Option<ConversationMessage>;
}

pub struct SqliteConversation {
    db: Arc<Database>,
}

impl SqliteConversation {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl ConversationReader for SqliteConversation {
    fn find_message_with_marker(&self, kind: &str) -> Option<ConversationMessage> {
        self.db
            .find_message_with_marker(kind)
            .map_err(|e| log::error!("conversation marker lookup failed: {}", e))
            .ok()
            .flatten()
    }

    fn previous_assistant_message(&self) -> Option<ConversationMessage> {
        self.db
            .assistant_message_at(1)
            .map_err(|e| log::error!("conversation lookup failed: {}", e))
            .ok()
            .flatten()
    }

    fn latest_assistant_message(&self) -> Option<ConversationMessage> {
        self.db
            .assistant_message_at(0)
            .map_err(|e| log::error!("conversation lookup failed: {}", e))
            .ok()
            .flatten()
    }
}

/// Fixed transcript, used by tests and by callers that pass the
/// conversation inline with the request.
#[derive(Default)]
pub struct InMemoryConversation {
    messages: Vec<ConversationMessage>,
}

impl InMemoryConversation {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self { messages }
    }
}

impl ConversationReader for InMemoryConversation {
    fn find_message_with_marker(&self, kind: &str) -> Option<ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.marker.as_deref() == Some(kind))
            .cloned()
    }

    fn previous_assistant_message(&self) -> Option<ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .filter(|m| m.role == "assistant")
            .nth(1)
            .cloned()
    }

    fn latest_assistant_message(&self) -> Option<ConversationMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "assistant")
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_ordering() {
        let conv = InMemoryConversation::new(vec![
            ConversationMessage::assistant("first"),
            ConversationMessage::assistant("second").with_marker("page"),
            ConversationMessage::assistant("third"),
        ]);
        assert_eq!(conv.latest_assistant_message().unwrap().content, "third");
        assert_eq!(conv.previous_assistant_message().unwrap().content, "second");
        assert_eq!(
            conv.find_message_with_marker("page").unwrap().content,
            "second"
        );
        assert!(conv.find_message_with_marker("blog-post").is_none());
    }
}
