//! Content recovery: when a content-creation action arrives without a
//! title or body, pull them out of prior conversation turns instead of
//! failing the request.
//!
//! The extraction helpers are deliberately standalone pure functions so
//! the layered heuristics can be tested without a pipeline.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::types::CanonicalRequest;
use crate::conversation::ConversationReader;

pub const DEFAULT_POST_TITLE: &str = "New Post";
pub const DEFAULT_PAGE_TITLE: &str = "New Page";
/// Used when no conversation text can be located at all; a create
/// action proceeds with this body rather than hard-failing.
pub const PLACEHOLDER_CONTENT: &str = "Content to be added.";

static TITLE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:#{1,6}\s*)?Title:\s*(.+)$").unwrap());
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+(.+)$").unwrap());
static CONTENT_SECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^(?:#{1,6}\s*)?Content:\s*\n?(.*?)(?:^#{1,6}[ \t]|^```|\z)").unwrap()
});
static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?(?:```|\z)").unwrap());
static HEADING_MARK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static LABEL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(?:Title|Content):\s*").unwrap());

/// Only content-creation actions with a missing (or still-placeholder)
/// title or body go through recovery.
pub fn needs_recovery(req: &CanonicalRequest) -> bool {
    if req.name != "wp_api" {
        return false;
    }
    match req.param_str("action") {
        Some("create_post") | Some("create_page") => {}
        _ => return false,
    }
    title_missing(req) || content_missing(req)
}

fn title_missing(req: &CanonicalRequest) -> bool {
    match req.param_str("title").map(str::trim) {
        None | Some("") => true,
        Some(t) => t == DEFAULT_POST_TITLE || t == DEFAULT_PAGE_TITLE,
    }
}

fn content_missing(req: &CanonicalRequest) -> bool {
    match req.param_str("content").map(str::trim) {
        None | Some("") => true,
        Some(c) => c == PLACEHOLDER_CONTENT,
    }
}

/// Fill in missing title/content/status on a create action. Source
/// order: marker-matched message, previous assistant message, latest
/// assistant message - first hit wins, no backtracking.
pub fn recover(req: &mut CanonicalRequest, conversation: &dyn ConversationReader) {
    let is_page = req.param_str("action") == Some("create_page");
    let marker = if is_page { "page" } else { "blog-post" };
    let default_title = if is_page { DEFAULT_PAGE_TITLE } else { DEFAULT_POST_TITLE };

    let message = conversation
        .find_message_with_marker(marker)
        .or_else(|| conversation.previous_assistant_message())
        .or_else(|| conversation.latest_assistant_message());

    let (found_title, found_content) = match &message {
        Some(m) => (extract_title(&m.content), extract_content(&m.content)),
        None => (None, None),
    };

    if title_missing(req) {
        let title = found_title.unwrap_or_else(|| default_title.to_string());
        req.parameters.insert("title".to_string(), Value::from(title));
    }
    if content_missing(req) {
        let content = found_content.unwrap_or_else(|| PLACEHOLDER_CONTENT.to_string());
        req.parameters.insert("content".to_string(), Value::from(content));
    }
    // Recovered drafts are never silently published.
    if req.param_str("status").map(str::trim).filter(|s| !s.is_empty()).is_none() {
        req.parameters
            .insert("status".to_string(), Value::from("draft"));
    }
}

/// Explicit "Title:" label first, markdown heading second.
pub fn extract_title(text: &str) -> Option<String> {
    if let Some(cap) = TITLE_LABEL_RE.captures(text) {
        return Some(cap[1].trim().to_string()).filter(|s| !s.is_empty());
    }
    HEADING_RE
        .captures(text)
        .map(|cap| cap[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A dedicated "Content:" section wins; otherwise the whole message is
/// used with fences, heading markers, and residual labels stripped.
pub fn extract_content(text: &str) -> Option<String> {
    if let Some(cap) = CONTENT_SECTION_RE.captures(text) {
        let section = cap[1].trim();
        if !section.is_empty() {
            return Some(section.to_string());
        }
    }

    let stripped = FENCE_RE.replace_all(text, "");
    let stripped = HEADING_MARK_RE.replace_all(&stripped, "");
    let stripped = LABEL_RE.replace_all(&stripped, "");
    let cleaned = stripped.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::InMemoryConversation;
    use crate::models::ConversationMessage;

    fn create_post_request() -> CanonicalRequest {
        let mut req = CanonicalRequest::new("wp_api");
        req.parameters
            .insert("action".to_string(), Value::from("create_post"));
        req
    }

    #[test]
    fn title_label_beats_heading() {
        let text = "## Draft\nTitle: The Real One\nbody";
        assert_eq!(extract_title(text).as_deref(), Some("The Real One"));
    }

    #[test]
    fn heading_is_the_fallback_title() {
        assert_eq!(extract_title("# My Title\nHello").as_deref(), Some("My Title"));
        assert_eq!(extract_title("no structure here"), None);
    }

    #[test]
    fn labeled_content_section_is_captured_up_to_next_heading() {
        let text = "# T\nContent:\nline one\nline two\n## Next\nignored";
        assert_eq!(
            extract_content(text).as_deref(),
            Some("line one\nline two")
        );
    }

    #[test]
    fn fallback_strips_fences_and_heading_markers() {
        let text = "# Heading\nkeep this\n```\ncode gone\n```\nand this";
        assert_eq!(
            extract_content(text).as_deref(),
            Some("Heading\nkeep this\n\nand this")
        );
    }

    #[test]
    fn spec_scenario_recovers_title_content_and_draft_status() {
        let conv = InMemoryConversation::new(vec![ConversationMessage::assistant(
            "# My Title\nContent:\nHello world",
        )]);
        let mut req = create_post_request();
        assert!(needs_recovery(&req));
        recover(&mut req, &conv);
        assert_eq!(req.param_str("title"), Some("My Title"));
        assert_eq!(req.param_str("content"), Some("Hello world"));
        assert_eq!(req.param_str("status"), Some("draft"));
    }

    #[test]
    fn marker_message_wins_over_more_recent_fallbacks() {
        let conv = InMemoryConversation::new(vec![
            ConversationMessage::assistant("# Marked\nmarked body").with_marker("blog-post"),
            ConversationMessage::assistant("# Previous\nprevious body"),
            ConversationMessage::assistant("# Latest\nlatest body"),
        ]);
        let mut req = create_post_request();
        recover(&mut req, &conv);
        assert_eq!(req.param_str("title"), Some("Marked"));
    }

    #[test]
    fn empty_conversation_still_yields_non_empty_fields() {
        let conv = InMemoryConversation::default();
        let mut req = create_post_request();
        recover(&mut req, &conv);
        assert_eq!(req.param_str("title"), Some(DEFAULT_POST_TITLE));
        assert_eq!(req.param_str("content"), Some(PLACEHOLDER_CONTENT));
        assert_eq!(req.param_str("status"), Some("draft"));
    }

    #[test]
    fn page_actions_use_the_page_marker_and_default() {
        let conv = InMemoryConversation::default();
        let mut req = CanonicalRequest::new("wp_api");
        req.parameters
            .insert("action".to_string(), Value::from("create_page"));
        recover(&mut req, &conv);
        assert_eq!(req.param_str("title"), Some(DEFAULT_PAGE_TITLE));
    }

    #[test]
    fn explicit_fields_are_left_alone() {
        let conv = InMemoryConversation::new(vec![ConversationMessage::assistant("# Other")]);
        let mut req = create_post_request();
        req.parameters.insert("title".to_string(), Value::from("Keep"));
        req.parameters
            .insert("content".to_string(), Value::from("Keep body"));
        req.parameters
            .insert("status".to_string(), Value::from("publish"));
        assert!(!needs_recovery(&req));
        recover(&mut req, &conv);
        assert_eq!(req.param_str("title"), Some("Keep"));
        assert_eq!(req.param_str("status"), Some("publish"));
    }

    #[test]
    fn read_actions_never_trigger_recovery() {
        let mut req = CanonicalRequest::new("wp_api");
        req.parameters
            .insert("action".to_string(), Value::from("get_posts"));
        assert!(!needs_recovery(&req));
    }
}
