//! Chat transcript state for the advisor panel.
//!
//! The transcript is an ordered, append-only log within a session: a send
//! appends the user entry before the request is dispatched, and exactly one
//! completion appends either the reply or the canned error entry. Nothing
//! mutates an entry in place.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::api::HistoryRecord;
use crate::session::random_token;

/// Seeded whenever a session has no prior history.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your AI financial advisor. I can help you with \
investment strategies, portfolio analysis, market insights, and financial planning. \
How can I assist you today?";

/// Appended when the chat endpoint stays unreachable after retries.
pub const SEND_FAILURE_MESSAGE: &str = "I apologize, but I'm having trouble responding right now. \
This could be due to:\n\n\
• High demand on the advisory service\n\
• Network connectivity issues\n\
• Backend maintenance\n\n\
Please try sending your message again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn from_wire(role: &str) -> Self {
        if role == "user" {
            Role::User
        } else {
            Role::Assistant
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
}

impl ChatMessage {
    pub fn new_user(content: String) -> Self {
        Self {
            id: next_message_id(),
            role: Role::User,
            content,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn new_assistant(content: String) -> Self {
        Self {
            id: next_message_id(),
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    pub fn new_error(content: String) -> Self {
        Self {
            id: next_message_id(),
            role: Role::Assistant,
            content,
            timestamp: Utc::now(),
            is_error: true,
        }
    }
}

/// Best-effort unique id, random token plus timestamp.
fn next_message_id() -> String {
    format!("msg_{}_{}", random_token(), Utc::now().timestamp_millis())
}

/// Parse a backend history timestamp. FastAPI serializes `datetime.utcnow()`
/// without an offset, so the naive ISO form is tried after RFC 3339.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.and_utc();
    }
    tracing::warn!("Unparseable history timestamp: {}", raw);
    Utc::now()
}

/// Manages the advisor transcript, input buffer, and send lifecycle.
#[derive(Debug)]
pub struct ChatManager {
    messages: Vec<ChatMessage>,
    input: String,
    busy: bool,
    scroll_offset: usize,
}

impl ChatManager {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input: String::new(),
            busy: false,
            scroll_offset: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn push_input(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn scroll_up(&mut self) {
        if self.scroll_offset > 0 {
            self.scroll_offset -= 1;
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset += 1;
    }

    /// Restore a prior session's transcript, or seed the welcome message
    /// when there is nothing to restore. History entries get fresh local
    /// ids; role, content, and order are kept verbatim.
    pub fn initialize_from(&mut self, history: Result<Vec<HistoryRecord>, String>) {
        match history {
            Ok(records) if !records.is_empty() => {
                self.messages = records
                    .into_iter()
                    .map(|record| ChatMessage {
                        id: next_message_id(),
                        role: Role::from_wire(&record.role),
                        content: record.content,
                        timestamp: parse_timestamp(&record.timestamp),
                        is_error: false,
                    })
                    .collect();
            }
            Ok(_) => self.seed_welcome(),
            Err(e) => {
                tracing::warn!("Chat history unavailable, starting fresh: {}", e);
                self.seed_welcome();
            }
        }
    }

    pub fn seed_welcome(&mut self) {
        self.messages = vec![ChatMessage::new_assistant(WELCOME_MESSAGE.to_string())];
    }

    /// First phase of a send: append the user entry and hand back the text
    /// to dispatch. Returns `None` while a send is in flight or when the
    /// trimmed input is empty; the transcript is untouched in both cases.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.busy {
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::new_user(text.clone()));
        self.input.clear();
        self.busy = true;
        Some(text)
    }

    /// Second phase: append the settled outcome. Runs exactly once per
    /// `begin_send` and releases the busy flag on both arms.
    pub fn complete_send(&mut self, result: Result<String, String>) {
        match result {
            Ok(reply) => self.messages.push(ChatMessage::new_assistant(reply)),
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                self.messages
                    .push(ChatMessage::new_error(SEND_FAILURE_MESSAGE.to_string()));
            }
        }
        self.busy = false;
    }

    /// Drop the transcript and reseed the welcome message. The caller is
    /// responsible for rotating the session id alongside.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.scroll_offset = 0;
        self.seed_welcome();
    }
}

impl Default for ChatManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(manager: &mut ChatManager, text: &str) {
        for ch in text.chars() {
            manager.push_input(ch);
        }
    }

    #[test]
    fn empty_input_is_a_no_op() {
        let mut manager = ChatManager::new();
        manager.seed_welcome();

        assert_eq!(manager.begin_send(), None);
        type_text(&mut manager, "   \t ");
        assert_eq!(manager.begin_send(), None);

        assert_eq!(manager.messages().len(), 1);
        assert!(!manager.is_busy());
    }

    #[test]
    fn send_appends_user_before_dispatch_and_reply_after() {
        let mut manager = ChatManager::new();
        manager.seed_welcome();
        type_text(&mut manager, "  hi  ");

        let dispatched = manager.begin_send().unwrap();
        assert_eq!(dispatched, "hi");
        assert_eq!(manager.input(), "");
        assert!(manager.is_busy());
        assert_eq!(manager.messages().len(), 2);
        assert_eq!(manager.messages()[1].role, Role::User);
        assert_eq!(manager.messages()[1].content, "hi");

        manager.complete_send(Ok("Hello!".to_string()));
        assert!(!manager.is_busy());
        let messages = manager.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "Hello!");
        assert!(!messages[2].is_error);
        assert!(messages[1].timestamp <= messages[2].timestamp);
    }

    #[test]
    fn busy_flag_rejects_concurrent_sends() {
        let mut manager = ChatManager::new();
        type_text(&mut manager, "first");
        assert!(manager.begin_send().is_some());

        type_text(&mut manager, "second");
        assert_eq!(manager.begin_send(), None);
        // The rejected send left no trace.
        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.input(), "second");

        manager.complete_send(Ok("done".to_string()));
        assert!(manager.begin_send().is_some());
    }

    #[test]
    fn failed_send_appends_error_entry_and_releases_busy() {
        let mut manager = ChatManager::new();
        type_text(&mut manager, "hi");
        manager.begin_send().unwrap();

        manager.complete_send(Err("connection refused".to_string()));
        assert!(!manager.is_busy());

        let last = manager.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.is_error);
        assert_eq!(last.content, SEND_FAILURE_MESSAGE);
    }

    #[test]
    fn initialize_restores_history_verbatim() {
        let mut manager = ChatManager::new();
        manager.initialize_from(Ok(vec![
            HistoryRecord {
                role: "user".to_string(),
                content: "hi".to_string(),
                timestamp: "2025-07-01T10:00:00.000000".to_string(),
            },
            HistoryRecord {
                role: "assistant".to_string(),
                content: "Hello!".to_string(),
                timestamp: "2025-07-01T10:00:01.500000".to_string(),
            },
        ]));

        let messages = manager.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello!");
        assert!(messages[0].timestamp < messages[1].timestamp);
    }

    #[test]
    fn initialize_without_history_seeds_welcome() {
        let mut manager = ChatManager::new();
        manager.initialize_from(Ok(Vec::new()));
        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.messages()[0].content, WELCOME_MESSAGE);

        let mut manager = ChatManager::new();
        manager.initialize_from(Err("history endpoint down".to_string()));
        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.messages()[0].role, Role::Assistant);
    }

    #[test]
    fn clear_reseeds_the_welcome_message() {
        let mut manager = ChatManager::new();
        manager.seed_welcome();
        type_text(&mut manager, "hi");
        manager.begin_send().unwrap();
        manager.complete_send(Ok("Hello!".to_string()));

        manager.clear();
        assert_eq!(manager.messages().len(), 1);
        assert_eq!(manager.messages()[0].content, WELCOME_MESSAGE);
        assert_eq!(manager.scroll_offset(), 0);
    }

    #[test]
    fn timestamps_parse_in_both_backend_forms() {
        let rfc3339 = parse_timestamp("2025-07-01T10:00:00+00:00");
        let naive = parse_timestamp("2025-07-01T10:00:00.000000");
        assert_eq!(rfc3339, naive);
    }

    #[test]
    fn message_ids_are_distinct() {
        let a = ChatMessage::new_user("one".to_string());
        let b = ChatMessage::new_user("two".to_string());
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("msg_"));
    }
}
