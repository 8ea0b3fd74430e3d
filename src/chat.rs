//! Conversation state for the chat screen
//!
//! This module holds the transcript, the input buffer and the loading flag.
//! It has no dependency on the terminal, so the same state can back any
//! front end (and the tests drive it directly).

use serde::{Deserialize, Serialize};

use crate::client::{AssistantClient, RequestFailed};

/// Shown in place of a reply when the assistant API could not be reached
pub const APOLOGY: &str = "Sorry, I couldn't get a response right now. \
The server may be overloaded, so please try again in a moment.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Default)]
pub struct ChatView {
    messages: Vec<ChatMessage>,
    pub input: String,
    loading: bool,
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// True while a request is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a turn.
    ///
    /// Returns the trimmed text that should be sent to the assistant API, or
    /// `None` when the text is blank or a request is already in flight. An
    /// accepted turn clears the input buffer, appends the user message and
    /// sets the loading flag.
    pub fn submit(&mut self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || self.loading {
            return None;
        }

        let text = text.to_string();
        self.input.clear();
        self.messages.push(ChatMessage::user(text.clone()));
        self.loading = true;
        Some(text)
    }

    /// Finish the in-flight turn with the request outcome.
    ///
    /// Failures never escape: they become the apology message so the
    /// transcript stays consistent and the input is usable again.
    pub fn receive(&mut self, outcome: Result<String, RequestFailed>) {
        if !self.loading {
            tracing::debug!("dropping reply with no request in flight");
            return;
        }

        match outcome {
            Ok(reply) => self.messages.push(ChatMessage::assistant(reply)),
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                self.messages.push(ChatMessage::assistant(APOLOGY));
            }
        }
        self.loading = false;
    }

    /// Run a whole turn against the assistant API.
    ///
    /// The UI splits this into `submit` and `receive` around a spawned task;
    /// this is the same sequence awaited in place.
    pub async fn converse(&mut self, client: &AssistantClient, text: &str) {
        if let Some(message) = self.submit(text) {
            let outcome = client.chat(&message).await;
            self.receive(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failed() -> RequestFailed {
        RequestFailed::Malformed("expected value at line 1 column 1".to_string())
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut chat = ChatView::new();
        assert_eq!(chat.submit(""), None);
        assert_eq!(chat.submit("   \n\t"), None);
        assert!(chat.messages().is_empty());
        assert!(!chat.is_loading());
    }

    #[test]
    fn test_submit_trims_and_clears_input() {
        let mut chat = ChatView::new();
        chat.input = "  What is TCP?  ".to_string();
        let text = chat.input.clone();

        assert_eq!(chat.submit(&text).as_deref(), Some("What is TCP?"));
        assert!(chat.input.is_empty());
        assert!(chat.is_loading());
        assert_eq!(chat.messages(), &[ChatMessage::user("What is TCP?")]);
    }

    #[test]
    fn test_submit_while_loading_is_noop() {
        let mut chat = ChatView::new();
        chat.submit("first");
        chat.input = "second".to_string();

        assert_eq!(chat.submit("second"), None);
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.input, "second");
        assert!(chat.is_loading());
    }

    #[test]
    fn test_successful_turn() {
        let mut chat = ChatView::new();
        chat.submit("What is TCP?");
        chat.receive(Ok("TCP is a protocol.".to_string()));

        assert!(!chat.is_loading());
        assert_eq!(
            chat.messages(),
            &[
                ChatMessage::user("What is TCP?"),
                ChatMessage::assistant("TCP is a protocol."),
            ]
        );
    }

    #[test]
    fn test_failed_turn_appends_apology() {
        let mut chat = ChatView::new();
        chat.submit("fail case");
        chat.receive(Err(failed()));

        assert!(!chat.is_loading());
        assert_eq!(
            chat.messages(),
            &[ChatMessage::user("fail case"), ChatMessage::assistant(APOLOGY)]
        );
    }

    #[test]
    fn test_stale_reply_is_ignored() {
        let mut chat = ChatView::new();
        chat.receive(Ok("nobody asked".to_string()));
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_order_preserved_across_turns() {
        let mut chat = ChatView::new();
        chat.submit("one");
        chat.receive(Ok("1".to_string()));
        chat.submit("two");
        chat.receive(Err(failed()));
        chat.submit("three");
        chat.receive(Ok("3".to_string()));

        let contents: Vec<&str> = chat.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "1", "two", APOLOGY, "three", "3"]);

        let roles: Vec<ChatRole> = chat.messages().iter().map(|m| m.role).collect();
        assert!(roles
            .chunks(2)
            .all(|pair| pair == [ChatRole::User, ChatRole::Assistant]));
    }

    #[test]
    fn test_apology_mentions_overload() {
        assert!(APOLOGY.contains("overloaded"));
    }

    #[test]
    fn test_message_json_shape() {
        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
