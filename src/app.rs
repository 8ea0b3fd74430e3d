use tokio::sync::mpsc;

use crate::chat::ChatView;
use crate::client::{AssistantClient, RequestFailed};
use crate::tui::AppEvent;

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub chat: ChatView,
    pub cursor: usize, // cursor position in chat.input, in chars

    // Transcript viewport
    pub scroll: u16,
    pub follow_tail: bool, // keep the newest message in view
    pub chat_height: u16,  // inner height of the transcript, set during render
    pub chat_width: u16,   // inner width of the transcript, set during render

    pub animation_frame: u8,

    pub client: AssistantClient,
    replies: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: AssistantClient, replies: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            chat: ChatView::new(),
            cursor: 0,
            scroll: 0,
            follow_tail: true,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            client,
            replies,
        }
    }

    /// Submit the input buffer and send it to the assistant in the background.
    ///
    /// The reply comes back through the event channel as `AppEvent::Reply`.
    /// Returns false if the submission was rejected (blank input or a request
    /// already in flight).
    pub fn submit_input(&mut self) -> bool {
        let text = self.chat.input.clone();
        let Some(message) = self.chat.submit(&text) else {
            return false;
        };

        self.cursor = 0;
        self.animation_frame = 0;
        self.follow_tail = true;

        let client = self.client.clone();
        let replies = self.replies.clone();
        tokio::spawn(async move {
            let outcome = client.chat(&message).await;
            if replies.send(AppEvent::Reply(outcome)).is_err() {
                tracing::debug!("UI loop gone before reply arrived");
            }
        });
        true
    }

    pub fn receive_reply(&mut self, outcome: Result<String, RequestFailed>) {
        self.chat.receive(outcome);
        self.follow_tail = true;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    /// Scrolling past the bottom is clamped at render time, which also turns
    /// tail-following back on.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn page_size(&self) -> u16 {
        if self.chat_height > 0 {
            (self.chat_height / 2).max(1)
        } else {
            10
        }
    }

    /// Fit the scroll offset to a transcript of `total_lines` rows
    pub fn clamp_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_tail || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.follow_tail = true;
        }
    }
}
