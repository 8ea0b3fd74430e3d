pub mod app;
pub mod chat;
pub mod client;
pub mod config;
pub mod handler;
pub mod markdown;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use chat::{ChatMessage, ChatRole, ChatView, APOLOGY};
pub use client::{AssistantClient, RequestFailed};
pub use config::Config;
