pub mod loop_worker;
pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

pub use loop_worker::poll_loop;
pub use telegram::{ChatDestination, TelegramClient};

/// One received chat message, reduced to what the tracker looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: i64,
    /// Sender username without `@`, when the sender has one.
    pub sender: Option<String>,
    pub text: Option<String>,
}

impl InboundMessage {
    /// True for `/name` and `/name@somebot`, with or without arguments.
    pub fn is_command(&self, name: &str) -> bool {
        let Some(first) = self.text.as_deref().and_then(|t| t.split_whitespace().next()) else {
            return false;
        };
        let Some(command) = first.strip_prefix('/') else {
            return false;
        };
        command.split('@').next() == Some(name)
    }
}

/// Outbound side of the chat transport: deliver text to the configured chat.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: Option<&str>) -> InboundMessage {
        InboundMessage {
            chat_id: 1,
            sender: None,
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn recognizes_commands() {
        assert!(message(Some("/status")).is_command("status"));
        assert!(message(Some("  /status@pointwatch_bot now")).is_command("status"));
        assert!(!message(Some("/statuses")).is_command("status"));
        assert!(!message(Some("status")).is_command("status"));
        assert!(!message(Some("")).is_command("status"));
        assert!(!message(None).is_command("status"));
    }
}
