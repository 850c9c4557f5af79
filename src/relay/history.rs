use serde::{Deserialize, Serialize};

use crate::model::chat::{ChatMessage, ChatRole};

/// Instruction sent ahead of the first message of a conversation.
pub const SYSTEM_PROMPT: &str = "You are a friendly assistant inside a personal task manager. \
Help the user plan, break down, and prioritize their tasks. Keep answers short and practical.";

/// Only the most recent entries of the history are forwarded upstream.
pub const HISTORY_WINDOW: usize = 10;

/// Role + content pair as sent over the wire (no timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn user(content: impl Into<String>) -> Self {
        WireMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        WireMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for WireMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        };
        WireMessage {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

/// Shape the outgoing message list: the most recent [`HISTORY_WINDOW`]
/// history entries followed by the new user message. When the history is
/// empty the system instruction is prepended to the message itself.
pub fn build_messages(message: &str, history: &[WireMessage]) -> Vec<WireMessage> {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages: Vec<WireMessage> = history[start..].to_vec();

    let outgoing = if messages.is_empty() {
        format!("{SYSTEM_PROMPT}\n\n{message}")
    } else {
        message.to_string()
    };
    messages.push(WireMessage::user(outgoing));
    messages
}
