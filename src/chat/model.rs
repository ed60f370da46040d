//! Chat message model.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::groups::MessageSummary;

/// Display name of the scripted assistant.
pub const ASSISTANT_NAME: &str = "AI Bot";

/// Sender name used when the signed-in user has no display name.
pub const DEFAULT_SENDER: &str = "You";

/// First message in every group's log.
pub const WELCOME_TEXT: &str = "Welcome to the group! I'm your AI assistant. I can help coordinate meetups and suggest activities. Just ask!";

/// A single chat message in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub group_id: String,
    pub sender: String,
    #[serde(alias = "isBot")]
    pub is_assistant: bool,
    #[serde(alias = "message")]
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// A message typed by the user.
    pub fn user(group_id: &str, sender: &str, text: &str) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            group_id: group_id.to_string(),
            sender: sender.to_string(),
            is_assistant: false,
            text: text.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// A reply from the scripted assistant.
    pub fn assistant(group_id: &str, text: impl Into<String>) -> Self {
        Self {
            id: format!("msg_bot_{}", Uuid::new_v4()),
            group_id: group_id.to_string(),
            sender: ASSISTANT_NAME.to_string(),
            is_assistant: true,
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// The assistant's greeting that seeds an empty log.
    pub fn welcome(group_id: &str) -> Self {
        Self {
            id: format!("welcome_{}", Uuid::new_v4()),
            ..Self::assistant(group_id, WELCOME_TEXT)
        }
    }

    /// Summary shown in the group list.
    pub fn summary(&self) -> MessageSummary {
        MessageSummary {
            text: self.text.clone(),
            sender: self.sender.clone(),
            timestamp: self.timestamp,
        }
    }
}
