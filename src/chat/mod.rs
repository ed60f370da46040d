//! Group chat with a scripted assistant.

pub mod engine;
pub mod model;
pub mod responder;

pub use engine::{ChatConfig, ConversationEngine};
pub use model::{ASSISTANT_NAME, DEFAULT_SENDER, Message, WELCOME_TEXT};
pub use responder::{ReplyRule, ScriptedResponder};
