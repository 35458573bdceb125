//! Role-tagged conversation messages.

use serde::{Deserialize, Serialize};

/// A message in a conversation: a role plus text content.
///
/// Messages carry both the prompts sent to completion models and the
/// per-session chat history. Use the constants on [`Message`] for the
/// standard roles.
///
/// ```
/// use ragloom::message::Message;
///
/// let question = Message::user("What is Task Decomposition?");
/// assert!(question.has_role(Message::USER));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Message {
    /// Sender role, typically `user`, `assistant`, or `system`.
    pub role: String,
    /// The text content of the message.
    pub content: String,
}

impl Message {
    /// Human input message role.
    pub const USER: &'static str = "user";
    /// Model response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// Instruction message role.
    pub const SYSTEM: &'static str = "system";

    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }
}
