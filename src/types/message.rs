//! Transcript messages.
//!
//! The transcript is an append-only `Vec<Message>`. Its order is the
//! conversation order and it is resent to the model on every iteration, so
//! nothing here reorders or rewrites content.
//!
//! Three roles exist in the transcript. The wire protocol only knows `user`
//! and `assistant`; the mapping happens in [`crate::api`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::content::{extract_text, extract_tool_uses, ContentBlock, ToolResultBlock, ToolUseBlock};

/// Author of a transcript entry.
///
/// # Examples
///
/// ```
/// use tether::types::message::Role;
///
/// assert_eq!(Role::Model.to_string(), "model");
/// assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human prompt.
    User,
    /// Content authored by the model.
    Model,
    /// Tool results fed back to the model.
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Model => write!(f, "model"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// One transcript entry: a role and its ordered content parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// Ordered content parts.
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Creates a message.
    #[must_use]
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    /// Creates a user message with a single text part.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    /// Creates a model message from the blocks the model returned.
    #[must_use]
    pub fn model(content: Vec<ContentBlock>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Creates a tool message carrying one tool result.
    #[must_use]
    pub fn tool_result(result: ToolResultBlock) -> Self {
        Self::new(Role::Tool, vec![ContentBlock::ToolResult(result)])
    }

    /// Concatenated text of all text parts.
    #[must_use]
    pub fn text(&self) -> String {
        extract_text(&self.content)
    }

    /// Tool calls requested in this message, in order.
    #[must_use]
    pub fn tool_uses(&self) -> Vec<&ToolUseBlock> {
        extract_tool_uses(&self.content)
    }
}
