//! Content parts carried by transcript messages.
//!
//! A message is an ordered list of content blocks. The model produces
//! `text` and `tool_use` blocks; the driver answers every `tool_use` with a
//! `tool_result` block carrying the dispatcher's rendered output.
//!
//! The serde representation matches the Messages API wire format, so blocks
//! go over the wire unchanged.
//!
//! # Example
//!
//! ```rust
//! use tether::types::content::{ContentBlock, extract_tool_uses};
//! use serde_json::json;
//!
//! let content = vec![
//!     ContentBlock::text("Let me look around."),
//!     ContentBlock::tool_use("toolu_01", "list_files", json!({"directory": "."})),
//! ];
//!
//! let calls = extract_tool_uses(&content);
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].name, "list_files");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single content part of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },

    /// A tool call requested by the model.
    ToolUse(ToolUseBlock),

    /// The result of a tool call.
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    /// Creates a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a tool_use block.
    #[must_use]
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self::ToolUse(ToolUseBlock::new(id, name, input))
    }

    /// Returns the text if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Returns the tool_use block if this is one.
    #[must_use]
    pub fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            Self::ToolUse(block) => Some(block),
            _ => None,
        }
    }

    /// Returns the tool_result block if this is one.
    #[must_use]
    pub fn as_tool_result(&self) -> Option<&ToolResultBlock> {
        match self {
            Self::ToolResult(block) => Some(block),
            _ => None,
        }
    }
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolUseBlock {
    /// Identifier the matching tool_result must echo back.
    pub id: String,

    /// Tool name as the model spelled it.
    pub name: String,

    /// Arguments as a JSON object.
    pub input: Value,
}

impl ToolUseBlock {
    /// Creates a tool_use block.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// The rendered result of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResultBlock {
    /// The id of the tool_use this answers.
    pub tool_use_id: String,

    /// Rendered output (`Error: ...` for failures).
    pub content: String,

    /// Whether the tool call failed.
    #[serde(default)]
    pub is_error: bool,
}

/// Why the model stopped producing output for a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer.
    #[default]
    EndTurn,

    /// The model wants tool results before continuing.
    ToolUse,

    /// The output hit the token limit.
    MaxTokens,

    /// A stop sequence matched.
    StopSequence,
}

/// Extracts all tool_use blocks, in the order the model produced them.
#[must_use]
pub fn extract_tool_uses(content: &[ContentBlock]) -> Vec<&ToolUseBlock> {
    content.iter().filter_map(ContentBlock::as_tool_use).collect()
}

/// Concatenates all text blocks.
#[must_use]
pub fn extract_text(content: &[ContentBlock]) -> String {
    content
        .iter()
        .filter_map(ContentBlock::as_text)
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_use_block_deserialization() {
        let json = r#"{"type":"tool_use","id":"toolu_abc","name":"read_file","input":{"file_path":"main.py"}}"#;
        let block: ContentBlock = serde_json::from_str(json).expect("should deserialize");

        let tool_use = block.as_tool_use().expect("should be tool_use");
        assert_eq!(tool_use.id, "toolu_abc");
        assert_eq!(tool_use.name, "read_file");
        assert_eq!(tool_use.input["file_path"], "main.py");
    }

    #[test]
    fn test_tool_result_block_serialization() {
        let block = ContentBlock::ToolResult(ToolResultBlock {
            tool_use_id: "toolu_abc".to_string(),
            content: "Error: nope".to_string(),
            is_error: true,
        });
        let json = serde_json::to_string(&block).expect("should serialize");

        assert!(json.contains("\"type\":\"tool_result\""));
        assert!(json.contains("\"tool_use_id\":\"toolu_abc\""));
        assert!(json.contains("\"is_error\":true"));
    }

    #[test]
    fn test_tool_result_is_error_defaults_false() {
        let json = r#"{"type":"tool_result","tool_use_id":"t","content":"ok"}"#;
        let block: ContentBlock = serde_json::from_str(json).expect("should deserialize");
        assert!(!block.as_tool_result().expect("tool_result").is_error);
    }

    #[test]
    fn test_extract_tool_uses_preserves_order() {
        let content = vec![
            ContentBlock::tool_use("1", "write_file", json!({})),
            ContentBlock::text("and then"),
            ContentBlock::tool_use("2", "run_script", json!({})),
        ];

        let names: Vec<_> = extract_tool_uses(&content)
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["write_file", "run_script"]);
    }

    #[test]
    fn test_extract_text_joins_text_blocks() {
        let content = vec![
            ContentBlock::text("Hello "),
            ContentBlock::tool_use("1", "list_files", json!({})),
            ContentBlock::text("world"),
        ];
        assert_eq!(extract_text(&content), "Hello world");
    }

    #[test]
    fn test_stop_reason_deserialization() {
        let reason: StopReason = serde_json::from_str("\"tool_use\"").expect("should parse");
        assert_eq!(reason, StopReason::ToolUse);
        assert_eq!(StopReason::default(), StopReason::EndTurn);
    }
}
