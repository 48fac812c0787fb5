//! Sandboxed tools the model can call.
//!
//! The tool set is closed: [`ToolKind`] enumerates every tool, and a name
//! that does not map onto a variant is answered with an `UnknownTool`
//! failure rather than an error.
//!
//! - [`security`] - working root confinement and execution limits
//! - [`files`] - list, read and write
//! - [`script`] - run a script with a timeout
//! - [`dispatcher`] - name lookup, invocation and the response envelope

pub mod dispatcher;
pub mod files;
pub mod script;
pub mod security;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::{ToolError, ToolOutcome};
use crate::types::content::{ToolResultBlock, ToolUseBlock};
pub use dispatcher::{Dispatch, ToolDispatcher, ToolResponse};
pub use security::{ToolExecutionPolicy, WorkingRoot};

/// Every tool in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// List the direct children of a directory.
    ListFiles,
    /// Read a text file.
    ReadFile,
    /// Run a script through the interpreter.
    RunScript,
    /// Create or overwrite a file.
    WriteFile,
}

impl ToolKind {
    /// All tools, in manifest order.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::ListFiles,
        ToolKind::ReadFile,
        ToolKind::RunScript,
        ToolKind::WriteFile,
    ];

    /// The name the model uses for this tool.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ListFiles => "list_files",
            Self::ReadFile => "read_file",
            Self::RunScript => "run_script",
            Self::WriteFile => "write_file",
        }
    }

    /// Looks up a tool by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// Parses `input` and runs the tool. Never fails; failures are values.
    pub async fn execute(
        &self,
        root: &WorkingRoot,
        policy: &ToolExecutionPolicy,
        input: &Value,
    ) -> ToolResult {
        let outcome = match self {
            Self::ListFiles => match parse_args::<ListFilesArgs>(*self, input) {
                Ok(args) => files::list_directory(root, &args.directory).await,
                Err(e) => Err(e),
            },
            Self::ReadFile => match parse_args::<ReadFileArgs>(*self, input) {
                Ok(args) => files::read_file(root, &args.file_path, policy.max_read_chars).await,
                Err(e) => Err(e),
            },
            Self::RunScript => match parse_args::<RunScriptArgs>(*self, input) {
                Ok(args) => script::run_script(root, &args.file_path, &args.args, policy).await,
                Err(e) => Err(e),
            },
            Self::WriteFile => match parse_args::<WriteFileArgs>(*self, input) {
                Ok(args) => files::write_file(root, &args.file_path, &args.content).await,
                Err(e) => Err(e),
            },
        };
        outcome.into()
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
struct ListFilesArgs {
    #[serde(default = "current_dir")]
    directory: String,
}

fn current_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct RunScriptArgs {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    file_path: String,
    content: String,
}

/// A missing input is treated as an empty object so argument-free calls
/// fall back to defaults.
fn parse_args<T: DeserializeOwned>(tool: ToolKind, input: &Value) -> ToolOutcome<T> {
    let input = match input {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(input).map_err(|e| ToolError::invalid_arguments(tool.name(), e))
}

/// A tool call as requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Identifier echoed back in the result.
    pub id: String,
    /// Tool name as the model spelled it.
    pub name: String,
    /// JSON arguments.
    pub input: Value,
}

impl From<&ToolUseBlock> for ToolCall {
    fn from(block: &ToolUseBlock) -> Self {
        Self {
            id: block.id.clone(),
            name: block.name.clone(),
            input: block.input.clone(),
        }
    }
}

/// Outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    /// The tool ran and produced this output.
    Success(String),
    /// The tool failed.
    Failure(ToolError),
}

impl ToolResult {
    /// Returns true for `Success`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Renders the result as the text the model sees.
    ///
    /// Failures are prefixed with `Error: `.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Success(text) => text.clone(),
            Self::Failure(err) => format!("Error: {err}"),
        }
    }

    /// Converts the result into a tool_result block answering `tool_use_id`.
    #[must_use]
    pub fn to_block(&self, tool_use_id: impl Into<String>) -> ToolResultBlock {
        ToolResultBlock {
            tool_use_id: tool_use_id.into(),
            content: self.render(),
            is_error: !self.is_success(),
        }
    }
}

impl From<ToolOutcome<String>> for ToolResult {
    fn from(outcome: ToolOutcome<String>) -> Self {
        match outcome {
            Ok(text) => Self::Success(text),
            Err(err) => Self::Failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use serde_json::json;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(ToolKind::from_name("read_file"), Some(ToolKind::ReadFile));
        assert_eq!(ToolKind::from_name("READ_FILE"), Some(ToolKind::ReadFile));
        assert_eq!(ToolKind::from_name("Run_Script"), Some(ToolKind::RunScript));
        assert_eq!(ToolKind::from_name("bash"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_parse_args_defaults_directory() {
        let args: ListFilesArgs = parse_args(ToolKind::ListFiles, &Value::Null).unwrap();
        assert_eq!(args.directory, ".");

        let args: RunScriptArgs =
            parse_args(ToolKind::RunScript, &json!({"file_path": "main.py"})).unwrap();
        assert!(args.args.is_empty());
    }

    #[test]
    fn test_parse_args_missing_field() {
        let err = parse_args::<WriteFileArgs>(ToolKind::WriteFile, &json!({"file_path": "a"}))
            .unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidArguments);
        assert!(err.message().contains("write_file"));
        assert!(err.message().contains("content"));
    }

    #[test]
    fn test_parse_args_wrong_type() {
        let err = parse_args::<RunScriptArgs>(
            ToolKind::RunScript,
            &json!({"file_path": "a.py", "args": "not-a-list"}),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidArguments);
    }

    #[test]
    fn test_render_and_block() {
        let ok = ToolResult::Success("listing".to_string());
        assert_eq!(ok.render(), "listing");
        assert!(!ok.to_block("t1").is_error);

        let failed = ToolResult::Failure(ToolError::unknown_tool("rm"));
        assert_eq!(failed.render(), "Error: Unknown function: rm");
        let block = failed.to_block("t2");
        assert!(block.is_error);
        assert_eq!(block.tool_use_id, "t2");
    }

    #[test]
    fn test_tool_call_from_block() {
        let block = ToolUseBlock::new("t1", "read_file", json!({"file_path": "x"}));
        let call = ToolCall::from(&block);
        assert_eq!(call.id, "t1");
        assert_eq!(call.name, "read_file");
        assert_eq!(call.input["file_path"], "x");
    }
}
