//! Tool manifest sent to the model.
//!
//! Each [`ToolKind`] has exactly one definition here. The manifest is built
//! once and shared for the lifetime of the process.
//!
//! # Example
//!
//! ```rust
//! use tether::api::tools::default_tools;
//!
//! let tools = default_tools();
//! assert!(tools.iter().any(|t| t.name == "run_script"));
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::tools::ToolKind;

/// A tool definition in Messages API format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// The tool's name.
    pub name: String,

    /// What the tool does; the model reads this to decide when to call it.
    pub description: String,

    /// JSON Schema of the arguments.
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Creates a tool definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

static TOOL_MANIFEST: Lazy<Vec<ToolDefinition>> =
    Lazy::new(|| ToolKind::ALL.iter().map(definition).collect());

/// Returns the full manifest, in [`ToolKind::ALL`] order.
#[must_use]
pub fn default_tools() -> &'static [ToolDefinition] {
    &TOOL_MANIFEST
}

/// Returns the definition of a single tool.
#[must_use]
pub fn definition(kind: &ToolKind) -> ToolDefinition {
    match kind {
        ToolKind::ListFiles => ToolDefinition::new(
            kind.name(),
            "List the files and directories directly inside a directory, with their sizes \
             in bytes and whether each entry is a directory. The path is relative to the \
             working directory.",
            json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "The directory to list, relative to the working directory. Defaults to the working directory itself."
                    }
                },
                "required": []
            }),
        ),
        ToolKind::ReadFile => ToolDefinition::new(
            kind.name(),
            "Read the contents of a text file. Long files are truncated and the output says \
             where. The path is relative to the working directory.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The file to read, relative to the working directory."
                    }
                },
                "required": ["file_path"]
            }),
        ),
        ToolKind::RunScript => ToolDefinition::new(
            kind.name(),
            "Execute a Python file with optional command-line arguments and return its \
             standard output, standard error and exit code. Runs with the working directory \
             as the current directory and a 30 second timeout.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The Python file to run, relative to the working directory."
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Arguments passed to the script. Defaults to none."
                    }
                },
                "required": ["file_path"]
            }),
        ),
        ToolKind::WriteFile => ToolDefinition::new(
            kind.name(),
            "Write content to a file, creating it or overwriting it. The parent directory \
             must already exist. The path is relative to the working directory.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "The file to write, relative to the working directory."
                    },
                    "content": {
                        "type": "string",
                        "description": "The exact content to write."
                    }
                },
                "required": ["file_path", "content"]
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_covers_every_tool() {
        let names: Vec<_> = default_tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_files", "read_file", "run_script", "write_file"]);
    }

    #[test]
    fn test_schemas_are_objects_with_required() {
        for tool in default_tools() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema["required"].is_array(), "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn test_required_arguments() {
        let write = definition(&ToolKind::WriteFile);
        assert_eq!(write.input_schema["required"], json!(["file_path", "content"]));

        let run = definition(&ToolKind::RunScript);
        assert_eq!(run.input_schema["properties"]["args"]["type"], "array");
    }

    #[test]
    fn test_definition_serialization() {
        let json = serde_json::to_string(&definition(&ToolKind::ReadFile)).unwrap();
        assert!(json.contains("\"name\":\"read_file\""));
        assert!(json.contains("\"input_schema\""));
    }
}
