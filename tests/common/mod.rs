//! Common test utilities and fixtures for Tether.
//!
//! - `TestContext`: a temporary working root with file helpers
//! - `ScriptedModel`: a `ModelClient` that replays canned turns

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use tether::api::tools::ToolDefinition;
use tether::api::{ModelClient, ModelTurn, Usage};
use tether::tools::{ToolDispatcher, WorkingRoot};
use tether::types::{ContentBlock, Message, StopReason};
use tether::ApiError;

/// Test context providing a temporary working root.
pub struct TestContext {
    /// Temporary directory used as the working root.
    pub temp_dir: tempfile::TempDir,
}

impl TestContext {
    /// Creates a new test context with a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Returns the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Returns the temporary directory as a working root.
    pub fn root(&self) -> WorkingRoot {
        WorkingRoot::new(self.temp_dir.path()).expect("temp dir is a valid root")
    }

    /// Returns a dispatcher confined to the temporary directory.
    pub fn dispatcher(&self) -> ToolDispatcher {
        ToolDispatcher::new(self.root())
    }

    /// Creates a file in the temporary directory with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("failed to write file");
        path
    }

    /// Creates a directory (and its parents) in the temporary directory.
    pub fn create_dir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("failed to create dir");
        path
    }

    /// Every file under `dir` with its content, keyed by relative path.
    pub fn snapshot_of(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut out = BTreeMap::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            for entry in std::fs::read_dir(&current).expect("readable dir") {
                let path = entry.expect("dir entry").path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let rel = path.strip_prefix(dir).expect("under dir").to_path_buf();
                    out.insert(rel, std::fs::read(&path).expect("readable file"));
                }
            }
        }
        out
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A `ModelClient` that replays a fixed list of turns and records every
/// transcript it was sent.
pub struct ScriptedModel {
    turns: RefCell<VecDeque<Result<ModelTurn, ApiError>>>,
    repeat: Option<Vec<ContentBlock>>,
    /// Transcript length seen on each call.
    pub seen: RefCell<Vec<usize>>,
}

impl ScriptedModel {
    /// Replays `turns` in order, then fails.
    pub fn new(turns: Vec<Result<ModelTurn, ApiError>>) -> Self {
        Self {
            turns: RefCell::new(turns.into()),
            repeat: None,
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Answers every call with `content`, forever.
    pub fn always(content: Vec<ContentBlock>) -> Self {
        Self {
            turns: RefCell::new(VecDeque::new()),
            repeat: Some(content),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl ModelClient for ScriptedModel {
    async fn next_turn(
        &self,
        transcript: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<ModelTurn, ApiError> {
        self.seen.borrow_mut().push(transcript.len());
        if let Some(content) = &self.repeat {
            return Ok(turn(content.clone()));
        }
        self.turns
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::InvalidResponse("no more scripted turns".into())))
    }
}

/// A successful turn with fixed token usage.
pub fn turn(content: Vec<ContentBlock>) -> ModelTurn {
    let stop_reason = if content.iter().any(|b| b.as_tool_use().is_some()) {
        StopReason::ToolUse
    } else {
        StopReason::EndTurn
    };
    ModelTurn {
        content,
        stop_reason,
        usage: Usage {
            input_tokens: 100,
            output_tokens: 10,
        },
    }
}
