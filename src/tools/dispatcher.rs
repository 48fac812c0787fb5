//! Tool dispatch.
//!
//! The dispatcher owns the working root and the execution policy, maps a
//! tool name onto a [`ToolKind`], runs it, and wraps whatever comes back in
//! a [`ToolResponse`]. Unknown names produce a failure response; nothing
//! here returns an error.

use tracing::{debug, info, warn};

use super::security::{ToolExecutionPolicy, WorkingRoot};
use super::{ToolCall, ToolKind, ToolResult};
use crate::error::ToolError;
use crate::types::content::ToolResultBlock;

/// Uniform envelope for the outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    /// The id of the call this answers.
    pub tool_use_id: String,
    /// Normalized (lowercase) tool name.
    pub name: String,
    /// The tool's outcome.
    pub result: ToolResult,
}

impl ToolResponse {
    /// Converts the envelope into the block appended to the transcript.
    #[must_use]
    pub fn to_block(&self) -> ToolResultBlock {
        self.result.to_block(&self.tool_use_id)
    }
}

/// Something that can execute tool calls.
///
/// The conversation driver is generic over this so tests can substitute
/// their own dispatch.
#[allow(async_fn_in_trait)]
pub trait Dispatch {
    /// Executes `call` and returns its response envelope.
    async fn dispatch(&self, call: &ToolCall) -> ToolResponse;
}

/// Dispatches tool calls to the sandboxed tool implementations.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    root: WorkingRoot,
    policy: ToolExecutionPolicy,
    verbose: bool,
}

impl ToolDispatcher {
    /// Creates a dispatcher confined to `root` with the default policy.
    #[must_use]
    pub fn new(root: WorkingRoot) -> Self {
        Self {
            root,
            policy: ToolExecutionPolicy::default(),
            verbose: false,
        }
    }

    /// Replaces the execution policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ToolExecutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Includes full call arguments in the per-call trace.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns the working root.
    #[must_use]
    pub fn root(&self) -> &WorkingRoot {
        &self.root
    }

    /// Returns the execution policy.
    #[must_use]
    pub fn policy(&self) -> &ToolExecutionPolicy {
        &self.policy
    }
}

impl Dispatch for ToolDispatcher {
    async fn dispatch(&self, call: &ToolCall) -> ToolResponse {
        let name = call.name.to_lowercase();

        if self.verbose {
            info!(tool = %name, args = %call.input, "Calling tool");
        } else {
            info!(tool = %name, "Calling tool");
        }

        let result = match ToolKind::from_name(&name) {
            Some(kind) => kind.execute(&self.root, &self.policy, &call.input).await,
            None => ToolResult::Failure(ToolError::unknown_tool(&name)),
        };

        if let ToolResult::Failure(err) = &result {
            if err.is_security_related() {
                warn!(tool = %name, error = %err, "Tool call blocked");
            } else {
                debug!(tool = %name, kind = %err.kind(), error = %err, "Tool call failed");
            }
        }

        ToolResponse {
            tool_use_id: call.id.clone(),
            name,
            result,
        }
    }
}
