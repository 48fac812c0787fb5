//! Centralized error types for Tether.
//!
//! Errors fall into two tiers:
//!
//! - **Tool errors** (`ToolError`) are recovered locally. They never abort a
//!   run; the dispatcher turns them into ordinary tool results so the model
//!   can observe them and react.
//! - **API errors** (`ApiError`) come from the model collaborator and abort
//!   the conversation loop.
//!
//! # Example
//!
//! ```
//! use tether::error::{ToolError, ToolErrorKind};
//!
//! let err = ToolError::path_violation("../etc/passwd", "read");
//! assert_eq!(err.kind(), ToolErrorKind::PathViolation);
//! assert!(err.is_security_related());
//! assert!(err.to_string().contains("outside the permitted working directory"));
//! ```

use std::fmt;
use std::time::Duration;

/// Result type alias for tool operations.
pub type ToolOutcome<T> = Result<T, ToolError>;

// ============== Tool Errors ==============

/// Category of a tool-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolErrorKind {
    /// The path resolves outside the working root.
    PathViolation,
    /// The target is missing or has the wrong type.
    NotFound,
    /// Script execution exceeded its wall-clock bound.
    Timeout,
    /// Non-zero exit, or the interpreter could not be started.
    ExecutionFailure,
    /// The model asked for a tool that is not in the manifest.
    UnknownTool,
    /// Arguments were missing or had the wrong shape.
    InvalidArguments,
    /// Reading or writing failed after the path was accepted.
    Io,
}

impl ToolErrorKind {
    /// Returns a stable snake_case label for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PathViolation => "path_violation",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::ExecutionFailure => "execution_failure",
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recoverable tool failure: a kind plus a human-readable message.
///
/// The message is what the model sees, so it is phrased for the model and
/// names the path or tool it concerns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ToolError {
    kind: ToolErrorKind,
    message: String,
}

impl ToolError {
    /// Creates an error of an arbitrary kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a path violation error. `action` is the verb shown to the model
    /// (e.g. "read", "list", "execute", "write to").
    #[must_use]
    pub fn path_violation(path: &str, action: &str) -> Self {
        Self::new(
            ToolErrorKind::PathViolation,
            format!(
                "Cannot {action} \"{path}\" as it is outside the permitted working directory"
            ),
        )
    }

    /// Creates a not-found (or wrong type) error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            ToolErrorKind::Timeout,
            format!("Process timed out after {} seconds", limit.as_secs()),
        )
    }

    /// Creates an execution failure.
    #[must_use]
    pub fn execution_failure(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailure, message)
    }

    /// Creates an unknown tool error.
    #[must_use]
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ToolErrorKind::UnknownTool, format!("Unknown function: {name}"))
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(tool: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ToolErrorKind::InvalidArguments,
            format!("Invalid arguments for {tool}: {reason}"),
        )
    }

    /// Creates an I/O error from the underlying failure.
    #[must_use]
    pub fn io(err: &std::io::Error) -> Self {
        Self::new(ToolErrorKind::Io, err.to_string())
    }

    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ToolErrorKind {
        self.kind
    }

    /// Returns the message shown to the model.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error reflects an attempted sandbox escape.
    ///
    /// Security errors are logged at warn level by the dispatcher.
    #[must_use]
    pub fn is_security_related(&self) -> bool {
        matches!(self.kind, ToolErrorKind::PathViolation)
    }
}

// ============== API Errors ==============

/// Failure reported by the model collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request could not be sent or the body could not be read.
    #[error("api: network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api: request failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("api: invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Returns `true` if the failure is an authentication rejection.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

// ============== Run Termination ==============

/// Why a conversation ended without a final answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbortReason {
    /// The iteration ceiling was reached while the model still wanted tools.
    #[error("reached the maximum of {max_iterations} iterations without a final answer")]
    BudgetExhausted {
        /// The ceiling that was hit.
        max_iterations: usize,
    },

    /// The model collaborator failed.
    #[error("model call failed: {0}")]
    Upstream(String),

    /// A dispatched call produced no matching result.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<ApiError> for AbortReason {
    fn from(err: ApiError) -> Self {
        Self::Upstream(err.to_string())
    }
}

// ============== Unit Tests ==============
