//! Tether - a sandboxed tool-execution and conversation engine.
//!
//! A model is given four tools (list, read, run a script, write) confined to
//! one working directory, and is driven in a loop until it answers or runs
//! out of iterations.
//!
//! This library exposes the core types and functionality for testing and extension.

pub mod api;
pub mod app;
pub mod error;
pub mod interpreter;
pub mod tools;
pub mod types;

// Re-export core types for convenient access
pub use error::{AbortReason, ApiError, ToolError, ToolErrorKind};
pub use types::{Config, Message, Role};
