//! Core type definitions for Tether.
//!
//! - [`config`] - runtime configuration and the settings file
//! - [`content`] - content blocks carried by messages
//! - [`message`] - transcript roles and messages
//!
//! ```
//! use tether::types::{Message, Role};
//!
//! let msg = Message::user("What files are here?");
//! assert_eq!(msg.role, Role::User);
//! ```

pub mod config;
pub mod content;
pub mod message;

pub use config::{Config, Settings};
pub use content::{ContentBlock, StopReason, ToolResultBlock, ToolUseBlock};
pub use message::{Message, Role};
