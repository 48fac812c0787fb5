//! Sandbox confinement and execution limits.
//!
//! This module provides:
//! - [`WorkingRoot`], the single directory every tool operation is confined to
//! - Path resolution that rejects anything escaping that root
//! - [`ToolExecutionPolicy`], the limits applied by the individual tools
//!
//! # Known limitation
//!
//! Containment is checked once, when the path is resolved. A symlink swapped
//! in between the check and the actual read or write is not detected.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::error::{ToolError, ToolOutcome};
use crate::interpreter::InterpreterConfig;

/// Characters returned by `read_file` before truncation.
pub const MAX_READ_CHARS: usize = 10_000;

/// Wall-clock bound for `run_script`.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extension a file must carry to be run by `run_script`.
pub const SCRIPT_EXTENSION: &str = "py";

/// Limits applied by the individual tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionPolicy {
    /// Characters returned by `read_file` before truncation.
    pub max_read_chars: usize,
    /// Wall-clock bound for `run_script`.
    pub script_timeout: Duration,
    /// Extension a file must carry to be run by `run_script`.
    pub script_extension: String,
    /// Interpreter used by `run_script`.
    pub interpreter: InterpreterConfig,
}

impl Default for ToolExecutionPolicy {
    fn default() -> Self {
        Self {
            max_read_chars: MAX_READ_CHARS,
            script_timeout: SCRIPT_TIMEOUT,
            script_extension: SCRIPT_EXTENSION.to_string(),
            interpreter: InterpreterConfig::default(),
        }
    }
}

/// The directory all tool operations are confined to.
///
/// Established once per run. The stored path is absolute and canonical, so
/// containment checks compare like with like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingRoot {
    path: PathBuf,
}

impl WorkingRoot {
    /// Canonicalizes `path` and uses it as the root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist or is not a directory.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().canonicalize()?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("working root is not a directory: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Returns the canonical root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves `candidate` against the root and checks containment.
    ///
    /// `candidate` may be relative (joined onto the root) or absolute (used
    /// as-is). `..` and `.` are folded lexically, then the deepest existing
    /// ancestor is canonicalized so symlinked segments are followed. The
    /// target itself does not need to exist; a dangling symlink is followed
    /// to where it points. Unreadable or looping links are rejected.
    ///
    /// `action` is the verb used in the error message ("read", "list", ...).
    ///
    /// # Errors
    ///
    /// Returns a `PathViolation` error if the resolved path is not inside the
    /// root.
    pub fn resolve(&self, candidate: &str, action: &str) -> ToolOutcome<PathBuf> {
        let lexical = normalize_lexically(&self.path.join(candidate));

        match canonicalize_lenient(&lexical) {
            Some(resolved) if resolved.starts_with(&self.path) => Ok(resolved),
            resolved => {
                warn!(
                    path = %candidate,
                    resolved = ?resolved,
                    root = %self.path.display(),
                    "Security: path escapes working root"
                );
                Err(ToolError::path_violation(candidate, action))
            }
        }
    }
}

/// Folds `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root, matching how the OS treats
/// `/..`.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Dangling symlinks followed before giving up, matching the usual
/// `SYMLOOP_MAX`.
const MAX_SYMLINK_HOPS: usize = 40;

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// components that do not exist yet.
///
/// A dangling symlink among those components is followed to its target, so
/// a write through it lands where the OS would put it. Returns `None` when a
/// link cannot be read or links loop.
///
/// `path` must already be lexically normalized.
fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_SYMLINK_HOPS {
        match resolve_existing_prefix(&current)? {
            Step::Resolved(resolved) => return Some(resolved),
            Step::Follow(next) => current = next,
        }
    }
    None
}

enum Step {
    Resolved(PathBuf),
    Follow(PathBuf),
}

fn resolve_existing_prefix(path: &Path) -> Option<Step> {
    let mut existing = path;
    let mut missing = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Some(Step::Resolved(append_missing(canonical, &missing)));
        }

        let is_link = std::fs::symlink_metadata(existing)
            .is_ok_and(|m| m.file_type().is_symlink());
        if is_link {
            let target = std::fs::read_link(existing).ok()?;
            // The link entry exists, so its directory does too.
            let parent = existing.parent()?.canonicalize().ok()?;
            let next = normalize_lexically(&parent.join(target));
            return Some(Step::Follow(append_missing(next, &missing)));
        }

        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Some(Step::Resolved(path.to_path_buf())),
        }
    }
}

/// `missing` holds components deepest first.
fn append_missing(base: PathBuf, missing: &[std::ffi::OsString]) -> PathBuf {
    missing.iter().rev().fold(base, |acc, part| acc.join(part))
}
