//! Script interpreter configuration.
//!
//! `run_script` never invokes a shell. It spawns an interpreter binary
//! directly with the script path and the forwarded arguments, so argument
//! strings from the model are never re-parsed.
//!
//! # Examples
//!
//! ```
//! use tether::interpreter::InterpreterConfig;
//! use std::path::Path;
//!
//! let config = InterpreterConfig::default();
//! let cmd = config.build_command(Path::new("/work/main.py"), &["3 + 5".to_string()]);
//! // On Unix: python3 /work/main.py "3 + 5"
//! # let _ = cmd;
//! ```

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Interpreter used to run scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct InterpreterConfig {
    /// Interpreter executable (e.g. "python3").
    pub program: String,
    /// Arguments placed before the script path (e.g. ["-u"]).
    pub args: Vec<String>,
}

#[cfg(unix)]
impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: Vec::new(),
        }
    }
}

#[cfg(windows)]
impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: Vec::new(),
        }
    }
}

impl InterpreterConfig {
    /// Creates a config for the given program with no leading arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builds the command for `script` with `script_args` forwarded verbatim.
    ///
    /// Stdout and stderr are piped, stdin is closed, and the child is killed
    /// if the command handle is dropped before it exits. On unix the child
    /// leads a new process group.
    #[must_use]
    pub fn build_command(&self, script: &Path, script_args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(script)
            .args(script_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}
