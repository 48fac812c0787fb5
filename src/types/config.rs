//! Configuration types for Tether.
//!
//! [`Config`] is built once per run from command-line flags and an optional
//! settings file, then passed by reference to everything that needs it.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::app::tool_loop::MAX_ITERATIONS;
use crate::interpreter::InterpreterConfig;
use crate::tools::ToolExecutionPolicy;

/// Default model requested from the API.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// Runtime configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the model collaborator.
    pub api_key: SecretString,

    /// Model name.
    pub model: String,

    /// Directory every tool is confined to.
    pub working_dir: PathBuf,

    /// Iteration ceiling for the conversation driver.
    pub max_iterations: usize,

    /// Print the prompt, each tool result and token totals.
    pub verbose: bool,

    /// Limits applied to tool execution.
    pub policy: ToolExecutionPolicy,

    /// Base URL of the Messages API.
    pub api_base_url: String,
}

impl Config {
    /// Creates a configuration with defaults for everything but the key and
    /// the working directory.
    pub fn new(api_key: SecretString, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            working_dir: working_dir.into(),
            max_iterations: MAX_ITERATIONS,
            verbose: false,
            policy: ToolExecutionPolicy::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Errors from loading a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The settings file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid settings TOML.
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// `script_timeout` is not a duration like "30s" or "2m".
    #[error("invalid script_timeout {value:?}: {source}")]
    InvalidDuration {
        /// The rejected value.
        value: String,
        /// Underlying error.
        #[source]
        source: humantime::DurationError,
    },
}

/// Optional overrides read from a TOML settings file.
///
/// ```toml
/// model = "claude-sonnet-4-20250514"
/// max_iterations = 10
/// max_read_chars = 20000
/// script_timeout = "45s"
/// interpreter = "python3.12"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Model name.
    pub model: Option<String>,
    /// Iteration ceiling.
    pub max_iterations: Option<usize>,
    /// ReadFile truncation threshold in characters.
    pub max_read_chars: Option<usize>,
    /// RunScript timeout, as a humantime string.
    pub script_timeout: Option<String>,
    /// Interpreter program for RunScript.
    pub interpreter: Option<String>,
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or has unknown keys.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Applies these settings on top of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `script_timeout` is not a valid duration.
    pub fn apply(&self, config: &mut Config) -> Result<(), SettingsError> {
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(max_read_chars) = self.max_read_chars {
            config.policy.max_read_chars = max_read_chars;
        }
        if let Some(value) = &self.script_timeout {
            config.policy.script_timeout =
                humantime::parse_duration(value).map_err(|source| {
                    SettingsError::InvalidDuration {
                        value: value.clone(),
                        source,
                    }
                })?;
        }
        if let Some(program) = &self.interpreter {
            config.policy.interpreter = InterpreterConfig::new(program.clone());
        }
        Ok(())
    }
}
