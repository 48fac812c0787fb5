//! Run wiring: builds the working root, dispatcher and model client from a
//! [`Config`] and drives one conversation to completion.

use anyhow::{Context, Result};
use tracing::info;

pub mod tool_loop;

use crate::api::tools::default_tools;
use crate::api::AnthropicClient;
use crate::tools::{ToolDispatcher, ToolResponse, WorkingRoot};
use crate::types::Config;
pub use tool_loop::{ConversationDriver, ConversationState, RunReport};

/// Runs `prompt` against the configured model.
///
/// `on_tool_result` sees every tool response as it is appended.
///
/// # Errors
///
/// Returns an error only if the working directory is unusable. Model and
/// tool failures are reported through the returned [`RunReport`].
pub async fn run(
    config: &Config,
    prompt: &str,
    on_tool_result: impl Fn(&ToolResponse),
) -> Result<RunReport> {
    let root = WorkingRoot::new(&config.working_dir).with_context(|| {
        format!(
            "Working directory {} is not an accessible directory",
            config.working_dir.display()
        )
    })?;
    info!(root = %root.path().display(), model = %config.model, "Starting run");

    let dispatcher = ToolDispatcher::new(root)
        .with_policy(config.policy.clone())
        .with_verbose(config.verbose);
    let client = AnthropicClient::new_with_base_url(
        config.api_key.clone(),
        &config.model,
        &config.api_base_url,
    );

    let report = ConversationDriver::new(&client, &dispatcher, default_tools())
        .with_max_iterations(config.max_iterations)
        .on_tool_result(on_tool_result)
        .run(prompt)
        .await;

    info!(
        model_calls = report.model_calls,
        input_tokens = report.usage.input_tokens,
        output_tokens = report.usage.output_tokens,
        "Run finished"
    );
    Ok(report)
}
