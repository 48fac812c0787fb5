//! Tether - run a prompt against a model with sandboxed file and script tools

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tether::app::{self, ConversationState};
use tether::types::config::Settings;
use tether::{AbortReason, Config};

#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(about = "Tether - run a prompt against a model with sandboxed file and script tools")]
#[command(version)]
struct Args {
    /// The prompt to send to the model.
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Print the prompt, every tool result and token usage.
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    api_key: Option<secrecy::SecretString>,

    /// Model to use (overrides the settings file)
    #[arg(short, long)]
    model: Option<String>,

    /// Working directory the tools are confined to
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,

    /// Maximum number of model turns (overrides the settings file)
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,

    /// TOML settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let filter = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    // Logs go to stderr; stdout carries the answer.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let prompt = args.prompt.trim();
    if prompt.is_empty() {
        eprintln!("error: the prompt must not be empty");
        return Ok(ExitCode::from(2));
    }

    let config = build_config(&args)?;

    if config.verbose {
        println!("User prompt: {prompt}\n");
    }

    let verbose = config.verbose;
    let report = app::run(&config, prompt, |response| {
        if verbose {
            println!("-> {}", response.result.render());
        }
    })
    .await?;

    if verbose {
        println!("Prompt tokens: {}", report.usage.input_tokens);
        println!("Response tokens: {}", report.usage.output_tokens);
    }

    match report.state {
        ConversationState::Done(text) => {
            println!("Final response:\n{text}");
            Ok(ExitCode::SUCCESS)
        }
        ConversationState::Aborted(AbortReason::BudgetExhausted { max_iterations }) => {
            println!("Maximum iterations ({max_iterations}) reached without a final response.");
            Ok(ExitCode::SUCCESS)
        }
        ConversationState::Aborted(reason) => {
            eprintln!("error: {reason}");
            Ok(ExitCode::FAILURE)
        }
        ConversationState::Running { .. } => {
            anyhow::bail!("conversation ended in a non-terminal state")
        }
    }
}

/// Defaults, then the settings file, then command-line flags.
fn build_config(args: &Args) -> Result<Config> {
    let api_key = args
        .api_key
        .clone()
        .context("No API key: pass --api-key or set ANTHROPIC_API_KEY")?;

    let mut config = Config::new(api_key, &args.directory);
    config.verbose = args.verbose;

    if let Some(path) = &args.config {
        Settings::load(path)?.apply(&mut config)?;
    }
    if let Some(model) = &args.model {
        config.model.clone_from(model);
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    Ok(config)
}
