//! Model collaborator.
//!
//! [`ModelClient`] is the seam the conversation driver calls once per
//! iteration. [`AnthropicClient`] implements it against the Messages API
//! with a single non-streaming request per turn.

pub mod tools;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::debug;

use crate::error::ApiError;
use crate::types::content::{ContentBlock, StopReason};
use crate::types::message::{Message, Role};
use tools::ToolDefinition;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

/// Instructions sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful AI coding agent.

When a user asks a question or makes a request, make a function call plan. \
You can perform the following operations:

- List files and directories
- Read file contents
- Execute Python files with optional arguments
- Write or overwrite files

All paths you provide should be relative to the working directory. You do not \
need to specify the working directory in your function calls as it is \
automatically injected for security reasons.";

/// Token counts reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the request.
    pub input_tokens: u64,
    /// Tokens in the response.
    pub output_tokens: u64,
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// One model response.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurn {
    /// Ordered content parts: text and tool_use requests.
    pub content: Vec<ContentBlock>,
    /// Why the model stopped.
    pub stop_reason: StopReason,
    /// Tokens consumed by this turn.
    pub usage: Usage,
}

/// Produces the next model turn for a transcript.
#[allow(async_fn_in_trait)]
pub trait ModelClient {
    /// Sends the whole transcript plus the tool manifest and returns the
    /// model's reply.
    async fn next_turn(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn, ApiError>;
}

/// Messages API client.
#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    tools: &'a [ToolDefinition],
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Vec<&'a ContentBlock>,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<StopReason>,
    #[serde(default)]
    usage: Usage,
}

impl AnthropicClient {
    /// Creates a client for the public API endpoint.
    pub fn new(api_key: SecretString, model: &str) -> Self {
        Self::new_with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Creates a client that sends requests to `base_url` instead.
    pub fn new_with_base_url(api_key: SecretString, model: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The model this client requests.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ModelClient for AnthropicClient {
    async fn next_turn(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn, ApiError> {
        let request = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: SYSTEM_PROMPT,
            tools,
            messages: to_wire(transcript),
        };

        debug!(model = %self.model, messages = request.messages.len(), "Sending request");

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        Ok(ModelTurn {
            content: parsed.content,
            stop_reason: parsed.stop_reason.unwrap_or_default(),
            usage: parsed.usage,
        })
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::Model => "assistant",
        Role::User | Role::Tool => "user",
    }
}

/// Maps transcript messages onto wire messages.
///
/// The wire protocol requires alternating roles, so consecutive messages
/// with the same wire role are merged, keeping block order.
fn to_wire(transcript: &[Message]) -> Vec<ApiMessage<'_>> {
    let mut out: Vec<ApiMessage<'_>> = Vec::with_capacity(transcript.len());
    for message in transcript {
        let role = wire_role(message.role);
        match out.last_mut() {
            Some(last) if last.role == role => last.content.extend(message.content.iter()),
            _ => out.push(ApiMessage {
                role,
                content: message.content.iter().collect(),
            }),
        }
    }
    out
}
