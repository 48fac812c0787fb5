//! Conversation driver.
//!
//! Repeatedly asks the model for its next turn, runs the tool calls it
//! requests, and feeds the results back until the model answers without
//! calling a tool or the iteration budget runs out.
//!
//! # State Machine
//!
//! ```text
//! ┌────────────────────┐  tool calls dispatched
//! │ Running(iteration) │ ───────────────────────┐
//! └─────────┬──────────┘ ◄─────────────────────┘
//!           │
//!           ├── no tool calls ────────────► Done(text)
//!           ├── model call failed ────────► Aborted(Upstream)
//!           ├── result id mismatch ───────► Aborted(InvariantViolation)
//!           └── iteration == max ─────────► Aborted(BudgetExhausted)
//! ```

use tracing::{debug, info, warn};

use crate::api::tools::ToolDefinition;
use crate::api::{ModelClient, Usage};
use crate::error::AbortReason;
use crate::tools::{Dispatch, ToolCall, ToolResponse};
use crate::types::content::{extract_text, extract_tool_uses};
use crate::types::message::Message;

/// Default iteration ceiling.
pub const MAX_ITERATIONS: usize = 20;

/// State of one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting on model turn number `iteration` (zero-based).
    Running {
        /// Completed iterations so far.
        iteration: usize,
    },

    /// The model answered without requesting tools.
    Done(String),

    /// The run ended without an answer.
    Aborted(AbortReason),
}

impl ConversationState {
    /// Returns true for `Done` and `Aborted`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running { .. })
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Terminal state.
    pub state: ConversationState,
    /// Full transcript, in conversation order.
    pub transcript: Vec<Message>,
    /// Number of model calls made.
    pub model_calls: usize,
    /// Token usage summed over all model calls.
    pub usage: Usage,
}

impl RunReport {
    /// The final answer, if the run reached `Done`.
    #[must_use]
    pub fn final_text(&self) -> Option<&str> {
        match &self.state {
            ConversationState::Done(text) => Some(text),
            _ => None,
        }
    }
}

type ResultObserver<'a> = Box<dyn Fn(&ToolResponse) + 'a>;

/// Drives a conversation between a model and the tool dispatcher.
pub struct ConversationDriver<'a, M, D> {
    model: &'a M,
    dispatcher: &'a D,
    tools: &'a [ToolDefinition],
    max_iterations: usize,
    on_tool_result: Option<ResultObserver<'a>>,
}

impl<'a, M: ModelClient, D: Dispatch> ConversationDriver<'a, M, D> {
    /// Creates a driver with the default iteration ceiling.
    pub fn new(model: &'a M, dispatcher: &'a D, tools: &'a [ToolDefinition]) -> Self {
        Self {
            model,
            dispatcher,
            tools,
            max_iterations: MAX_ITERATIONS,
            on_tool_result: None,
        }
    }

    /// Sets the iteration ceiling.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Registers a callback invoked with every tool response as it is
    /// appended to the transcript.
    #[must_use]
    pub fn on_tool_result(mut self, observer: impl Fn(&ToolResponse) + 'a) -> Self {
        self.on_tool_result = Some(Box::new(observer));
        self
    }

    /// Runs a conversation seeded with `prompt` to a terminal state.
    pub async fn run(&self, prompt: &str) -> RunReport {
        let mut transcript = vec![Message::user(prompt)];
        let mut usage = Usage::default();
        let mut model_calls = 0;
        let mut state = ConversationState::Running { iteration: 0 };

        while let ConversationState::Running { iteration } = state {
            if iteration >= self.max_iterations {
                warn!(max_iterations = self.max_iterations, "Iteration budget exhausted");
                state = ConversationState::Aborted(AbortReason::BudgetExhausted {
                    max_iterations: self.max_iterations,
                });
                break;
            }
            model_calls += 1;
            state = self.step(iteration, &mut transcript, &mut usage).await;
        }

        RunReport {
            state,
            transcript,
            model_calls,
            usage,
        }
    }

    /// One model call plus the tool calls it requests.
    async fn step(
        &self,
        iteration: usize,
        transcript: &mut Vec<Message>,
        usage: &mut Usage,
    ) -> ConversationState {
        debug!(iteration, messages = transcript.len(), "Requesting model turn");

        let turn = match self.model.next_turn(transcript, self.tools).await {
            Ok(turn) => turn,
            Err(e) => {
                warn!(iteration, error = %e, "Model call failed");
                return ConversationState::Aborted(e.into());
            }
        };

        *usage += turn.usage;
        info!(
            input_tokens = turn.usage.input_tokens,
            output_tokens = turn.usage.output_tokens,
            stop_reason = ?turn.stop_reason,
            "Model turn"
        );

        let calls: Vec<ToolCall> = extract_tool_uses(&turn.content)
            .into_iter()
            .map(ToolCall::from)
            .collect();
        let text = extract_text(&turn.content);
        transcript.push(Message::model(turn.content));

        if calls.is_empty() {
            return ConversationState::Done(text);
        }

        for call in &calls {
            let response = self.dispatcher.dispatch(call).await;
            if response.tool_use_id != call.id {
                return ConversationState::Aborted(AbortReason::InvariantViolation(format!(
                    "tool call {} was answered with result for {:?}",
                    call.id, response.tool_use_id
                )));
            }
            if let Some(observer) = &self.on_tool_result {
                observer(&response);
            }
            transcript.push(Message::tool_result(response.to_block()));
        }

        ConversationState::Running {
            iteration: iteration + 1,
        }
    }
}
