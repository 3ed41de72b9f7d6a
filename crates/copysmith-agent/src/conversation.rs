//! Bounded multi-turn conversation loop
//!
//! Drives completion-service calls, dispatching tool requests and feeding
//! the results back, until the model emits a final answer or the turn
//! budget is exhausted. Turns are strictly sequential: every tool call in
//! a turn receives exactly one result, in request order, before the next
//! model call is made.

use crate::circuit_breaker::CircuitBreaker;
use crate::client::CompletionService;
use crate::dispatcher::ToolDispatcher;
use crate::types::{CompletionRequest, StopReason};
use copysmith_core::{ConversationMessage, CopysmithError, Result, Usage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timeout for the first completion call in a run; larger to account for
/// the cold cached context.
const FIRST_TURN_TIMEOUT: Duration = Duration::from_secs(90);

/// Timeout for subsequent completion calls.
const TURN_TIMEOUT: Duration = Duration::from_secs(45);

/// Outcome of a conversation run that reached a final answer
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    /// Final text content from the model
    pub text: String,
    /// True when the response was cut off at the token limit; partial
    /// content is still returned, not treated as failure
    pub truncated: bool,
    /// Completion-service turns actually performed
    pub turns: usize,
    /// Token usage accumulated across all turns
    pub total_usage: Usage,
}

/// Multi-turn conversation driver
///
/// Owns its message history exclusively for the lifetime of one `run`;
/// messages are appended, never mutated.
pub struct ConversationLoop {
    service: Arc<dyn CompletionService>,
    dispatcher: Arc<ToolDispatcher>,
    /// Breaker guarding the completion-service integration point
    breaker: Arc<CircuitBreaker>,
    max_tokens: usize,
}

impl ConversationLoop {
    pub fn new(
        service: Arc<dyn CompletionService>,
        dispatcher: Arc<ToolDispatcher>,
        breaker: Arc<CircuitBreaker>,
        max_tokens: usize,
    ) -> Self {
        Self {
            service,
            dispatcher,
            breaker,
            max_tokens,
        }
    }

    /// Run the loop until the model finishes or `max_iterations` turns pass
    ///
    /// Per turn:
    /// 1. Send history plus system context and tool catalog.
    /// 2. `tool_use`: dispatch every tool-call block, append the assistant
    ///    blocks and one user message with all results, continue.
    /// 3. `end_turn`: return the text. `max_tokens`: return partial text
    ///    with a truncation warning. Anything else: error.
    ///
    /// Exhausting the budget without a final answer raises
    /// [`CopysmithError::MaxIterationsExceeded`]; callers decide whether to
    /// fall back.
    pub async fn run(
        &self,
        initial_message: &str,
        system_context: &str,
        max_iterations: usize,
    ) -> Result<ConversationOutcome> {
        let mut messages = vec![ConversationMessage::user(initial_message)];
        let mut total_usage = Usage::default();

        for turn in 1..=max_iterations {
            debug!(turn, max_iterations, "Sending conversation turn");

            let timeout = if turn == 1 {
                FIRST_TURN_TIMEOUT
            } else {
                TURN_TIMEOUT
            };
            let request = CompletionRequest {
                system: Some(system_context.to_string()),
                messages: messages.clone(),
                tools: self.dispatcher.catalog(),
                max_tokens: self.max_tokens,
            };

            let service = Arc::clone(&self.service);
            let response = self
                .breaker
                .call_async(|| async move {
                    match tokio::time::timeout(timeout, service.complete(request)).await {
                        Ok(result) => result,
                        Err(_) => Err(CopysmithError::Api(format!(
                            "Completion call timed out after {}s",
                            timeout.as_secs()
                        ))),
                    }
                })
                .await?;

            if let Some(usage) = &response.usage {
                total_usage.add(usage);
            }

            match response.stop_reason {
                StopReason::ToolUse => {
                    let calls = response.tool_calls();
                    if calls.is_empty() {
                        return Err(CopysmithError::UnexpectedStopReason(
                            "tool_use with no tool calls".to_string(),
                        ));
                    }

                    info!(turn, count = calls.len(), "Model requested tool calls");

                    // One result per call, in request order, before the next
                    // model call. Never send a partial turn.
                    let mut result_blocks = Vec::with_capacity(calls.len());
                    for call in &calls {
                        let result = self.dispatcher.execute(call).await;
                        result_blocks.push(result.into_block());
                    }

                    messages.push(ConversationMessage::assistant_blocks(response.content));
                    messages.push(ConversationMessage::user_blocks(result_blocks));
                }
                StopReason::EndTurn => {
                    info!(turn, "Conversation complete");
                    return Ok(ConversationOutcome {
                        text: response.text(),
                        truncated: false,
                        turns: turn,
                        total_usage,
                    });
                }
                StopReason::MaxTokens => {
                    warn!(turn, "Response truncated at token limit, keeping partial content");
                    return Ok(ConversationOutcome {
                        text: response.text(),
                        truncated: true,
                        turns: turn,
                        total_usage,
                    });
                }
                StopReason::Other(reason) => {
                    return Err(CopysmithError::UnexpectedStopReason(reason));
                }
            }
        }

        Err(CopysmithError::MaxIterationsExceeded {
            limit: max_iterations,
        })
    }
}
