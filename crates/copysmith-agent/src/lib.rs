//! # copysmith-agent
//!
//! Completion-service client, circuit breaker, tool dispatcher, and
//! conversation loop for Copysmith.
//!
//! ## Key pattern
//!
//! Expected failures become data: a tool error, timeout, or unknown name is
//! fed back to the model as an error-string result, and a malformed final
//! answer is salvaged by the extractor. Only structural failures (circuit
//! open, turn budget exhausted, transport errors) propagate as
//! `CopysmithError`.

mod circuit_breaker;
mod client;
mod conversation;
mod dispatcher;
mod extractor;
mod types;

pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use client::{AnthropicClient, CompletionService};
pub use conversation::{ConversationLoop, ConversationOutcome};
pub use dispatcher::{Tool, ToolDispatcher, ToolId};
pub use extractor::{extract, parse_structured, salvage, DraftFields, ExtractError};
pub use types::{CompletionRequest, CompletionResponse, StopReason, ToolCatalogEntry};
