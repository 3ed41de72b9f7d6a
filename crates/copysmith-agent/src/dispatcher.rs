//! Tool dispatcher
//!
//! Executes named tools requested by the completion service with a per-call
//! timeout. Every failure mode - unknown name, timeout, error, panic - is
//! converted into an error-string `ToolCallResult` so the conversation loop
//! always has exactly one result to feed back per request.

use crate::types::ToolCatalogEntry;
use async_trait::async_trait;
use copysmith_core::{ToolCallRequest, ToolCallResult, ToolTimeouts};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Closed set of tools the completion service may request
///
/// Unsupported names never reach a handler; they map to an explicit
/// unknown-tool error result in [`ToolDispatcher::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    /// Research lookup against an external source
    ResearchLookup,
    /// Sub-generator for a content fragment (hook, CTA, subject line)
    SnippetGenerator,
    /// Composite validation: grading plus pattern detection sub-calls
    ContentValidation,
}

impl ToolId {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "research_lookup" => Some(ToolId::ResearchLookup),
            "snippet_generator" => Some(ToolId::SnippetGenerator),
            "content_validation" => Some(ToolId::ContentValidation),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolId::ResearchLookup => "research_lookup",
            ToolId::SnippetGenerator => "snippet_generator",
            ToolId::ContentValidation => "content_validation",
        }
    }

    /// Composite tools fan out to grading and detection sub-calls and get
    /// a budget equal to the sum of the sub-call budgets plus margin.
    pub fn is_composite(&self) -> bool {
        matches!(self, ToolId::ContentValidation)
    }
}

/// A tool implementation
///
/// Errors are plain strings; they are fed back to the model verbatim, not
/// raised. Implementations must be safe to call concurrently.
#[async_trait]
pub trait Tool: Send + Sync {
    async fn run(&self, input: serde_json::Value) -> std::result::Result<String, String>;
}

struct RegisteredTool {
    entry: ToolCatalogEntry,
    handler: Arc<dyn Tool>,
}

/// Dispatches tool-call requests to registered handlers
pub struct ToolDispatcher {
    registry: HashMap<ToolId, RegisteredTool>,
    timeouts: ToolTimeouts,
}

impl ToolDispatcher {
    pub fn new(timeouts: ToolTimeouts) -> Self {
        Self {
            registry: HashMap::new(),
            timeouts,
        }
    }

    /// Register a handler for one tool identifier
    pub fn register(
        &mut self,
        id: ToolId,
        description: impl Into<String>,
        input_schema: serde_json::Value,
        handler: Arc<dyn Tool>,
    ) {
        self.registry.insert(
            id,
            RegisteredTool {
                entry: ToolCatalogEntry {
                    name: id.name().to_string(),
                    description: description.into(),
                    input_schema,
                },
                handler,
            },
        );
    }

    /// Catalog entries for every registered tool, for the completion request
    pub fn catalog(&self) -> Vec<ToolCatalogEntry> {
        let mut entries: Vec<ToolCatalogEntry> = self
            .registry
            .values()
            .map(|t| t.entry.clone())
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Execute one tool-call request
    ///
    /// Always returns within the per-tool budget plus scheduling slack, and
    /// always returns a well-formed result; tool failures never propagate.
    pub async fn execute(&self, request: &ToolCallRequest) -> ToolCallResult {
        let Some(id) = ToolId::parse(&request.tool_name) else {
            tracing::warn!(tool = %request.tool_name, "Unknown tool requested");
            return ToolCallResult::error(
                &request.call_id,
                format!("Unknown tool: '{}'", request.tool_name),
            );
        };

        let Some(tool) = self.registry.get(&id) else {
            return ToolCallResult::error(
                &request.call_id,
                format!("Tool '{}' is not available in this workflow", id.name()),
            );
        };

        let budget = if id.is_composite() {
            Duration::from_secs(self.timeouts.composite_secs)
        } else {
            Duration::from_secs(self.timeouts.general_secs)
        };

        tracing::debug!(tool = id.name(), budget_secs = budget.as_secs(), "Executing tool");

        // Run on a separate task so a panicking tool surfaces as a JoinError
        // instead of unwinding through the conversation loop.
        let handler = Arc::clone(&tool.handler);
        let input = request.input.clone();
        let handle = tokio::spawn(async move { handler.run(input).await });

        match tokio::time::timeout(budget, handle).await {
            Ok(Ok(Ok(content))) => ToolCallResult::ok(&request.call_id, content),
            Ok(Ok(Err(e))) => {
                tracing::warn!(tool = id.name(), error = %e, "Tool execution failed");
                ToolCallResult::error(
                    &request.call_id,
                    format!("Tool '{}' failed: {}", id.name(), e),
                )
            }
            Ok(Err(join_err)) => {
                tracing::error!(tool = id.name(), "Tool task panicked: {}", join_err);
                ToolCallResult::error(
                    &request.call_id,
                    format!("Tool '{}' failed: internal error", id.name()),
                )
            }
            Err(_) => {
                tracing::warn!(tool = id.name(), "Tool timed out");
                ToolCallResult::error(
                    &request.call_id,
                    format!(
                        "Tool '{}' timed out after {}s",
                        id.name(),
                        budget.as_secs()
                    ),
                )
            }
        }
    }
}
