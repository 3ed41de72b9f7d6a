//! Wire types for completion-service interactions

use copysmith_core::{ContentBlock, ConversationMessage, ToolCallRequest, Usage};
use serde::{Deserialize, Serialize};

/// Why the completion service stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Model emitted a final answer
    EndTurn,
    /// Model requested one or more tool invocations
    ToolUse,
    /// Response was truncated at the token limit
    MaxTokens,
    /// Anything the service reports that we do not handle
    Other(String),
}

impl StopReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some(other) => StopReason::Other(other.to_string()),
            None => StopReason::Other("missing".to_string()),
        }
    }
}

/// Schema-described tool offered to the completion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCatalogEntry {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// One request to the completion service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolCatalogEntry>,
    pub max_tokens: usize,
}

/// One response from the completion service
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    /// Tool-call requests in the order the model issued them
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolCallRequest {
                    tool_name: name.clone(),
                    input: input.clone(),
                    call_id: id.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}
