//! Shared type definitions for the Copysmith workflow engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claude model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Opus,
    #[default]
    Sonnet,
    Haiku,
}

impl Model {
    /// Get the API model name
    pub fn api_name(&self) -> &'static str {
        match self {
            Model::Opus => "claude-opus-4-20250514",
            Model::Sonnet => "claude-sonnet-4-5-20250929",
            Model::Haiku => "claude-haiku-3-5-20250929",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Opus => write!(f, "opus"),
            Model::Sonnet => write!(f, "sonnet"),
            Model::Haiku => write!(f, "haiku"),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opus" => Ok(Model::Opus),
            "sonnet" => Ok(Model::Sonnet),
            "haiku" => Ok(Model::Haiku),
            _ => Err(format!("Invalid model: {}. Use opus, sonnet, or haiku.", s)),
        }
    }
}

/// Content platform a draft is written for
///
/// Selects the validation profile: structural and hook checks apply to
/// LinkedIn posts, subject-line and spam-lexicon checks to email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    LinkedIn,
    Email,
    Twitter,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::LinkedIn => write!(f, "linkedin"),
            Platform::Email => write!(f, "email"),
            Platform::Twitter => write!(f, "twitter"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "email" => Ok(Platform::Email),
            "twitter" => Ok(Platform::Twitter),
            _ => Err(format!(
                "Invalid platform: {}. Use linkedin, email, or twitter.",
                s
            )),
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Usage {
    /// Accumulate usage from another API call
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of content inside a conversation message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// Message content: plain text or an ordered list of content blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single message in a conversation
///
/// Owned exclusively by one conversation loop for its lifetime; the loop
/// appends messages, never mutates them in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ConversationMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }
}

/// A tool invocation requested by the completion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    pub input: serde_json::Value,
    pub call_id: String,
}

/// Result of executing one tool call
///
/// Always produced for every request in a turn. A failed execution is
/// encoded here as an error string, never dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn ok(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }

    /// Convert into the wire content block fed back to the model
    pub fn into_block(self) -> ContentBlock {
        ContentBlock::ToolResult {
            tool_use_id: self.call_id,
            content: self.content,
            is_error: self.is_error,
        }
    }
}

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// One finding from the deterministic validation pass
///
/// Immutable once produced; `code` and `message` are always non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Stable identifier for the check that produced this issue
    pub code: String,
    pub severity: Severity,
    /// True only when a deterministic rewrite rule exists for this issue
    pub auto_fixable: bool,
    pub message: String,
    /// Character offsets of the offending span, when known
    pub span: Option<(usize, usize)>,
    pub fix_hint: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        code: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        let code = code.into();
        let message = message.into();
        debug_assert!(!code.is_empty() && !message.is_empty());
        Self {
            code,
            severity,
            auto_fixable: false,
            message,
            span: None,
            fix_hint: None,
        }
    }

    pub fn auto_fixable(mut self) -> Self {
        self.auto_fixable = true;
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Outcome of grading a draft against the rubric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResult {
    /// 0-100; always present. Parse failures substitute a sentinel low
    /// score with error feedback instead of raising.
    pub score: u8,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
    /// Deterministic issues that were not auto-fixed
    pub issues_remaining: Vec<ValidationIssue>,
}

impl GradingResult {
    /// Sentinel score substituted when the grader's output cannot be parsed
    pub const PARSE_FAILURE_SCORE: u8 = 50;

    pub fn parse_failure(detail: impl Into<String>) -> Self {
        Self {
            score: Self::PARSE_FAILURE_SCORE,
            feedback: format!("Could not parse grading response: {}", detail.into()),
            strengths: Vec::new(),
            issues: Vec::new(),
            issues_remaining: Vec::new(),
        }
    }
}

/// One entry in a workflow's revision history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub iteration: usize,
    pub score: u8,
    pub issues: Vec<String>,
    pub feedback: String,
}

/// Final output of one quality-gated workflow invocation
///
/// Created once per top-level run; immutable once returned. A draft below
/// the target score is still returned here with full grading attached so
/// the caller can flag it rather than failing the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: Uuid,
    pub platform: Platform,
    pub draft: String,
    pub grading: GradingResult,
    /// Number of reviser invocations actually performed
    pub iterations: usize,
    pub revision_history: Vec<RevisionRecord>,
    pub total_usage: Usage,
    pub completed_at: DateTime<Utc>,
}

impl WorkflowResult {
    /// Whether the final draft met the quality gate
    pub fn met_target(&self, target_score: u8) -> bool {
        self.grading.score >= target_score
    }
}

/// Brief describing what the writer should produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    pub platform: Platform,
    pub topic: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Brief {
    pub fn new(platform: Platform, topic: impl Into<String>) -> Self {
        Self {
            platform,
            topic: topic.into(),
            audience: None,
            notes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_api_names() {
        assert_eq!(Model::Opus.api_name(), "claude-opus-4-20250514");
        assert_eq!(Model::Sonnet.api_name(), "claude-sonnet-4-5-20250929");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("linkedin".parse::<Platform>().unwrap(), Platform::LinkedIn);
        assert_eq!("EMAIL".parse::<Platform>().unwrap(), Platform::Email);
        assert!("mastodon".parse::<Platform>().is_err());
    }

    #[test]
    fn test_content_block_wire_format() {
        let block = ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "research".to_string(),
            input: serde_json::json!({"query": "q"}),
        };
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["name"], "research");
    }

    #[test]
    fn test_tool_result_into_block() {
        let result = ToolCallResult::error("call_2", "tool failed");
        match result.into_block() {
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                assert_eq!(tool_use_id, "call_2");
                assert_eq!(content, "tool failed");
                assert!(is_error);
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_grading_parse_failure_sentinel() {
        let grading = GradingResult::parse_failure("unterminated string");
        assert_eq!(grading.score, GradingResult::PARSE_FAILURE_SCORE);
        assert!(grading.feedback.contains("Could not parse"));
    }

    #[test]
    fn test_usage_accumulation() {
        let mut total = Usage::default();
        total.add(&Usage {
            input_tokens: 100,
            output_tokens: 20,
        });
        total.add(&Usage {
            input_tokens: 50,
            output_tokens: 5,
        });
        assert_eq!(total.input_tokens, 150);
        assert_eq!(total.output_tokens, 25);
    }
}
