//! Model-based quality grading
//!
//! One completion call per grade, guarded by the grading circuit breaker.
//! A response that cannot be parsed never fails the workflow: it collapses
//! to `GradingResult::parse_failure`, whose sentinel score keeps the
//! revision loop running. Transport errors and an open breaker propagate.

use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use copysmith_agent::{CircuitBreaker, CompletionRequest, CompletionService};
use copysmith_core::{
    ConversationMessage, CopysmithError, GradingResult, Platform, Result, Usage, ValidationIssue,
};

const GRADING_MAX_TOKENS: usize = 1024;

/// Grading is a single completion call over a short prompt
const GRADING_TIMEOUT: Duration = Duration::from_secs(45);

/// Fallback for prose-wrapped responses: pull the score out directly
static SCORE_FALLBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"?score"?\s*[:=]\s*(\d{1,3})"#).expect("score regex"));

#[derive(Debug, Deserialize)]
struct WireGrading {
    score: u8,
    #[serde(default)]
    feedback: String,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    issues: Vec<String>,
}

/// Grades drafts against a fixed editorial rubric
pub struct Grader {
    service: Arc<dyn CompletionService>,
    breaker: Arc<CircuitBreaker>,
}

impl Grader {
    pub fn new(service: Arc<dyn CompletionService>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { service, breaker }
    }

    /// Grade `draft` for `platform`. `issues_remaining` are the
    /// deterministic findings that survived auto-fixing; the grader sees
    /// them so its feedback does not contradict the pattern checks.
    pub async fn grade(
        &self,
        draft: &str,
        platform: Platform,
        issues_remaining: &[ValidationIssue],
    ) -> Result<(GradingResult, Usage)> {
        let prompt = build_rubric_prompt(draft, platform, issues_remaining);
        let request = CompletionRequest {
            system: Some(GRADER_SYSTEM.to_string()),
            messages: vec![ConversationMessage::user(prompt)],
            tools: Vec::new(),
            max_tokens: GRADING_MAX_TOKENS,
        };

        let service = Arc::clone(&self.service);
        let response = self
            .breaker
            .call_async(|| async move {
                match tokio::time::timeout(GRADING_TIMEOUT, service.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(CopysmithError::Api(format!(
                        "Grading call timed out after {}s",
                        GRADING_TIMEOUT.as_secs()
                    ))),
                }
            })
            .await?;

        let usage = response.usage.unwrap_or_default();
        let mut grading = parse_grading(&response.text());
        grading.issues_remaining = issues_remaining.to_vec();
        debug!(score = grading.score, platform = %platform, "draft graded");
        Ok((grading, usage))
    }
}

const GRADER_SYSTEM: &str = "You are a senior marketing editor. Grade drafts \
against the rubric and respond with a single JSON object, nothing else: \
{\"score\": <0-100>, \"feedback\": \"...\", \"strengths\": [...], \"issues\": [...]}";

fn build_rubric_prompt(
    draft: &str,
    platform: Platform,
    issues_remaining: &[ValidationIssue],
) -> String {
    let mut prompt = format!(
        "Grade this {platform} draft on a 0-100 scale.\n\n\
         Rubric:\n\
         - Hook strength and specificity (25)\n\
         - Concrete, verifiable claims over generic ones (25)\n\
         - Fit for {platform} conventions and length (25)\n\
         - Clear single call to action (25)\n\n"
    );
    if !issues_remaining.is_empty() {
        prompt.push_str("Known defects already found by automated checks:\n");
        for issue in issues_remaining {
            prompt.push_str(&format!("- [{}] {}\n", issue.severity, issue.message));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("Draft:\n---\n{draft}\n---"));
    prompt
}

fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the grader's response. Never fails: malformed output becomes
/// the parse-failure sentinel so the caller treats the draft as mediocre
/// rather than erroring out.
pub fn parse_grading(text: &str) -> GradingResult {
    let body = strip_fences(text);

    match serde_json::from_str::<WireGrading>(body) {
        Ok(wire) => GradingResult {
            score: wire.score.min(100),
            feedback: wire.feedback,
            strengths: wire.strengths,
            issues: wire.issues,
            issues_remaining: Vec::new(),
        },
        Err(err) => {
            // Prose-wrapped JSON still often carries a legible score
            if let Some(caps) = SCORE_FALLBACK.captures(body) {
                if let Ok(score) = caps[1].parse::<u8>() {
                    warn!(%err, score, "grading response was not clean JSON; salvaged score");
                    return GradingResult {
                        score: score.min(100),
                        feedback: body.to_string(),
                        strengths: Vec::new(),
                        issues: Vec::new(),
                        issues_remaining: Vec::new(),
                    };
                }
            }
            warn!(%err, "grading response unparseable; substituting sentinel score");
            GradingResult::parse_failure(err.to_string())
        }
    }
}
