//! Hybrid validator: deterministic check profiles per platform
//!
//! The validator itself is pure. Calling it twice on the same draft yields
//! the same issues in the same order; there is no model involvement here.
//! The model-based half of validation lives in `grading`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use copysmith_agent::Tool;
use copysmith_core::{Platform, Severity, ValidationIssue, ValidationTuning};

use crate::rules;
use crate::structure;

/// Deterministic draft validator
///
/// Holds only tuning; construction is cheap and the instance is freely
/// shareable.
#[derive(Debug, Clone, Default)]
pub struct HybridValidator {
    tuning: ValidationTuning,
}

impl HybridValidator {
    pub fn new(tuning: ValidationTuning) -> Self {
        Self { tuning }
    }

    /// Run the full check profile for `platform` over `content`.
    /// Issues come back ordered by severity, highest first, with ties kept
    /// in check order.
    pub fn validate(&self, content: &str, platform: Platform) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        // Checks shared by every platform
        issues.extend(rules::check_banned_phrases(content));
        issues.extend(rules::check_vague_language(content));
        issues.extend(rules::check_filler_phrases(content));
        issues.extend(rules::check_fabricated_examples(content));
        issues.extend(rules::check_contrast_framing(content, &self.tuning));
        issues.extend(structure::check_length(content, platform));

        match platform {
            Platform::LinkedIn => {
                issues.extend(structure::check_sections(content));
                issues.extend(structure::check_hook(content));
                issues.extend(structure::check_cta(content));
            }
            Platform::Twitter => {
                issues.extend(structure::check_hook(content));
            }
            Platform::Email => {
                let (subject, body) = structure::split_email(content);
                issues.extend(structure::check_subject(subject));
                issues.extend(structure::check_spam_triggers(body));
                issues.extend(structure::check_urgency(body));
                issues.extend(structure::check_social_proof(body));
                issues.extend(structure::check_cta(body));
            }
        }

        issues.sort_by(|a, b| b.severity.cmp(&a.severity));
        debug!(
            platform = %platform,
            count = issues.len(),
            "validation pass complete"
        );
        issues
    }

    /// Highest severity present, if any issues were found
    pub fn max_severity(issues: &[ValidationIssue]) -> Option<Severity> {
        issues.iter().map(|i| i.severity).max()
    }
}

#[derive(Debug, Deserialize)]
struct ValidationToolInput {
    content: String,
    #[serde(default)]
    platform: Option<Platform>,
}

/// The `content_validation` composite tool: exposes the deterministic
/// validator to the conversation loop so the writer can self-check a
/// draft before finalizing it.
pub struct ValidationTool {
    validator: HybridValidator,
}

impl ValidationTool {
    pub fn new(validator: HybridValidator) -> Self {
        Self { validator }
    }

    pub fn input_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "Draft text to validate" },
                "platform": { "type": "string", "enum": ["linkedin", "email", "twitter"] }
            },
            "required": ["content"]
        })
    }
}

#[async_trait]
impl Tool for ValidationTool {
    async fn run(&self, input: serde_json::Value) -> std::result::Result<String, String> {
        let input: ValidationToolInput =
            serde_json::from_value(input).map_err(|e| format!("Invalid input: {}", e))?;
        let platform = input.platform.unwrap_or_default();
        let issues = self.validator.validate(&input.content, platform);

        if issues.is_empty() {
            return Ok("No issues found.".to_string());
        }
        let mut report = format!("{} issue(s) found:\n", issues.len());
        for issue in &issues {
            report.push_str(&format!("- [{}] {}: {}\n", issue.severity, issue.code, issue.message));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_LINKEDIN: &str = "What would you ship if reviews took an hour instead of four days?\n\n\
        Last quarter our team of 6 cut review turnaround from 4 days to 6 hours. We did it by batching \
        edits into a single daily pass and assigning one owner per draft.\n\n\
        1. Batch all edits into one daily review window\n\
        2. Give every draft exactly one accountable owner\n\
        3. Track turnaround weekly and publish the number\n\n\
        The polish cost us nothing. The waiting cost us two launches a year.\n\n\
        How long does a review take on your team? Let me know in the comments.";

    #[test]
    fn test_clean_draft_passes() {
        let validator = HybridValidator::default();
        let issues = validator.validate(CLEAN_LINKEDIN, Platform::LinkedIn);
        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
    }

    #[test]
    fn test_issues_sorted_by_severity_descending() {
        let validator = HybridValidator::default();
        // Banned phrase (high) and vague language (medium) together
        let content = format!(
            "{} This is kind of a game-changer.",
            CLEAN_LINKEDIN
        );
        let issues = validator.validate(&content, Platform::LinkedIn);
        assert!(issues.len() >= 2);
        for pair in issues.windows(2) {
            assert!(pair[0].severity >= pair[1].severity);
        }
        assert_eq!(issues[0].code, "banned_phrase");
    }

    #[test]
    fn test_validator_is_deterministic() {
        let validator = HybridValidator::default();
        let content = "Rather than guessing, we guessed. It was kind of a paradigm shift.";
        let a = validator.validate(content, Platform::Twitter);
        let b = validator.validate(content, Platform::Twitter);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.code, y.code);
            assert_eq!(x.span, y.span);
        }
    }

    #[test]
    fn test_email_profile_runs_subject_checks() {
        let validator = HybridValidator::default();
        let issues = validator.validate("No subject here, just a body.", Platform::Email);
        assert!(issues.iter().any(|i| i.code == "subject_missing"));
    }

    #[tokio::test]
    async fn test_validation_tool_reports_issues() {
        let tool = ValidationTool::new(HybridValidator::default());
        let output = tool
            .run(json!({ "content": "This tool is a game-changer.", "platform": "twitter" }))
            .await
            .unwrap();
        assert!(output.contains("banned_phrase"));
    }

    #[tokio::test]
    async fn test_validation_tool_rejects_bad_input() {
        let tool = ValidationTool::new(HybridValidator::default());
        let err = tool.run(json!({ "platform": "twitter" })).await.unwrap_err();
        assert!(err.contains("Invalid input"));
    }
}
