//! Prompt builders for the writer and reviser steps
//!
//! Constructs prompts that give the model:
//! - The brief (platform, topic, audience, notes)
//! - Platform conventions and the output contract
//! - For revisions: the current draft, remaining issues, and grader feedback

use copysmith_core::{Brief, GradingResult, Platform, ValidationIssue};

/// Output contract shared by writer and reviser prompts
const OUTPUT_CONTRACT: &str = "Respond with a single JSON object and nothing else:\n\
    {\"content\": \"<the full draft>\", \"title\": \"<optional title>\", \
    \"subject\": \"<email subject, email only>\", \"hashtags\": [\"<optional>\"]}";

fn platform_conventions(platform: Platform) -> &'static str {
    match platform {
        Platform::LinkedIn => {
            "Write a LinkedIn post. Open with a hook in the first two lines, \
             alternate short paragraphs with at most one list, close with one \
             clear call to action. 400-2600 characters."
        }
        Platform::Email => {
            "Write a marketing email. Start the content field with a \
             'Subject: ...' line (20-60 characters), then the body. Include \
             one concrete proof point and one clear call to action. Avoid \
             spam-trigger wording."
        }
        Platform::Twitter => {
            "Write a single post of at most 280 characters. Lead with the \
             sharpest claim. No hashtag stuffing."
        }
    }
}

/// System context for a writer conversation-loop run
pub fn build_system_context(platform: Platform) -> String {
    format!(
        "You are a marketing copywriter. {} Use the available tools to look \
         up supporting material before drafting. Never invent statistics, \
         customers, or anecdotes.\n\n{}",
        platform_conventions(platform),
        OUTPUT_CONTRACT
    )
}

/// Initial user message for the writer
pub fn build_writer_prompt(brief: &Brief) -> String {
    let mut prompt = format!("Topic: {}\n", brief.topic);
    if let Some(audience) = &brief.audience {
        prompt.push_str(&format!("Audience: {}\n", audience));
    }
    if let Some(notes) = &brief.notes {
        prompt.push_str(&format!("Notes: {}\n", notes));
    }
    prompt.push_str("\nDraft the content now.");
    prompt
}

/// One-shot reviser prompt: current draft plus everything the quality
/// layer found wrong with it
pub fn build_reviser_prompt(
    draft: &str,
    grading: &GradingResult,
    issues_remaining: &[ValidationIssue],
) -> String {
    let mut prompt = format!(
        "Revise this draft. It scored {}/100.\n\nGrader feedback:\n{}\n",
        grading.score, grading.feedback
    );

    if !grading.issues.is_empty() {
        prompt.push_str("\nGrader issues:\n");
        for issue in &grading.issues {
            prompt.push_str(&format!("- {}\n", issue));
        }
    }

    if !issues_remaining.is_empty() {
        prompt.push_str("\nAutomated checks still failing:\n");
        for issue in issues_remaining {
            prompt.push_str(&format!("- [{}] {}", issue.severity, issue.message));
            if let Some(hint) = &issue.fix_hint {
                prompt.push_str(&format!(" (fix: {})", hint));
            }
            prompt.push('\n');
        }
    }

    prompt.push_str(&format!(
        "\nCurrent draft:\n---\n{}\n---\n\nKeep what works, fix what is listed. {}",
        draft, OUTPUT_CONTRACT
    ));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use copysmith_core::Severity;

    #[test]
    fn test_writer_prompt_includes_brief_fields() {
        let mut brief = Brief::new(Platform::LinkedIn, "faster code review");
        brief.audience = Some("engineering managers".to_string());
        let prompt = build_writer_prompt(&brief);
        assert!(prompt.contains("faster code review"));
        assert!(prompt.contains("engineering managers"));
    }

    #[test]
    fn test_system_context_carries_platform_conventions() {
        let context = build_system_context(Platform::Twitter);
        assert!(context.contains("280"));
        assert!(context.contains("JSON"));
    }

    #[test]
    fn test_reviser_prompt_lists_remaining_issues() {
        let grading = GradingResult {
            score: 70,
            feedback: "Hook is weak.".to_string(),
            strengths: vec![],
            issues: vec!["Generic opener".to_string()],
            issues_remaining: vec![],
        };
        let issues = [ValidationIssue::new(
            "banned_phrase",
            Severity::High,
            "Contains \"synergy\"",
        )
        .with_fix_hint("Replace with a concrete claim")];
        let prompt = build_reviser_prompt("the draft", &grading, &issues);
        assert!(prompt.contains("70/100"));
        assert!(prompt.contains("Hook is weak."));
        assert!(prompt.contains("synergy"));
        assert!(prompt.contains("Replace with a concrete claim"));
    }
}
