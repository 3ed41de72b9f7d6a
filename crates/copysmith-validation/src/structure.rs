//! Structural and positional checks
//!
//! Length bands, section shape, hook/CTA windows, and the email-specific
//! heuristics (subject-line bands, spam lexicon, urgency and social-proof
//! presence). All pure; profiles per platform are composed in `validator`.

use copysmith_core::{Platform, Severity, ValidationIssue};

/// Character window at the start of a draft in which the hook must appear
const HOOK_WINDOW: usize = 200;

/// Character window at the end of a draft in which the CTA must appear
const CTA_WINDOW: usize = 250;

/// Spam-trigger lexicon for email copy
const SPAM_TRIGGERS: &[&str] = &[
    "act now",
    "buy now",
    "click here",
    "limited time",
    "100% guaranteed",
    "no obligation",
    "risk-free",
    "winner",
    "once in a lifetime",
    "urgent response",
];

const URGENCY_CUES: &[&str] = &[
    "today",
    "this week",
    "deadline",
    "closes",
    "ends",
    "by friday",
    "spots left",
];

const SOCIAL_PROOF_CUES: &[&str] = &[
    "customers",
    "teams use",
    "trusted by",
    "case study",
    "we helped",
    "clients",
];

const CTA_CUES: &[&str] = &[
    "comment",
    "share",
    "follow",
    "let me know",
    "reply",
    "book",
    "schedule",
    "sign up",
    "join",
    "?",
];

/// Character and word bands per platform
fn length_bands(platform: Platform) -> (usize, usize, usize, usize) {
    // (min_chars, max_chars, min_words, max_words)
    match platform {
        Platform::LinkedIn => (400, 2600, 60, 450),
        Platform::Email => (300, 2000, 50, 350),
        Platform::Twitter => (30, 280, 5, 60),
    }
}

/// Type-specific character/word-count bounds
pub fn check_length(content: &str, platform: Platform) -> Vec<ValidationIssue> {
    let (min_chars, max_chars, min_words, max_words) = length_bands(platform);
    let chars = content.chars().count();
    let words = content.split_whitespace().count();
    let mut issues = Vec::new();

    if chars < min_chars || chars > max_chars {
        issues.push(
            ValidationIssue::new(
                "length_bounds",
                Severity::Medium,
                format!(
                    "{} chars; {} drafts should be {}-{} chars",
                    chars, platform, min_chars, max_chars
                ),
            )
            .with_fix_hint(if chars < min_chars {
                "Expand with a concrete example or outcome"
            } else {
                "Cut secondary points to fit the platform"
            }),
        );
    }
    if words < min_words || words > max_words {
        issues.push(ValidationIssue::new(
            "word_count_bounds",
            Severity::Medium,
            format!(
                "{} words; {} drafts should be {}-{} words",
                words, platform, min_words, max_words
            ),
        ));
    }
    issues
}

fn is_bullet_line(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("- ") || t.starts_with("* ") || t.starts_with("• ")
}

fn is_bullet_block(block: &str) -> bool {
    let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
    !lines.is_empty() && lines.iter().filter(|l| is_bullet_line(l)).count() * 2 > lines.len()
}

/// Section shape: bullet lists should alternate with paragraphs, and
/// numbered sentence-style headers must share one consistent prefix style
/// and run consecutively from 1.
pub fn check_sections(content: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    // Adjacent bullet sections
    let blocks: Vec<&str> = content
        .split("\n\n")
        .filter(|b| !b.trim().is_empty())
        .collect();
    for pair in blocks.windows(2) {
        if is_bullet_block(pair[0]) && is_bullet_block(pair[1]) {
            issues.push(
                ValidationIssue::new(
                    "structure_alternation",
                    Severity::Medium,
                    "Two bullet sections in a row; alternate bullets with short paragraphs",
                )
                .with_fix_hint("Merge the lists or add a connecting paragraph"),
            );
            break;
        }
    }

    // Numbered header consistency
    let mut headers: Vec<(usize, char)> = Vec::new();
    for line in content.lines() {
        let t = line.trim();
        let digits: String = t.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            continue;
        }
        let rest = &t[digits.len()..];
        if let Some(sep) = rest.chars().next() {
            if (sep == '.' || sep == ')') && rest[sep.len_utf8()..].starts_with(' ') {
                if let Ok(n) = digits.parse::<usize>() {
                    headers.push((n, sep));
                }
            }
        }
    }
    if headers.len() >= 2 {
        let sep = headers[0].1;
        let consistent_sep = headers.iter().all(|(_, s)| *s == sep);
        let consecutive = headers
            .iter()
            .enumerate()
            .all(|(i, (n, _))| *n == i + 1);
        if !consistent_sep || !consecutive {
            issues.push(
                ValidationIssue::new(
                    "header_numbering",
                    Severity::Medium,
                    "Numbered headers must use one prefix style and run 1, 2, 3 ...",
                )
                .with_fix_hint("Renumber the section headers consistently"),
            );
        }
    }

    issues
}

/// Hook must land inside the leading window: a question, a number, or a
/// short punchy opening line.
pub fn check_hook(content: &str) -> Vec<ValidationIssue> {
    let window: String = content.chars().take(HOOK_WINDOW).collect();
    let first_line = window.lines().next().unwrap_or("").trim();

    let has_hook = window.contains('?')
        || window.chars().any(|c| c.is_ascii_digit())
        || (!first_line.is_empty() && first_line.len() <= 60);

    if has_hook {
        Vec::new()
    } else {
        vec![ValidationIssue::new(
            "hook_missing",
            Severity::Medium,
            format!("No hook in the first {} chars", HOOK_WINDOW),
        )
        .with_fix_hint("Open with a question, a number, or a one-line claim")]
    }
}

/// Call-to-action must land inside the trailing window
pub fn check_cta(content: &str) -> Vec<ValidationIssue> {
    let chars: Vec<char> = content.chars().collect();
    let start = chars.len().saturating_sub(CTA_WINDOW);
    let window: String = chars[start..].iter().collect::<String>().to_lowercase();

    if CTA_CUES.iter().any(|cue| window.contains(cue)) {
        Vec::new()
    } else {
        vec![ValidationIssue::new(
            "cta_missing",
            Severity::Medium,
            format!("No call to action in the last {} chars", CTA_WINDOW),
        )
        .with_fix_hint("Close with one clear ask")]
    }
}

/// Split an email draft into subject and body.
/// Convention: a leading `Subject: ...` line; absent means no subject.
pub fn split_email(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("Subject:") {
        match rest.find('\n') {
            Some(idx) => (Some(rest[..idx].trim()), rest[idx + 1..].trim_start()),
            None => (Some(rest.trim()), ""),
        }
    } else {
        (None, content)
    }
}

/// Subject-line length and word-count bands
pub fn check_subject(subject: Option<&str>) -> Vec<ValidationIssue> {
    let Some(subject) = subject else {
        return vec![ValidationIssue::new(
            "subject_missing",
            Severity::High,
            "Email draft has no Subject: line",
        )];
    };

    let mut issues = Vec::new();
    let chars = subject.chars().count();
    let words = subject.split_whitespace().count();

    if !(20..=60).contains(&chars) {
        issues.push(ValidationIssue::new(
            "subject_length",
            Severity::Medium,
            format!("Subject is {} chars; aim for 20-60", chars),
        ));
    }
    if !(3..=9).contains(&words) {
        issues.push(ValidationIssue::new(
            "subject_word_count",
            Severity::Medium,
            format!("Subject is {} words; aim for 3-9", words),
        ));
    }
    issues
}

/// Spam-trigger lexicon scan
pub fn check_spam_triggers(content: &str) -> Vec<ValidationIssue> {
    let lower = content.to_lowercase();
    SPAM_TRIGGERS
        .iter()
        .filter_map(|trigger| {
            lower.find(trigger).map(|pos| {
                ValidationIssue::new(
                    "spam_trigger",
                    Severity::Medium,
                    format!("Spam-filter trigger: \"{}\"", trigger),
                )
                .with_span(pos, pos + trigger.len())
                .with_fix_hint("Rephrase without the trigger wording")
            })
        })
        .collect()
}

/// Urgency presence heuristic for email
pub fn check_urgency(content: &str) -> Vec<ValidationIssue> {
    let lower = content.to_lowercase();
    if URGENCY_CUES.iter().any(|cue| lower.contains(cue)) {
        Vec::new()
    } else {
        vec![ValidationIssue::new(
            "urgency_missing",
            Severity::Low,
            "No urgency cue; give the reader a reason to act this week",
        )]
    }
}

/// Social-proof presence heuristic for email
pub fn check_social_proof(content: &str) -> Vec<ValidationIssue> {
    let lower = content.to_lowercase();
    if SOCIAL_PROOF_CUES.iter().any(|cue| lower.contains(cue)) {
        Vec::new()
    } else {
        vec![ValidationIssue::new(
            "social_proof_missing",
            Severity::Low,
            "No social proof; cite a customer, number, or result",
        )]
    }
}
