//! Deterministic rewrites for auto-fixable issues
//!
//! Only issues marked `auto_fixable` by the pattern checks have a rewrite
//! here. Everything else is left for the reviser model.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use copysmith_core::ValidationIssue;

use crate::rules::FILLER_PHRASES;

/// Leading masked-contrast clause, e.g. "Rather than guessing, " or
/// "Instead of shipping fast, "
static MASKED_LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:rather than|instead of)\s+[^,.!?\n]{1,60},\s*").expect("masked lead-in regex")
});

/// A pivot opener starting a sentence, e.g. "Instead, " / "Rather, "
static PIVOT_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[.!?]\s+)(?:instead|rather),\s+").expect("pivot opener regex"));

/// Capitalize the first alphabetic character of `s`
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Strip masked-contrast lead-in clauses and recapitalize what follows
fn fix_masked_contrast(content: &str) -> String {
    let mut result = content.to_string();
    while let Some(m) = MASKED_LEAD_IN.find(&result) {
        let before = result[..m.start()].to_string();
        let after = &result[m.end()..];
        // Recapitalize only when the clause opened a sentence
        let at_sentence_start = before
            .trim_end()
            .chars()
            .last()
            .map_or(true, |c| matches!(c, '.' | '!' | '?' | '\n'));
        let rest = if at_sentence_start {
            capitalize(after)
        } else {
            after.to_string()
        };
        result = format!("{}{}", before, rest);
    }
    result
}

/// Strip sentence-opening pivot words ("Instead, we ..." becomes "We ...")
fn fix_pivot_openers(content: &str) -> String {
    let mut result = content.to_string();
    while let Some(caps) = PIVOT_OPENER.captures(&result) {
        let whole = caps.get(0).expect("whole match");
        let boundary = caps.get(1).map(|m| m.as_str()).unwrap_or_default().to_string();
        let before = result[..whole.start()].to_string();
        let rest = capitalize(&result[whole.end()..]);
        result = format!("{}{}{}", before, boundary, rest);
    }
    result
}

/// Remove filler phrases, collapsing the whitespace they leave behind
fn fix_filler(content: &str) -> String {
    let mut result = content.to_string();
    for phrase in FILLER_PHRASES {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b[,]?\s*", regex::escape(phrase)))
            .expect("filler phrase builds a valid regex");
        result = pattern.replace_all(&result, "").into_owned();
    }
    result
}

/// Apply every deterministic rewrite for the auto-fixable issues present.
/// Issues without a rewrite are ignored; the draft is returned unchanged
/// when nothing applies.
pub fn apply_auto_fixes(content: &str, issues: &[ValidationIssue]) -> String {
    let fixable: Vec<&ValidationIssue> = issues.iter().filter(|i| i.auto_fixable).collect();
    if fixable.is_empty() {
        return content.to_string();
    }

    let mut result = content.to_string();
    for issue in &fixable {
        result = match issue.code.as_str() {
            "contrast_masked" => fix_masked_contrast(&result),
            "contrast_pivot" => fix_pivot_openers(&result),
            "filler_phrase" => fix_filler(&result),
            other => {
                debug!(code = other, "no deterministic rewrite for issue");
                result
            }
        };
    }
    result
}
