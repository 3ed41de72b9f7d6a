//! Output extractor
//!
//! Converts the model's final free-text output into structured draft
//! fields. The primary path parses a JSON object, optionally wrapped in a
//! fenced code block; the fallback path is an independent pure function
//! that salvages a best-effort result from plain text. `extract` composes
//! the two and never fails.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum length of the main content field for a parse to count
const MIN_CONTENT_LEN: usize = 40;

/// Lines at which the fallback stops collecting content; everything after
/// is model commentary, not draft text.
const COMMENTARY_MARKERS: &[&str] = &[
    "note:",
    "let me know",
    "hope this helps",
    "feel free to",
    "i've also",
    "would you like",
];

/// Leading lines the fallback skips before the draft starts
const PREAMBLE_MARKERS: &[&str] = &["here is", "here's", "sure,", "below is"];

/// Structured fields extracted from a writer or reviser response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftFields {
    /// Main draft body; always populated after `extract`. Defaulted so a
    /// response without it reaches the explicit missing-field check
    /// instead of failing JSON deserialization.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

/// Why the strict parse path rejected the raw text
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no JSON object found")]
    NoJsonObject,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("content too short: {0} chars")]
    ContentTooShort(usize),
}

/// Strict path: optional fence (language-tagged or not), JSON body,
/// required fields present and content above the minimum length.
pub fn parse_structured(raw: &str) -> Result<DraftFields, ExtractError> {
    let body = strip_fences(raw);
    let trimmed = body.trim();
    if !trimmed.starts_with('{') {
        return Err(ExtractError::NoJsonObject);
    }

    let fields: DraftFields = serde_json::from_str(trimmed)?;
    if fields.content.is_empty() {
        return Err(ExtractError::MissingField("content"));
    }
    if fields.content.len() < MIN_CONTENT_LEN {
        return Err(ExtractError::ContentTooShort(fields.content.len()));
    }
    Ok(fields)
}

/// Fallback path: line-oriented salvage of a best-effort result
///
/// Skips a leading commentary line, stops at known commentary markers, and
/// always returns a populated content field so a parse failure degrades
/// gracefully instead of aborting the workflow.
pub fn salvage(raw: &str) -> DraftFields {
    let mut lines: Vec<&str> = Vec::new();

    for (i, line) in raw.lines().enumerate() {
        let lower = line.trim().to_lowercase();

        // Fence lines never belong to the draft
        if lower.starts_with("```") {
            continue;
        }
        // A preamble line only counts at the very top
        if i == 0 && PREAMBLE_MARKERS.iter().any(|m| lower.starts_with(m)) {
            continue;
        }
        if COMMENTARY_MARKERS.iter().any(|m| lower.starts_with(m)) {
            break;
        }
        lines.push(line);
    }

    let mut content = lines.join("\n").trim().to_string();
    if content.is_empty() {
        content = raw.trim().to_string();
    }
    if content.is_empty() {
        content = "(empty response)".to_string();
    }

    DraftFields {
        content,
        ..DraftFields::default()
    }
}

/// Extract structured fields, falling back on any strict-parse failure.
/// Never fails and always returns a populated content field.
pub fn extract(raw: &str) -> DraftFields {
    match parse_structured(raw) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::debug!("Strict parse failed ({}), salvaging", e);
            salvage(raw)
        }
    }
}

/// Strip an optional fenced code block, handling both language-tagged
/// (```json) and untagged (```) fences, including unterminated ones.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line (or the bare fence line)
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => return trimmed,
    };

    // Closing fence optional: salvage-worthy output often truncates it
    match body.rfind("```") {
        Some(idx) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r##"{"content": "A draft long enough to clear the minimum content length check.", "title": "On drafts", "hashtags": ["#drafting"]}"##;

    #[test]
    fn test_parse_bare_json() {
        let fields = parse_structured(VALID_JSON).unwrap();
        assert!(fields.content.starts_with("A draft"));
        assert_eq!(fields.title.as_deref(), Some("On drafts"));
        assert_eq!(fields.hashtags, vec!["#drafting"]);
    }

    #[test]
    fn test_parse_tagged_fence() {
        let raw = format!("```json\n{}\n```", VALID_JSON);
        assert!(parse_structured(&raw).is_ok());
    }

    #[test]
    fn test_parse_untagged_fence() {
        let raw = format!("```\n{}\n```", VALID_JSON);
        assert!(parse_structured(&raw).is_ok());
    }

    #[test]
    fn test_parse_unterminated_fence() {
        let raw = format!("```json\n{}", VALID_JSON);
        assert!(parse_structured(&raw).is_ok());
    }

    #[test]
    fn test_missing_content_rejected() {
        let err = parse_structured(r#"{"title": "no body"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingField("content")));
    }

    #[test]
    fn test_short_content_rejected() {
        let err = parse_structured(r#"{"content": "too short"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::ContentTooShort(_)));
    }

    #[test]
    fn test_salvage_skips_preamble_and_commentary() {
        let raw = "Here's the post you asked for:\nGreat teams ship small.\nThey learn faster.\nNote: I kept it short.";
        let fields = salvage(raw);
        assert_eq!(fields.content, "Great teams ship small.\nThey learn faster.");
    }

    #[test]
    fn test_salvage_drops_fence_lines() {
        let raw = "```\nDraft body here.\n```";
        assert_eq!(salvage(raw).content, "Draft body here.");
    }

    #[test]
    fn test_extract_never_fails_on_malformed_json() {
        let raw = "```json\n{\"content\": \"unterminated";
        let fields = extract(raw);
        assert!(!fields.content.is_empty());
    }

    #[test]
    fn test_extract_populates_content_for_plain_text() {
        let fields = extract("Just a plain answer with no JSON at all.");
        assert_eq!(fields.content, "Just a plain answer with no JSON at all.");
    }

    #[test]
    fn test_extract_empty_input_still_populated() {
        let fields = extract("");
        assert!(!fields.content.is_empty());
    }
}
