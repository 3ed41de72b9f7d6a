//! Pattern-based checks over draft text
//!
//! Each check is a pure function: same input, same issues, no shared
//! state. Severity is fixed per check category; `auto_fixable` is set only
//! where `autofix` carries a matching rewrite rule.

use copysmith_core::{Severity, ValidationIssue, ValidationTuning};
use regex::Regex;
use std::sync::LazyLock;

/// AI-tell and marketing cliches that fail brand review immediately
const BANNED_PHRASES: &[&str] = &[
    "game-changer",
    "game changer",
    "delve into",
    "unlock the power",
    "revolutionize",
    "leverage the power",
    "in the ever-evolving landscape",
    "take it to the next level",
    "paradigm shift",
    "synergy",
];

/// Hedging and generic filler that weakens claims
const VAGUE_PHRASES: &[&str] = &[
    "a lot of",
    "various things",
    "great results",
    "kind of",
    "sort of",
    "somewhat",
    "in many ways",
    "at scale",
];

/// Throat-clearing openers with a deterministic strip rewrite
pub(crate) const FILLER_PHRASES: &[&str] = &[
    "in today's fast-paced world",
    "at the end of the day",
    "it goes without saying",
    "needless to say",
    "in this day and age",
    "when it comes down to it",
];

/// Direct contrast framing inside one sentence: "not X, it's Y"
static CONTRAST_DIRECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnot\s+(?:about\s+|just\s+|only\s+)?[^,.!?;]{1,60}[,;]\s*(?:it'?s|it\s+is|this\s+is|but)\b")
        .expect("contrast_direct regex")
});

/// Masked contrast inside one sentence: "rather than X, Y" / "instead of X, Y"
static CONTRAST_MASKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:rather\s+than|instead\s+of)\s+[^,.!?;]{1,80},").expect("contrast_masked regex")
});

/// Pivot sentence opener for the cross-sentence masked form
static CONTRAST_PIVOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:instead|rather)\b[,\s]").expect("contrast_pivot regex"));

/// Negation markers that open the negative half of a contrast
static NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:not|never|stop|no\s+longer|don'?t|doesn'?t|won'?t|used\s+to)\b")
        .expect("negation regex")
});

/// Invented-anecdote tells: hypothetical people and companies presented
/// as illustrations
static FABRICATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:imagine\s+a\s+(?:company|team|founder)|picture\s+this|let'?s\s+say\s+you|consider\s+a\s+hypothetical|meet\s+[a-z]+,\s+a\s+)",
    )
    .expect("fabricated regex")
});

/// A sentence with its byte offset in the full text
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sentence<'a> {
    pub text: &'a str,
    pub start: usize,
}

/// Split text into sentences, keeping byte offsets for issue spans.
/// Terminators are `.`, `!`, `?`; fragments without one still count.
pub(crate) fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (i, b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') {
            let end = i + 1;
            let slice = text[start..end].trim();
            if !slice.is_empty() {
                let offset = start + (text[start..end].len() - text[start..end].trim_start().len());
                sentences.push(Sentence {
                    text: slice,
                    start: offset,
                });
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        let offset = start + (text[start..].len() - text[start..].trim_start().len());
        sentences.push(Sentence {
            text: tail,
            start: offset,
        });
    }
    sentences
}

fn phrase_issues(
    content: &str,
    phrases: &[&str],
    code: &str,
    severity: Severity,
    auto_fixable: bool,
    hint: &str,
) -> Vec<ValidationIssue> {
    let lower = content.to_lowercase();
    let mut issues = Vec::new();
    for phrase in phrases {
        if let Some(pos) = lower.find(phrase) {
            let mut issue = ValidationIssue::new(
                code,
                severity,
                format!("Contains \"{}\"", phrase),
            )
            .with_span(pos, pos + phrase.len())
            .with_fix_hint(hint);
            if auto_fixable {
                issue = issue.auto_fixable();
            }
            issues.push(issue);
        }
    }
    issues
}

/// Banned-phrase detection; one issue per matched phrase
pub fn check_banned_phrases(content: &str) -> Vec<ValidationIssue> {
    phrase_issues(
        content,
        BANNED_PHRASES,
        "banned_phrase",
        Severity::High,
        false,
        "Replace with a specific, concrete claim",
    )
}

/// Vague-language detection
pub fn check_vague_language(content: &str) -> Vec<ValidationIssue> {
    phrase_issues(
        content,
        VAGUE_PHRASES,
        "vague_language",
        Severity::Medium,
        false,
        "Name the specific thing or number",
    )
}

/// Filler-phrase detection; stripping the phrase is a deterministic rewrite
pub fn check_filler_phrases(content: &str) -> Vec<ValidationIssue> {
    phrase_issues(
        content,
        FILLER_PHRASES,
        "filler_phrase",
        Severity::Low,
        true,
        "Delete the filler phrase",
    )
}

/// Fabricated-example detection
pub fn check_fabricated_examples(content: &str) -> Vec<ValidationIssue> {
    FABRICATED
        .find_iter(content)
        .map(|m| {
            ValidationIssue::new(
                "fabricated_example",
                Severity::High,
                format!("Hypothetical-example framing: \"{}\"", m.as_str().trim()),
            )
            .with_span(m.start(), m.end())
            .with_fix_hint("Use a real, verifiable example or drop the anecdote")
        })
        .collect()
}

/// Contrast-framing detection
///
/// Flags the direct "not X, it's Y" form and the masked "rather than X, Y"
/// form. A pivot sentence ("Instead, ...") is only flagged when a
/// negation sits within `tuning.contrast_sentence_gap` sentences before it;
/// reframing with more spacing between the negative and positive clauses
/// is deliberate writing, not a tic.
pub fn check_contrast_framing(content: &str, tuning: &ValidationTuning) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for m in CONTRAST_DIRECT.find_iter(content) {
        issues.push(
            ValidationIssue::new(
                "contrast_direct",
                Severity::High,
                format!("Contrast framing: \"{}\"", m.as_str().trim()),
            )
            .with_span(m.start(), m.end())
            .with_fix_hint("State the positive claim directly"),
        );
    }

    for m in CONTRAST_MASKED.find_iter(content) {
        issues.push(
            ValidationIssue::new(
                "contrast_masked",
                Severity::High,
                format!("Masked contrast framing: \"{}\"", m.as_str().trim()),
            )
            .with_span(m.start(), m.end())
            .with_fix_hint("Drop the negative clause and lead with the positive one")
            .auto_fixable(),
        );
    }

    // Cross-sentence form: a pivot opener with a nearby preceding negation
    let sentences = split_sentences(content);
    for (i, sentence) in sentences.iter().enumerate() {
        if !CONTRAST_PIVOT.is_match(sentence.text) {
            continue;
        }
        let window_start = i.saturating_sub(tuning.contrast_sentence_gap);
        let negated_nearby = sentences[window_start..i]
            .iter()
            .any(|prev| NEGATION.is_match(prev.text));
        if negated_nearby {
            issues.push(
                ValidationIssue::new(
                    "contrast_pivot",
                    Severity::High,
                    format!("Pivot after negation: \"{}\"", sentence.text),
                )
                .with_span(sentence.start, sentence.start + sentence.text.len())
                .with_fix_hint("Remove the pivot opener; let the positive claim stand alone")
                .auto_fixable(),
            );
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> ValidationTuning {
        ValidationTuning::default()
    }

    #[test]
    fn test_split_sentences_offsets() {
        let text = "First one. Second one! Third?";
        let sentences = split_sentences(text);
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0].text, "First one.");
        assert_eq!(sentences[1].text, "Second one!");
        assert_eq!(&text[sentences[1].start..sentences[1].start + 3], "Sec");
    }

    #[test]
    fn test_banned_phrase_flagged_with_span() {
        let issues = check_banned_phrases("This tool is a game-changer for writers.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "banned_phrase");
        assert_eq!(issues[0].severity, Severity::High);
        let (start, end) = issues[0].span.unwrap();
        assert_eq!(
            &"This tool is a game-changer for writers."[start..end],
            "game-changer"
        );
    }

    #[test]
    fn test_clean_copy_passes_phrase_checks() {
        let content = "We cut review time from four days to six hours by batching edits.";
        assert!(check_banned_phrases(content).is_empty());
        assert!(check_vague_language(content).is_empty());
        assert!(check_filler_phrases(content).is_empty());
        assert!(check_fabricated_examples(content).is_empty());
    }

    #[test]
    fn test_filler_is_auto_fixable() {
        let issues = check_filler_phrases("In today's fast-paced world, shipping matters.");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].auto_fixable);
        assert_eq!(issues[0].severity, Severity::Low);
    }

    #[test]
    fn test_fabricated_example_flagged() {
        let issues = check_fabricated_examples("Imagine a company that doubles output overnight.");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "fabricated_example");
    }

    #[test]
    fn test_direct_contrast_flagged() {
        let issues =
            check_contrast_framing("It's not about speed, it's about consistency.", &tuning());
        assert!(issues.iter().any(|i| i.code == "contrast_direct"));
        assert!(issues
            .iter()
            .all(|i| i.code != "contrast_direct" || i.severity == Severity::High));
    }

    #[test]
    fn test_masked_contrast_same_sentence_flagged() {
        let issues = check_contrast_framing("Rather than guessing, focus on data.", &tuning());
        let masked: Vec<_> = issues.iter().filter(|i| i.code == "contrast_masked").collect();
        assert_eq!(masked.len(), 1);
        assert_eq!(masked[0].severity, Severity::High);
        assert!(masked[0].auto_fixable);
    }

    #[test]
    fn test_spaced_reframing_not_flagged() {
        let content = "We used to guess. Over the next three quarters we rebuilt the process around data, and the results followed.";
        let issues = check_contrast_framing(content, &tuning());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_pivot_after_adjacent_negation_flagged() {
        let content = "We don't guess anymore. Instead, we measure everything.";
        let issues = check_contrast_framing(content, &tuning());
        let pivot: Vec<_> = issues.iter().filter(|i| i.code == "contrast_pivot").collect();
        assert_eq!(pivot.len(), 1);
        assert_eq!(pivot[0].severity, Severity::High);
        assert!(pivot[0].auto_fixable);
    }

    #[test]
    fn test_pivot_with_wide_gap_not_flagged() {
        let content = "We don't guess anymore. The team changed last year. Metrics came first. Instead, we now publish weekly numbers.";
        let issues = check_contrast_framing(content, &tuning());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_gap_is_configurable() {
        let content = "We don't guess anymore. The team changed last year. Instead, we measure.";
        let strict = ValidationTuning {
            contrast_sentence_gap: 2,
        };
        assert!(!check_contrast_framing(content, &strict).is_empty());
        assert!(check_contrast_framing(content, &tuning()).is_empty());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let content =
            "Rather than guessing, focus on data. This tool is a game-changer, kind of.";
        let first = check_contrast_framing(content, &tuning());
        let second = check_contrast_framing(content, &tuning());
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.code, b.code);
            assert_eq!(a.span, b.span);
        }
    }
}
