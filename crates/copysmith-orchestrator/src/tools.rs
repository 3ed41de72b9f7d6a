//! Built-in tool implementations for the writer's conversation loop
//!
//! These are local, deterministic collaborators. `research_lookup` serves
//! curated notes from the brief; `snippet_generator` offers structural
//! starting points. Real retrieval backends plug in through the same
//! `Tool` trait.

use async_trait::async_trait;
use serde::Deserialize;

use copysmith_agent::Tool;
use copysmith_core::Brief;

#[derive(Debug, Deserialize)]
struct ResearchInput {
    query: String,
}

/// Serves the brief's notes back to the model on request, keyed by query.
/// Keeps the writer grounded on supplied material instead of invention.
pub struct ResearchLookupTool {
    notes: Vec<String>,
}

impl ResearchLookupTool {
    pub fn from_brief(brief: &Brief) -> Self {
        let notes = brief
            .notes
            .as_deref()
            .map(|n| n.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
            .unwrap_or_default();
        Self { notes }
    }

    pub fn input_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look up" }
            },
            "required": ["query"]
        })
    }
}

#[async_trait]
impl Tool for ResearchLookupTool {
    async fn run(&self, input: serde_json::Value) -> std::result::Result<String, String> {
        let input: ResearchInput =
            serde_json::from_value(input).map_err(|e| format!("Invalid input: {}", e))?;
        if self.notes.is_empty() {
            return Ok(format!(
                "No research material available for \"{}\". Do not invent facts; \
                 write from the topic alone.",
                input.query
            ));
        }
        let query = input.query.to_lowercase();
        let matched: Vec<&String> = self
            .notes
            .iter()
            .filter(|note| {
                query
                    .split_whitespace()
                    .any(|word| word.len() > 3 && note.to_lowercase().contains(word))
            })
            .collect();
        let relevant = if matched.is_empty() {
            self.notes.iter().collect()
        } else {
            matched
        };
        let mut out = String::from("Relevant material:\n");
        for note in relevant {
            out.push_str(&format!("- {}\n", note));
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct SnippetInput {
    kind: String,
    #[serde(default)]
    topic: Option<String>,
}

/// Generates structural snippets (hooks, CTA forms) the writer can adapt
pub struct SnippetGeneratorTool;

impl SnippetGeneratorTool {
    pub fn input_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "kind": { "type": "string", "enum": ["hook", "cta"] },
                "topic": { "type": "string" }
            },
            "required": ["kind"]
        })
    }
}

#[async_trait]
impl Tool for SnippetGeneratorTool {
    async fn run(&self, input: serde_json::Value) -> std::result::Result<String, String> {
        let input: SnippetInput =
            serde_json::from_value(input).map_err(|e| format!("Invalid input: {}", e))?;
        let topic = input.topic.as_deref().unwrap_or("<topic>");
        match input.kind.as_str() {
            "hook" => Ok(format!(
                "Hook patterns:\n\
                 - Question: \"What would change if {} took half the time?\"\n\
                 - Number-first: \"<metric> in <timeframe>. Here's how.\"\n\
                 - Contrarian claim: \"<common practice> is costing you <outcome>.\"",
                topic
            )),
            "cta" => Ok(
                "CTA patterns:\n\
                 - Ask a question the reader can answer from experience\n\
                 - Invite one specific action (reply, comment, book a slot)\n\
                 - Offer the artifact (\"want the checklist? comment 'send'\")"
                    .to_string(),
            ),
            other => Err(format!("Unknown snippet kind: '{}'", other)),
        }
    }
}
