//! Quality-gated revision loop
//!
//! Writer run, deterministic validation, auto-fix, model grading, and
//! bounded revision until the target score is met. A below-threshold
//! draft is never discarded: the loop always returns a `WorkflowResult`
//! with full grading attached so the caller can flag it instead of
//! failing the request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use tracing::{debug, info, warn};

use copysmith_agent::{
    extract, CircuitBreaker, CompletionRequest, CompletionService, ConversationLoop, DraftFields,
    ToolDispatcher, ToolId,
};
use copysmith_core::{
    Brief, ConversationMessage, CopysmithError, Platform, Result, RevisionRecord, ToolTimeouts,
    Usage, WorkflowDefaults, WorkflowResult,
};
use copysmith_validation::{apply_auto_fixes, Grader, HybridValidator, ValidationTool};

use crate::breakers::BreakerRegistry;
use crate::persistence::ExecutionStore;
use crate::prompt::{build_reviser_prompt, build_system_context, build_writer_prompt};
use crate::tools::{ResearchLookupTool, SnippetGeneratorTool};

/// The reviser is a single tool-free completion, so it gets the same
/// budget as a follow-up conversation turn.
const REVISER_TIMEOUT: Duration = Duration::from_secs(45);

/// Assemble the draft text from extracted fields. Email drafts carry the
/// subject inline as a leading `Subject:` line so the validator sees it.
fn assemble_draft(fields: DraftFields, platform: Platform) -> String {
    match platform {
        Platform::Email => match &fields.subject {
            Some(subject) if !fields.content.trim_start().starts_with("Subject:") => {
                format!("Subject: {}\n\n{}", subject, fields.content)
            }
            _ => fields.content,
        },
        _ => fields.content,
    }
}

/// Orchestrates one workflow invocation: writer, validator, reviser
pub struct RevisionLoop {
    service: Arc<dyn CompletionService>,
    breakers: BreakerRegistry,
    validator: HybridValidator,
    grader: Grader,
    store: Arc<dyn ExecutionStore>,
    defaults: WorkflowDefaults,
    tool_timeouts: ToolTimeouts,
}

impl RevisionLoop {
    pub fn new(
        service: Arc<dyn CompletionService>,
        breakers: BreakerRegistry,
        validator: HybridValidator,
        store: Arc<dyn ExecutionStore>,
        defaults: WorkflowDefaults,
        tool_timeouts: ToolTimeouts,
    ) -> Self {
        let grader = Grader::new(Arc::clone(&service), breakers.grading());
        Self {
            service,
            breakers,
            validator,
            grader,
            store,
            defaults,
            tool_timeouts,
        }
    }

    /// Run the full workflow for `brief`.
    ///
    /// Iteration semantics: `iterations` counts reviser invocations
    /// actually performed; one `RevisionRecord` is appended per reviser
    /// invocation, carrying the grade that triggered it. A first draft
    /// that meets the target yields `iterations == 0` and an empty
    /// history.
    pub async fn run(&self, brief: &Brief) -> Result<WorkflowResult> {
        let platform = brief.platform;
        let system_context = build_system_context(platform);
        let workflow_breaker = self.breakers.workflow(platform);

        info!(platform = %platform, topic = %brief.topic, "starting workflow");

        // Writer step: a full conversation-loop run with tools
        let dispatcher = Arc::new(self.build_dispatcher(brief));
        let writer = ConversationLoop::new(
            Arc::clone(&self.service),
            dispatcher,
            Arc::clone(&workflow_breaker),
            self.defaults.max_tokens,
        );
        let outcome = writer
            .run(
                &build_writer_prompt(brief),
                &system_context,
                self.defaults.max_turns,
            )
            .await
            .map_err(|err| match err {
                // No draft exists yet; nothing to fall back to
                CopysmithError::MaxIterationsExceeded { limit } => {
                    warn!(limit, "writer exhausted its turn budget before producing a draft");
                    CopysmithError::NoDraft(format!(
                        "writer hit {} turns without finishing a draft",
                        limit
                    ))
                }
                other => other,
            })?;

        let mut total_usage = outcome.total_usage;
        let mut draft = assemble_draft(extract(&outcome.text), platform);

        let mut iterations = 0;
        let mut revision_history = Vec::new();

        let (grading, completed) = loop {
            // Deterministic pass, then retry once after auto-fixing
            let issues = self.validator.validate(&draft, platform);
            let fixed = apply_auto_fixes(&draft, &issues);
            let remaining = if fixed != draft {
                debug!("auto-fixes applied, revalidating");
                draft = fixed;
                self.validator.validate(&draft, platform)
            } else {
                issues
            };

            let (grading, usage) = self.grader.grade(&draft, platform, &remaining).await?;
            total_usage.add(&usage);

            if grading.score >= self.defaults.target_score {
                info!(score = grading.score, iterations, "draft met quality gate");
                break (grading, true);
            }
            if iterations >= self.defaults.max_revisions {
                info!(
                    score = grading.score,
                    iterations, "revision budget exhausted, returning below-target draft"
                );
                break (grading, false);
            }

            let prompt = build_reviser_prompt(&draft, &grading, &grading.issues_remaining);
            match self.revise(&prompt, &system_context, &workflow_breaker).await {
                Ok((revised, usage)) => {
                    total_usage.add(&usage);
                    iterations += 1;
                    revision_history.push(RevisionRecord {
                        iteration: iterations,
                        score: grading.score,
                        issues: grading.issues.clone(),
                        feedback: grading.feedback.clone(),
                    });
                    draft = assemble_draft(revised, platform);
                }
                Err(err) => {
                    // Keep the draft we have rather than losing the run
                    warn!(%err, "reviser call failed, keeping current draft");
                    break (grading, false);
                }
            }
        };

        let result = WorkflowResult {
            run_id: Uuid::new_v4(),
            platform,
            draft,
            grading,
            iterations,
            revision_history,
            total_usage,
            completed_at: Utc::now(),
        };
        if !completed {
            warn!(
                score = result.grading.score,
                target = self.defaults.target_score,
                "workflow finished below target; flag for review"
            );
        }
        // Best-effort: a store failure never fails the workflow, but the
        // write finishes before we return so it cannot be dropped with the
        // runtime.
        if let Err(err) = self.store.record_execution(&result).await {
            warn!(%err, platform = %result.platform, "failed to persist workflow result");
        }
        Ok(result)
    }

    /// One-shot reviser call through the workflow breaker
    async fn revise(
        &self,
        prompt: &str,
        system_context: &str,
        breaker: &Arc<CircuitBreaker>,
    ) -> Result<(DraftFields, Usage)> {
        let request = CompletionRequest {
            system: Some(system_context.to_string()),
            messages: vec![ConversationMessage::user(prompt)],
            tools: Vec::new(),
            max_tokens: self.defaults.max_tokens,
        };
        let service = Arc::clone(&self.service);
        let response = breaker
            .call_async(|| async move {
                match tokio::time::timeout(REVISER_TIMEOUT, service.complete(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(CopysmithError::Api(format!(
                        "Reviser call timed out after {}s",
                        REVISER_TIMEOUT.as_secs()
                    ))),
                }
            })
            .await?;
        let usage = response.usage.unwrap_or_default();
        Ok((extract(&response.text()), usage))
    }

    fn build_dispatcher(&self, brief: &Brief) -> ToolDispatcher {
        let mut dispatcher = ToolDispatcher::new(self.tool_timeouts.clone());
        dispatcher.register(
            ToolId::ResearchLookup,
            "Look up supporting material for the brief",
            ResearchLookupTool::input_schema(),
            Arc::new(ResearchLookupTool::from_brief(brief)),
        );
        dispatcher.register(
            ToolId::SnippetGenerator,
            "Generate hook and call-to-action patterns to adapt",
            SnippetGeneratorTool::input_schema(),
            Arc::new(SnippetGeneratorTool),
        );
        dispatcher.register(
            ToolId::ContentValidation,
            "Run the deterministic content checks on a draft",
            ValidationTool::input_schema(),
            Arc::new(ValidationTool::new(self.validator.clone())),
        );
        dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use copysmith_agent::{CompletionResponse, StopReason};
    use copysmith_core::{ContentBlock, Platform, ToolTimeouts};
    use copysmith_validation::HybridValidator;

    use crate::persistence::NullStore;

    struct ScriptedService {
        responses: Mutex<Vec<Result<CompletionResponse>>>,
    }

    impl ScriptedService {
        fn new(responses: Vec<Result<CompletionResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedService {
        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
            let next = {
                let mut responses = self.responses.lock().unwrap();
                (!responses.is_empty()).then(|| responses.remove(0))
            };
            match next {
                Some(response) => response,
                // An exhausted script stalls forever so callers' timeouts
                // can be exercised under a paused clock
                None => std::future::pending().await,
            }
        }
    }

    fn text_response(text: &str) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            usage: Some(Usage {
                input_tokens: 100,
                output_tokens: 50,
            }),
        })
    }

    fn draft_response(content: &str) -> Result<CompletionResponse> {
        text_response(&json!({ "content": content }).to_string())
    }

    fn grade_response(score: u8) -> Result<CompletionResponse> {
        text_response(
            &json!({
                "score": score,
                "feedback": "feedback",
                "strengths": [],
                "issues": ["weak hook"]
            })
            .to_string(),
        )
    }

    const DRAFT: &str =
        "Shipping daily beats planning weekly. We tried both for a full quarter with 6 people.";

    fn make_loop_with_store(
        responses: Vec<Result<CompletionResponse>>,
        store: Arc<dyn ExecutionStore>,
    ) -> RevisionLoop {
        let defaults = WorkflowDefaults {
            target_score: 85,
            max_revisions: 2,
            max_turns: 5,
            max_tokens: 1024,
        };
        RevisionLoop::new(
            Arc::new(ScriptedService::new(responses)),
            BreakerRegistry::from_config(&Default::default()),
            HybridValidator::default(),
            store,
            defaults,
            ToolTimeouts::default(),
        )
    }

    fn make_loop(responses: Vec<Result<CompletionResponse>>) -> RevisionLoop {
        make_loop_with_store(responses, Arc::new(NullStore))
    }

    #[tokio::test]
    async fn test_first_draft_meeting_target_skips_revision() {
        let rloop = make_loop(vec![draft_response(DRAFT), grade_response(90)]);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        assert_eq!(result.iterations, 0);
        assert!(result.revision_history.is_empty());
        assert_eq!(result.grading.score, 90);
        assert!(result.met_target(85));
    }

    #[tokio::test]
    async fn test_bounded_termination_returns_below_target_draft() {
        let rloop = make_loop(vec![
            draft_response(DRAFT),
            grade_response(60),
            draft_response(DRAFT),
            grade_response(65),
            draft_response(DRAFT),
            grade_response(70),
        ]);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        assert_eq!(result.iterations, 2);
        assert_eq!(result.revision_history.len(), 2);
        assert_eq!(result.revision_history[0].score, 60);
        assert_eq!(result.revision_history[1].score, 65);
        assert_eq!(result.grading.score, 70);
        assert!(!result.met_target(85));
    }

    #[tokio::test]
    async fn test_reviser_failure_keeps_current_draft() {
        let rloop = make_loop(vec![
            draft_response(DRAFT),
            grade_response(60),
            Err(CopysmithError::Api("service unavailable".to_string())),
        ]);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        assert_eq!(result.iterations, 0);
        assert_eq!(result.grading.score, 60);
        assert!(result.draft.contains("Shipping daily"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_reviser_call_times_out_and_keeps_draft() {
        // The script runs dry after the first grade, so the reviser call
        // hangs until its timeout fires. The run must still finish with
        // the draft it already has.
        let rloop = make_loop(vec![draft_response(DRAFT), grade_response(60)]);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        assert_eq!(result.iterations, 0);
        assert_eq!(result.grading.score, 60);
        assert!(result.draft.contains("Shipping daily"));
    }

    fn tool_use_response() -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse {
                id: "c1".to_string(),
                name: "research_lookup".to_string(),
                input: json!({ "query": "shipping" }),
            }],
            usage: None,
        })
    }

    #[tokio::test]
    async fn test_writer_exhaustion_on_first_draft_aborts() {
        // The writer never reaches end_turn within max_turns (5)
        let rloop = make_loop(vec![
            tool_use_response(),
            tool_use_response(),
            tool_use_response(),
            tool_use_response(),
            tool_use_response(),
        ]);
        let err = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap_err();
        assert!(matches!(err, CopysmithError::NoDraft(_)));
    }

    #[tokio::test]
    async fn test_record_is_written_before_run_returns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executions.jsonl");
        let store = Arc::new(crate::persistence::JsonlStore::new(&path));

        let rloop = make_loop_with_store(vec![draft_response(DRAFT), grade_response(90)], store);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        // No yielding after run: the record must already be on disk
        let contents = std::fs::read_to_string(&path).unwrap();
        let recorded: WorkflowResult =
            serde_json::from_str(contents.lines().next().unwrap()).unwrap();
        assert_eq!(recorded.run_id, result.run_id);
    }

    #[tokio::test]
    async fn test_usage_accumulates_across_steps() {
        let rloop = make_loop(vec![draft_response(DRAFT), grade_response(90)]);
        let result = rloop
            .run(&Brief::new(Platform::Twitter, "shipping cadence"))
            .await
            .unwrap();

        // One writer turn plus one grading call
        assert_eq!(result.total_usage.input_tokens, 200);
        assert_eq!(result.total_usage.output_tokens, 100);
    }
}
