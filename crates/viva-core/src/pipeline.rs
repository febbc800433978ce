use crate::compiler::{self, CompileService};
use crate::config::PipelineConfig;
use crate::docs::DocStore;
use crate::model::{BatchScore, Challenge, VerificationResult};
use crate::providers::llm::LlmClient;
use crate::{challenge, generator, judge, verdict};
use std::sync::Arc;

/// Rationale attached to the synthetic rejection after retry exhaustion.
pub const ABANDON_RATIONALE: &str = "too many failures !";

/// Per-challenge verification states. `Verified` and `Abandoned` are
/// terminal; `Abandoned` is only reached by exhausting compile retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeState {
    Generating,
    CompileChecking,
    Judging,
    Verified,
    Abandoned,
}

fn transition(state: &mut ChallengeState, next: ChallengeState) {
    tracing::debug!(from = ?state, to = ?next, "state transition");
    *state = next;
}

/// Coder and judge are separate clients so the two roles can run on
/// different models.
pub struct Pipeline {
    coder: Arc<dyn LlmClient>,
    judge: Arc<dyn LlmClient>,
    compiler: Arc<dyn CompileService>,
    docs: DocStore,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        coder: Arc<dyn LlmClient>,
        judge: Arc<dyn LlmClient>,
        compiler: Arc<dyn CompileService>,
        docs: DocStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            coder,
            judge,
            compiler,
            docs,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs one challenge through generate -> compile-gate -> judge.
    ///
    /// Every failure mode is absorbed into the returned boolean: compile
    /// retries are bounded, each retry regenerates the candidate from
    /// scratch (compiler diagnostics are never fed back into the next
    /// attempt), and a judge or verdict problem rejects rather than errors.
    pub async fn verify(&self, challenge: &Challenge) -> VerificationResult {
        let attempts = self.config.settings.max_compile_attempts.max(1);
        let textual_only = generator::is_textual_only(&challenge.question);
        let mut state = ChallengeState::Generating;
        let mut candidate = String::new();

        for attempt in 1..=attempts {
            transition(&mut state, ChallengeState::Generating);
            candidate = match generator::generate(
                self.coder.as_ref(),
                &self.config,
                &challenge.question,
            )
            .await
            {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "generation attempt failed");
                    if attempt == attempts {
                        return self.rejected(candidate, format!("generation failed: {e}"));
                    }
                    continue;
                }
            };

            if textual_only {
                tracing::info!("theoretical question, no compile");
                transition(&mut state, ChallengeState::Judging);
                break;
            }

            transition(&mut state, ChallengeState::CompileChecking);
            let script = compiler::extract_code(&candidate);
            let outcome = self.compiler.check(&script).await;
            if outcome.is_ok() {
                tracing::info!(attempt, "compile ok");
                transition(&mut state, ChallengeState::Judging);
                break;
            }
            tracing::warn!(attempt, outcome = ?outcome, "compile attempt failed");
            if attempt == attempts {
                tracing::warn!(badcode = %script, "{ABANDON_RATIONALE}");
                transition(&mut state, ChallengeState::Abandoned);
                return VerificationResult {
                    candidate_answer: candidate,
                    judge_rationale: ABANDON_RATIONALE.to_string(),
                    accepted: false,
                };
            }
        }
        debug_assert_eq!(state, ChallengeState::Judging);

        let reference_context = self.docs.resolve(&challenge.references);
        let judge_rationale = match judge::evaluate(
            self.judge.as_ref(),
            &self.config,
            challenge,
            &reference_context,
            &candidate,
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "judge unavailable");
                return self.rejected(candidate, format!("judge unavailable: {e}"));
            }
        };

        transition(&mut state, ChallengeState::Verified);
        let accepted = verdict::extract_verdict(&judge_rationale);
        tracing::info!(accepted, "judge decision");
        if !accepted {
            tracing::info!(
                badcode = %compiler::extract_code(&candidate),
                rationale = %judge_rationale,
                "candidate rejected"
            );
        }
        VerificationResult {
            candidate_answer: candidate,
            judge_rationale,
            accepted,
        }
    }

    fn rejected(&self, candidate_answer: String, judge_rationale: String) -> VerificationResult {
        VerificationResult {
            candidate_answer,
            judge_rationale,
            accepted: false,
        }
    }

    /// Verifies each `(id, raw document)` pair independently and tallies the
    /// outcomes. A challenge that cannot be parsed is still counted as
    /// attempted, as a rejection; nothing aborts the batch.
    pub async fn score_batch(&self, challenges: &[(String, String)]) -> BatchScore {
        let mut score = BatchScore::default();
        for (id, raw) in challenges {
            println!("\n### verifying challenge No. {id}");
            let accepted = match challenge::parse(raw) {
                Ok(parsed) => self.verify(&parsed).await.accepted,
                Err(e) => {
                    tracing::error!(challenge = %id, error = %e, "challenge rejected: unparseable document");
                    false
                }
            };
            score.record(accepted);
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileOutcome;
    use crate::config::{Settings, CODER_PERSONALITY, JUDGE_RUBRIC};
    use crate::generator::TEXTUAL_ONLY_SENTINEL;
    use crate::model::ReferencePointer;
    use crate::providers::llm::ChatRequest;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// One client per role: counts calls and records the last system message
    /// it was given.
    struct CountingLlm {
        response: Option<String>,
        calls: AtomicU32,
        last_system: Mutex<Option<String>>,
    }

    impl CountingLlm {
        fn new(response: &str) -> Self {
            Self {
                response: Some(response.to_string()),
                calls: AtomicU32::new(0),
                last_system: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: AtomicU32::new(0),
                last_system: Mutex::new(None),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_system(&self) -> Option<String> {
            self.last_system.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn complete(
            &self,
            request: ChatRequest<'_>,
        ) -> anyhow::Result<crate::model::LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_system.lock().unwrap() = Some(request.system.to_string());
            let Some(text) = &self.response else {
                anyhow::bail!("completion timed out");
            };
            Ok(crate::model::LlmResponse {
                text: text.clone(),
                provider: "counting".to_string(),
                model: "counting".to_string(),
            })
        }

        fn provider_name(&self) -> &'static str {
            "counting"
        }
    }

    /// Pops scripted outcomes in order; once exhausted, keeps returning the
    /// last one.
    struct ScriptedCompiler {
        outcomes: Mutex<Vec<CompileOutcome>>,
        calls: AtomicU32,
    }

    impl ScriptedCompiler {
        fn new(outcomes: Vec<CompileOutcome>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
            }
        }

        fn always_ok() -> Self {
            Self::new(vec![CompileOutcome::Ok])
        }

        fn always_rejected() -> Self {
            Self::new(vec![CompileOutcome::Rejected { first: None }])
        }
    }

    #[async_trait]
    impl CompileService for ScriptedCompiler {
        async fn check(&self, _script: &str) -> CompileOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            }
        }

        fn service_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn pipeline(
        coder: Arc<CountingLlm>,
        judge: Arc<CountingLlm>,
        compiler: Arc<ScriptedCompiler>,
        docs_root: &std::path::Path,
    ) -> Pipeline {
        Pipeline::new(
            coder,
            judge,
            compiler,
            DocStore::new(docs_root),
            PipelineConfig::new("brief", Settings::default()),
        )
    }

    fn code_challenge() -> Challenge {
        Challenge {
            question: "Write a show command.".into(),
            reference_answer: "```envision\nshow label \"x\"\n```".into(),
            references: vec![],
        }
    }

    #[tokio::test]
    async fn accepts_when_compile_and_judge_pass() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("```envision\nshow label \"x\"\n```"));
        let judge = Arc::new(CountingLlm::new("every point ACCEPTABLE.\n1"));
        let compiler = Arc::new(ScriptedCompiler::always_ok());
        let result = pipeline(coder.clone(), judge.clone(), compiler.clone(), dir.path())
            .verify(&code_challenge())
            .await;
        assert!(result.accepted);
        assert_eq!(coder.calls(), 1);
        assert_eq!(judge.calls(), 1);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn each_role_talks_to_its_own_client() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("```envision\nshow label \"x\"\n```"));
        let judge = Arc::new(CountingLlm::new("fine.\n1"));
        let compiler = Arc::new(ScriptedCompiler::always_ok());
        pipeline(coder.clone(), judge.clone(), compiler, dir.path())
            .verify(&code_challenge())
            .await;
        // coder client only ever sees the coder personality, judge client
        // only ever sees the rubric
        let coder_system = coder.last_system().unwrap();
        assert!(coder_system.starts_with(CODER_PERSONALITY));
        let judge_system = judge.last_system().unwrap();
        assert!(judge_system.starts_with(JUDGE_RUBRIC));
    }

    #[tokio::test]
    async fn exhausted_retries_abandon_without_judging() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("```envision\nbad code\n```"));
        let judge = Arc::new(CountingLlm::new("1"));
        let compiler = Arc::new(ScriptedCompiler::always_rejected());
        let result = pipeline(coder.clone(), judge.clone(), compiler.clone(), dir.path())
            .verify(&code_challenge())
            .await;
        assert!(!result.accepted);
        assert_eq!(result.judge_rationale, ABANDON_RATIONALE);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 3);
        // each retry regenerates from scratch
        assert_eq!(coder.calls(), 3);
        assert_eq!(judge.calls(), 0);
    }

    #[tokio::test]
    async fn unreachable_compiler_is_retried_like_a_rejection() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("```envision\nshow label \"x\"\n```"));
        let judge = Arc::new(CountingLlm::new("fine.\n1"));
        let compiler = Arc::new(ScriptedCompiler::new(vec![
            CompileOutcome::Unreachable {
                detail: "connection refused".into(),
            },
            CompileOutcome::Ok,
        ]));
        let result = pipeline(coder.clone(), judge, compiler.clone(), dir.path())
            .verify(&code_challenge())
            .await;
        assert!(result.accepted);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 2);
        assert_eq!(coder.calls(), 2);
    }

    #[tokio::test]
    async fn textual_only_question_never_touches_the_compile_gate() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("A table holds columns."));
        let judge = Arc::new(CountingLlm::new("ACCEPTABLE throughout.\n1."));
        let compiler = Arc::new(ScriptedCompiler::always_rejected());
        let challenge = Challenge {
            question: format!("{TEXTUAL_ONLY_SENTINEL}\nWhat is a table?"),
            reference_answer: "A table holds columns.".into(),
            references: vec![],
        };
        let result = pipeline(coder.clone(), judge.clone(), compiler.clone(), dir.path())
            .verify(&challenge)
            .await;
        assert!(result.accepted);
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
        assert_eq!(coder.calls(), 1);
        assert_eq!(judge.calls(), 1);
    }

    #[tokio::test]
    async fn judge_failure_rejects_instead_of_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("```envision\nshow label \"x\"\n```"));
        let judge = Arc::new(CountingLlm::failing());
        let compiler = Arc::new(ScriptedCompiler::always_ok());
        let result = pipeline(coder, judge, compiler, dir.path())
            .verify(&code_challenge())
            .await;
        assert!(!result.accepted);
        assert!(result.judge_rationale.contains("judge unavailable"));
    }

    #[tokio::test]
    async fn judge_receives_resolved_reference_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brief.md"),
            "## Tiles\n\ntile facts here\n\n## Other\n\nx\n",
        )
        .unwrap();

        let coder = Arc::new(CountingLlm::new("tiles render output"));
        let judge = Arc::new(CountingLlm::new("ok.\n1"));
        let challenge = Challenge {
            question: format!("{TEXTUAL_ONLY_SENTINEL}\nExplain tiles."),
            reference_answer: "tiles render".into(),
            references: vec![ReferencePointer {
                document_id: "brief".into(),
                section_title: "Tiles".into(),
            }],
        };
        let result = pipeline(
            coder,
            judge.clone(),
            Arc::new(ScriptedCompiler::always_ok()),
            dir.path(),
        )
        .verify(&challenge)
        .await;
        assert!(result.accepted);
        let system = judge.last_system().unwrap();
        assert!(system.contains("tile facts here"));
    }

    #[tokio::test]
    async fn batch_counts_every_challenge_even_malformed_ones() {
        let dir = tempfile::tempdir().unwrap();
        let coder = Arc::new(CountingLlm::new("answer"));
        let judge = Arc::new(CountingLlm::new("good.\n1"));
        let compiler = Arc::new(ScriptedCompiler::always_ok());
        let pipeline = pipeline(coder, judge, compiler, dir.path());

        let textual = format!(
            "{TEXTUAL_ONLY_SENTINEL}\nQ\n\n# ANSWER\n\nA\n\n# References\n\n"
        );
        let challenges = vec![
            ("c001".to_string(), textual.clone()),
            ("c002".to_string(), "not a challenge at all".to_string()),
            ("c003".to_string(), textual),
        ];
        let score = pipeline.score_batch(&challenges).await;
        assert_eq!(score.attempted, 3);
        assert_eq!(score.accepted, 2);
        assert!((score.percent() - 200.0 / 3.0).abs() < 1e-9);
    }
}
