//! The decision workflow state machine
//!
//! Executes the fixed sequence of (stage, evaluator) pairs against a
//! [`DecisionState`], honoring the bounded retry loop and the optional
//! information-retrieval branch, then runs the finishing selection stage.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::reasoning::ReasoningClient;

use super::error::DecisionError;
use super::evaluation::{EVALUATOR_SYSTEM_PROMPT, EvaluationOutcome, strip_code_fence};
use super::stage::{ANALYSIS_STAGES, RETRIEVAL_STAGES, Stage};
use super::state::{DecisionState, Selection};

/// Stage name used in errors from the finishing selection stage
const SELECT_STAGE: &str = "select_decision";

const SELECT_SYSTEM_PROMPT: &str =
    "You are a decision analyst making the final call. From the decision draft \
     and the generated alternatives, select the best option and the best \
     runner-up. Respond with a JSON object: {\"selected_decision\": \"...\", \
     \"selected_decision_comment\": \"...\", \"alternative_decision\": \"...\", \
     \"alternative_decision_comment\": \"...\"}.";

/// Configuration for the decision engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum attempts per stage before the run fails as non-converging.
    ///
    /// The bound is what makes the retry loop provably terminating; the
    /// value itself is a policy choice surfaced as configuration.
    pub max_stage_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_stage_attempts: 3,
        }
    }
}

/// The workflow state machine over a reasoning service.
///
/// Stage and evaluator calls may be served by differently configured
/// clients (e.g. a cheaper model for evaluation).
#[derive(Debug)]
pub struct DecisionEngine {
    stage_client: Arc<dyn ReasoningClient>,
    evaluator_client: Arc<dyn ReasoningClient>,
    config: EngineConfig,
}

impl DecisionEngine {
    /// Create an engine using one client for stages and evaluators alike
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self {
            stage_client: Arc::clone(&client),
            evaluator_client: client,
            config: EngineConfig::default(),
        }
    }

    /// Create an engine with separate stage and evaluator clients
    pub fn with_clients(
        stage_client: Arc<dyn ReasoningClient>,
        evaluator_client: Arc<dyn ReasoningClient>,
    ) -> Self {
        Self {
            stage_client,
            evaluator_client,
            config: EngineConfig::default(),
        }
    }

    /// Override the engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute the full workflow for a query and return the final state.
    ///
    /// Any transport-level failure of a stage or evaluator call aborts the
    /// run; an evaluator that keeps rejecting a stage past the attempt bound
    /// fails the run with a "did not converge" error.
    #[instrument(skip(self), fields(model = %self.stage_client.model_name()))]
    pub async fn run(&self, query: &str) -> Result<DecisionState, DecisionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DecisionError::invalid_input("Decision query cannot be empty"));
        }

        let mut state = DecisionState::new(query);

        for stage in ANALYSIS_STAGES {
            self.run_stage_pair(stage, &mut state).await?;
        }

        // The only non-linear edge: skip retrieval when nothing is missing.
        // Evaluated once, never revisited.
        if state.needs_more_information() {
            info!(needs = %state.information_needs(), "Retrieving complementary information");
            for stage in RETRIEVAL_STAGES {
                self.run_stage_pair(stage, &mut state).await?;
            }
        } else {
            debug!("No additional information required, skipping retrieval stages");
        }

        self.run_stage_pair(Stage::GenerateAlternatives, &mut state)
            .await?;

        self.select_decision(&mut state).await?;

        info!("Decision workflow completed");
        Ok(state)
    }

    /// Run one (stage, evaluator) pair with the bounded retry loop
    async fn run_stage_pair(
        &self,
        stage: Stage,
        state: &mut DecisionState,
    ) -> Result<(), DecisionError> {
        let mut feedback: Option<String> = None;

        for attempt in 1..=self.config.max_stage_attempts {
            let prompt = stage.prompt(state, feedback.as_deref());

            let answer = match self.stage_client.invoke(stage.system_prompt(), &prompt).await {
                Ok(answer) => answer,
                Err(e) if e.is_recoverable() => {
                    warn!(stage = %stage, attempt, error = %e, "Unusable stage output, retrying");
                    feedback = Some(format!("The previous response was unusable: {}", e));
                    continue;
                }
                Err(e) => return Err(DecisionError::stage_failed(stage.name(), e.to_string())),
            };

            if answer.trim().is_empty() {
                warn!(stage = %stage, attempt, "Empty stage output, retrying");
                feedback = Some("The previous response was empty".to_string());
                continue;
            }

            let outcome = self.evaluate(stage, state, &answer).await?;

            if outcome.is_pass() {
                debug!(stage = %stage, attempt, "Stage passed evaluation");
                stage.apply(state, answer);
                return Ok(());
            }

            debug!(stage = %stage, attempt, "Stage rejected by evaluator");
            feedback = outcome.feedback;
        }

        Err(DecisionError::did_not_converge(
            stage.name(),
            self.config.max_stage_attempts,
        ))
    }

    /// Ask the evaluator for a verdict over a stage answer
    async fn evaluate(
        &self,
        stage: Stage,
        state: &DecisionState,
        answer: &str,
    ) -> Result<EvaluationOutcome, DecisionError> {
        let eval_prompt = stage.evaluation_prompt(state, answer);

        match self
            .evaluator_client
            .invoke(EVALUATOR_SYSTEM_PROMPT, &eval_prompt)
            .await
        {
            Ok(raw) => Ok(EvaluationOutcome::parse(&raw)),
            Err(e) if e.is_recoverable() => Ok(EvaluationOutcome::retry(format!(
                "The evaluation response was unusable: {}",
                e
            ))),
            Err(e) => Err(DecisionError::stage_failed(stage.name(), e.to_string())),
        }
    }

    /// The finishing stage: pick the primary and runner-up decision.
    ///
    /// No evaluator gates it, but a reply that does not parse into the
    /// selection shape counts as malformed output and is retried within the
    /// same attempt bound.
    async fn select_decision(&self, state: &mut DecisionState) -> Result<(), DecisionError> {
        let mut feedback: Option<String> = None;

        for attempt in 1..=self.config.max_stage_attempts {
            let mut prompt = String::new();
            prompt.push_str("Decision draft:\n");
            prompt.push_str(state.current_draft());
            prompt.push_str("\n\nAlternatives for this decision:\n");
            prompt.push_str(state.alternatives());
            prompt.push('\n');

            if let Some(feedback) = feedback.as_deref() {
                prompt.push_str("\nYour previous answer was not usable: ");
                prompt.push_str(feedback);
                prompt.push_str("\nPlease answer again with the requested JSON shape.\n");
            }

            let answer = match self.stage_client.invoke(SELECT_SYSTEM_PROMPT, &prompt).await {
                Ok(answer) => answer,
                Err(e) if e.is_recoverable() => {
                    warn!(stage = SELECT_STAGE, attempt, error = %e, "Unusable selection output");
                    feedback = Some(e.to_string());
                    continue;
                }
                Err(e) => return Err(DecisionError::stage_failed(SELECT_STAGE, e.to_string())),
            };

            match serde_json::from_str::<Selection>(strip_code_fence(&answer)) {
                Ok(selection) => {
                    debug!(stage = SELECT_STAGE, attempt, "Selection parsed");
                    state.set_selection(selection);
                    return Ok(());
                }
                Err(e) => {
                    warn!(stage = SELECT_STAGE, attempt, error = %e, "Selection did not parse");
                    feedback = Some(format!("the reply was not valid selection JSON ({})", e));
                }
            }
        }

        Err(DecisionError::did_not_converge(
            SELECT_STAGE,
            self.config.max_stage_attempts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reasoning::ReasoningError;
    use crate::domain::reasoning::client::mock::ScriptedReasoningClient;

    fn pass_verdict() -> String {
        r#"{"correct": true, "comment": "looks right"}"#.to_string()
    }

    fn retry_verdict(comment: &str) -> String {
        format!(r#"{{"correct": false, "comment": "{}"}}"#, comment)
    }

    fn selection_json() -> String {
        serde_json::to_string(&Selection {
            selected_decision: "Adopt it".to_string(),
            selected_decision_comment: "Strongest upside".to_string(),
            alternative_decision: "Pilot first".to_string(),
            alternative_decision_comment: "Safer ramp".to_string(),
        })
        .unwrap()
    }

    /// Script a full run where every stage passes on the first attempt
    fn happy_path_client(information_needs: &str) -> ScriptedReasoningClient {
        let mut client = ScriptedReasoningClient::new();

        let analysis_answers = [
            "an opportunity",
            "team burnout",
            "engineering org only",
            "trial the change for a quarter",
            "retain staff, keep throughput",
        ];

        for answer in analysis_answers {
            client = client.with_reply(answer).with_reply(pass_verdict());
        }

        // identify_information_needs pair
        client = client
            .with_reply(information_needs)
            .with_reply(pass_verdict());

        if information_needs != "none" {
            // retrieve_information and update_draft pairs
            client = client
                .with_reply("industry data: retention improves")
                .with_reply(pass_verdict())
                .with_reply("updated draft with data")
                .with_reply(pass_verdict());
        }

        // generate_alternatives pair, then the ungated selection
        client
            .with_reply("full rollout; pilot; do nothing")
            .with_reply(pass_verdict())
            .with_reply(selection_json())
    }

    fn engine(client: ScriptedReasoningClient) -> DecisionEngine {
        DecisionEngine::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_run_completes_with_skip_branch() {
        let engine = engine(happy_path_client("none"));

        let state = engine
            .run("Should I adopt a four-day work week?")
            .await
            .expect("run should succeed");

        assert_eq!(state.trigger(), "an opportunity");
        assert_eq!(state.selected(), "Adopt it");
        assert_eq!(state.alternative(), "Pilot first");

        // Skipped branch leaves the retrieval fields unset
        assert!(state.retrieved_info().is_none());
        assert!(state.updated_draft().is_none());
    }

    #[tokio::test]
    async fn test_run_executes_retrieval_branch() {
        let engine = engine(happy_path_client("current retention figures"));

        let state = engine.run("Should we raise salaries?").await.unwrap();

        assert_eq!(
            state.retrieved_info(),
            Some("industry data: retention improves")
        );
        assert_eq!(state.updated_draft(), Some("updated draft with data"));
        assert_eq!(state.current_draft(), "updated draft with data");
    }

    #[tokio::test]
    async fn test_retry_then_pass_feeds_feedback_back() {
        // First attempt rejected, second accepted, then give up on the rest
        // by failing the next stage's call with a transport error.
        let client = ScriptedReasoningClient::new()
            .with_reply("a vague trigger")
            .with_reply(retry_verdict("name the actual trigger"))
            .with_reply("a concrete trigger")
            .with_reply(pass_verdict())
            .with_error(ReasoningError::transport("stop here"));

        let engine = engine(client);
        let err = engine.run("query").await.unwrap_err();

        // The run made it past identify_trigger and died in analyze_root_cause
        assert_eq!(
            err,
            DecisionError::stage_failed(
                "analyze_root_cause",
                "Transport error calling reasoning service: stop here"
            )
        );
    }

    #[tokio::test]
    async fn test_always_retry_evaluator_fails_with_did_not_converge() {
        // Every call answers a RETRY verdict: stage answers are non-empty
        // text, every evaluation rejects.
        let client = ScriptedReasoningClient::always(retry_verdict("never good enough"));
        let engine = engine(client);

        let err = engine.run("query").await.unwrap_err();
        assert_eq!(err, DecisionError::did_not_converge("identify_trigger", 3));
    }

    #[tokio::test]
    async fn test_retry_loop_is_bounded() {
        let client = ScriptedReasoningClient::always(retry_verdict("no"));
        let counted = Arc::new(client);
        let engine = DecisionEngine::new(Arc::clone(&counted) as Arc<dyn ReasoningClient>);

        let _ = engine.run("query").await;

        // 3 attempts, each one stage call plus one evaluator call
        assert_eq!(counted.call_count(), 6);
    }

    #[tokio::test]
    async fn test_transport_error_aborts_run_naming_stage() {
        let client = ScriptedReasoningClient::always_err(ReasoningError::transport("refused"));
        let engine = engine(client);

        let err = engine.run("query").await.unwrap_err();
        assert!(err.to_string().contains("identify_trigger"));
        assert!(err.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn test_rate_limit_on_evaluator_aborts_run() {
        let client = ScriptedReasoningClient::new()
            .with_reply("a trigger")
            .with_error(ReasoningError::rate_limited("quota exhausted"));

        let engine = engine(client);
        let err = engine.run("query").await.unwrap_err();

        assert!(matches!(err, DecisionError::StageFailed { stage, .. } if stage == "identify_trigger"));
    }

    #[tokio::test]
    async fn test_empty_stage_output_counts_as_retry() {
        let client = ScriptedReasoningClient::new()
            .with_reply("   ")
            .with_reply("a real answer")
            .with_reply(pass_verdict())
            .with_error(ReasoningError::transport("stop here"));

        let engine = engine(client);
        let err = engine.run("query").await.unwrap_err();

        // The empty reply burned one attempt but did not fail the run
        assert!(matches!(err, DecisionError::StageFailed { stage, .. } if stage == "analyze_root_cause"));
    }

    #[tokio::test]
    async fn test_malformed_selection_is_retried() {
        let mut client = ScriptedReasoningClient::new();

        let analysis_answers = [
            "an opportunity",
            "team burnout",
            "engineering org only",
            "trial the change",
            "retain staff",
            "none",
            "full rollout; pilot",
        ];
        for answer in analysis_answers {
            client = client.with_reply(answer).with_reply(pass_verdict());
        }

        // First selection reply is not JSON, second parses
        client = client
            .with_reply("I would pick the rollout")
            .with_reply(selection_json());

        let engine = engine(client);
        let state = engine.run("query").await.unwrap();
        assert_eq!(state.selected(), "Adopt it");
    }

    #[tokio::test]
    async fn test_malformed_selection_past_bound_fails() {
        let mut client = ScriptedReasoningClient::new();

        let analysis_answers = [
            "an opportunity",
            "team burnout",
            "engineering org only",
            "trial the change",
            "retain staff",
            "none",
            "full rollout; pilot",
        ];
        for answer in analysis_answers {
            client = client.with_reply(answer).with_reply(pass_verdict());
        }

        let client = client.with_fallback(Ok("not json, ever".to_string()));

        let engine = engine(client);
        let err = engine.run("query").await.unwrap_err();
        assert_eq!(err, DecisionError::did_not_converge("select_decision", 3));
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let engine = engine(ScriptedReasoningClient::new());
        let err = engine.run("   ").await.unwrap_err();
        assert!(matches!(err, DecisionError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_custom_attempt_bound() {
        let client = ScriptedReasoningClient::always(retry_verdict("no"));
        let engine = DecisionEngine::new(Arc::new(client))
            .with_config(EngineConfig {
                max_stage_attempts: 1,
            });

        let err = engine.run("query").await.unwrap_err();
        assert_eq!(err, DecisionError::did_not_converge("identify_trigger", 1));
    }
}
