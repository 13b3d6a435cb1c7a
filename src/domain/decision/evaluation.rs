//! Evaluation outcomes: the PASS/RETRY gate between a stage and its successor

use serde::Deserialize;

/// System prompt shared by every evaluator call
pub const EVALUATOR_SYSTEM_PROMPT: &str =
    "You are a strict reviewer of a decision analyst's work. Judge whether the \
     answer under review is correct and useful in its context. Respond with a \
     JSON object: {\"correct\": true|false, \"comment\": \"specific feedback\"}.";

/// Verdict of an evaluator over a stage answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Retry,
}

/// Outcome of one evaluation.
///
/// Lives only for the transition between a stage and its successor; the
/// feedback is fed back into the stage on retry and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub verdict: Verdict,
    pub feedback: Option<String>,
}

impl EvaluationOutcome {
    pub fn pass(feedback: Option<String>) -> Self {
        Self {
            verdict: Verdict::Pass,
            feedback,
        }
    }

    pub fn retry(feedback: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Retry,
            feedback: Some(feedback.into()),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Parse an evaluator reply.
    ///
    /// Accepts the JSON shape the evaluator is instructed to return, with or
    /// without a surrounding code fence. Anything unparseable counts as a
    /// RETRY, never a hard failure.
    pub fn parse(raw: &str) -> Self {
        let text = strip_code_fence(raw);

        match serde_json::from_str::<RawEvaluation>(text) {
            Ok(eval) if eval.correct => Self::pass(eval.comment),
            Ok(eval) => Self::retry(
                eval.comment
                    .unwrap_or_else(|| "The answer was judged incorrect".to_string()),
            ),
            Err(_) => Self::retry(format!(
                "The evaluation could not be interpreted; raw evaluator reply: {}",
                raw.trim()
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    correct: bool,
    comment: Option<String>,
}

/// Strip a ```...``` fence if the reply is wrapped in one
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pass() {
        let outcome = EvaluationOutcome::parse(r#"{"correct": true, "comment": "solid"}"#);
        assert!(outcome.is_pass());
        assert_eq!(outcome.feedback.as_deref(), Some("solid"));
    }

    #[test]
    fn test_parse_retry_with_feedback() {
        let outcome =
            EvaluationOutcome::parse(r#"{"correct": false, "comment": "misses the trigger"}"#);
        assert_eq!(outcome.verdict, Verdict::Retry);
        assert_eq!(outcome.feedback.as_deref(), Some("misses the trigger"));
    }

    #[test]
    fn test_parse_retry_without_comment() {
        let outcome = EvaluationOutcome::parse(r#"{"correct": false}"#);
        assert_eq!(outcome.verdict, Verdict::Retry);
        assert!(outcome.feedback.is_some());
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"correct\": true, \"comment\": \"ok\"}\n```";
        let outcome = EvaluationOutcome::parse(raw);
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_malformed_reply_is_retry() {
        let outcome = EvaluationOutcome::parse("looks good to me!");
        assert_eq!(outcome.verdict, Verdict::Retry);
        assert!(outcome.feedback.unwrap().contains("looks good to me!"));
    }

    #[test]
    fn test_empty_reply_is_retry() {
        let outcome = EvaluationOutcome::parse("");
        assert_eq!(outcome.verdict, Verdict::Retry);
    }

    #[test]
    fn test_strip_code_fence_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```{\"a\": 1}```"), "{\"a\": 1}");
    }
}
