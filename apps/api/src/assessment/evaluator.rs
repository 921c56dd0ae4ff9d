//! Evaluator adapter. Pluggable, trait-based scorer for a single answer × competency.
//!
//! Default: `LlmEvaluator` (Claude via `llm_client`).
//! Tests swap in a scripted evaluator; `AppState` carries an `Arc<dyn Evaluator>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::assessment::models::{AssessmentKind, QuestionRecord};
use crate::assessment::prompts::{
    EVALUATION_SYSTEM, INTERVIEW_EVALUATION_TEMPLATE, NOT_PROVIDED, SJT_EVALUATION_TEMPLATE,
};
use crate::llm_client::prompts::{RATIONALE_INSTRUCTION, SCORING_SCALE_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Everything the evaluator needs to score one answer for one competency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRequest {
    pub kind: AssessmentKind,
    pub situation: Option<String>,
    pub question: String,
    pub best_rationale: String,
    pub worst_rationale: String,
    pub competency: String,
    pub candidate_answer: String,
}

impl EvaluationRequest {
    /// Returns `None` for unanswered records: they are never sent to the evaluator.
    pub fn for_record(
        kind: AssessmentKind,
        record: &QuestionRecord,
        competency: &str,
    ) -> Option<Self> {
        let answer = record.answer()?;
        Some(Self {
            kind,
            situation: record.situation.clone(),
            question: record.question.clone(),
            best_rationale: record.best_rationale.clone(),
            worst_rationale: record.worst_rationale.clone(),
            competency: competency.to_string(),
            candidate_answer: answer.to_string(),
        })
    }
}

/// Raw evaluator verdict. `score` is within [0, 10] once it leaves an `Evaluator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorOutput {
    pub score: f64,
    pub rationale: String,
}

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("evaluator returned a non-numeric score")]
    InvalidScore,
}

/// The evaluator trait. Implement this to swap backends without touching the controller.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest)
        -> Result<EvaluatorOutput, EvaluatorError>;
}

/// Claude-backed evaluator.
pub struct LlmEvaluator(pub LlmClient);

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluatorOutput, EvaluatorError> {
        let prompt = build_prompt(request);
        let output: EvaluatorOutput = self.0.call_json(&prompt, EVALUATION_SYSTEM).await?;
        validate_output(output, &request.competency)
    }
}

/// Rejects NaN/infinite scores and clamps the rest into [0, 10].
pub fn validate_output(
    output: EvaluatorOutput,
    competency: &str,
) -> Result<EvaluatorOutput, EvaluatorError> {
    if !output.score.is_finite() {
        return Err(EvaluatorError::InvalidScore);
    }
    let score = output.score.clamp(MIN_SCORE, MAX_SCORE);
    if score != output.score {
        warn!(
            "Evaluator score {} for '{}' out of range, clamped to {}",
            output.score, competency, score
        );
    }
    Ok(EvaluatorOutput {
        score,
        rationale: output.rationale.trim().to_string(),
    })
}

pub fn build_prompt(request: &EvaluationRequest) -> String {
    let template = match request.kind {
        AssessmentKind::Sjt => SJT_EVALUATION_TEMPLATE,
        AssessmentKind::Interview => INTERVIEW_EVALUATION_TEMPLATE,
    };
    let or_missing = |s: &str| {
        if s.trim().is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            s.trim().to_string()
        }
    };

    fill_template(
        template,
        &[
            ("situation", or_missing(request.situation.as_deref().unwrap_or(""))),
            ("question", or_missing(request.question.as_str())),
            ("competency", request.competency.clone()),
            ("best_rationale", or_missing(request.best_rationale.as_str())),
            ("worst_rationale", or_missing(request.worst_rationale.as_str())),
            ("candidate_answer", request.candidate_answer.clone()),
            ("scoring_scale", SCORING_SCALE_INSTRUCTION.to_string()),
            ("rationale_instruction", RATIONALE_INSTRUCTION.to_string()),
        ],
    )
}

/// Single-pass `{key}` substitution. Values are inserted verbatim, so candidate
/// text that happens to contain `{competency}` is not expanded again.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len() + 512);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
