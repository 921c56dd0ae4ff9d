//! Shared fixtures and test doubles for the assessment engine.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::assessment::classifier::PerformanceLevel;
use crate::assessment::competencies::{normalize_competencies, CompetencyField};
use crate::assessment::evaluator::{EvaluationRequest, Evaluator, EvaluatorError, EvaluatorOutput};
use crate::assessment::models::{
    AssessmentKind, CompetencyAggregate, Evaluation, PenaltyAdjustedEvaluation, QuestionRecord,
    Submission,
};
use crate::assessment::store::{ReportUpdate, StoreError, SubmissionStore};
use crate::assessment::synthesizer::SubmissionStats;

/// Answered record whose question text is `Q{number}`.
pub fn record(
    number: u32,
    scenario: &str,
    competencies: &str,
    is_follow_up: bool,
) -> QuestionRecord {
    QuestionRecord {
        question_number: number,
        question: format!("Q{number}"),
        candidate_answer: Some(format!("Answer to question {number}.")),
        situation: Some(format!("Situation for {scenario}.")),
        best_rationale: "Takes ownership and explains the trade-offs.".to_string(),
        worst_rationale: "Ignores the problem.".to_string(),
        assessed_competencies: normalize_competencies(&CompetencyField::Text(
            competencies.to_string(),
        )),
        is_follow_up,
        scenario_id: scenario.to_string(),
    }
}

pub fn submission(kind: AssessmentKind, records: Vec<QuestionRecord>) -> Submission {
    Submission {
        id: Uuid::new_v4(),
        kind,
        records,
        report: None,
        analysis_completed_at: None,
        regenerated_at: None,
    }
}

pub fn evaluation(competency: &str, raw: f64, question: u32, scenario: &str) -> Evaluation {
    Evaluation {
        competency: competency.to_string(),
        raw_score: raw,
        rationale: format!("Rationale for question {question}."),
        question_number: question,
        scenario_id: scenario.to_string(),
    }
}

pub fn adjusted(
    competency: &str,
    raw: f64,
    adjusted_score: f64,
    question: u32,
    scenario: &str,
) -> PenaltyAdjustedEvaluation {
    let has_follow_up = adjusted_score != raw;
    PenaltyAdjustedEvaluation {
        evaluation: evaluation(competency, raw, question, scenario),
        has_follow_up,
        penalty_percent: if has_follow_up { 10.0 } else { 0.0 },
        adjusted_score,
    }
}

/// Aggregate with a single unpenalized evaluation scoring `average`.
pub fn aggregate_with(name: &str, average: f64) -> CompetencyAggregate {
    CompetencyAggregate {
        name: name.to_string(),
        evaluations: vec![adjusted(name, average, average, 1, "s1")],
        average_raw: average,
        average_adjusted: average,
        performance_level: PerformanceLevel::from_score(average),
        representative_rationale: format!("The candidate showed {name}."),
    }
}

pub fn stats(
    kind: AssessmentKind,
    units_total: usize,
    units_answered: usize,
    evaluation_count: usize,
    follow_up_scenarios: usize,
) -> SubmissionStats {
    SubmissionStats {
        kind,
        units_total,
        units_answered,
        evaluation_count,
        follow_up_scenarios,
        penalty_percent: 10.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    submissions: Mutex<HashMap<Uuid, Submission>>,
    updates: Mutex<Vec<ReportUpdate>>,
    fail_updates: bool,
}

impl MemoryStore {
    pub fn with(submission: Submission) -> Self {
        let store = Self::default();
        store.insert(submission);
        store
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub fn insert(&self, submission: Submission) {
        self.submissions
            .lock()
            .unwrap()
            .insert(submission.id, submission);
    }

    pub fn get(&self, id: Uuid) -> Option<Submission> {
        self.submissions.lock().unwrap().get(&id).cloned()
    }

    pub fn updates(&self) -> Vec<ReportUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self.get(id))
    }

    async fn update_report(&self, id: Uuid, update: ReportUpdate) -> Result<(), StoreError> {
        if self.fail_updates {
            return Err(StoreError::Missing(id));
        }
        let mut submissions = self.submissions.lock().unwrap();
        let submission = submissions.get_mut(&id).ok_or(StoreError::Missing(id))?;
        submission.report = Some(update.report.clone());
        submission.analysis_completed_at = Some(update.analysis_completed_at);
        if update.regenerated_at.is_some() {
            submission.regenerated_at = update.regenerated_at;
        }
        self.updates.lock().unwrap().push(update);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted evaluator
// ────────────────────────────────────────────────────────────────────────────

/// Evaluator keyed by (question text, competency). Unscripted pairs score 5.0.
#[derive(Default)]
pub struct ScriptedEvaluator {
    scores: HashMap<(String, String), Option<f64>>,
    delays: HashMap<String, Duration>,
    panics: HashSet<String>,
    default_delay: Option<Duration>,
    fail_all: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedEvaluator {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_score(mut self, question: &str, competency: &str, score: f64) -> Self {
        self.scores
            .insert((question.to_string(), competency.to_string()), Some(score));
        self
    }

    pub fn with_failure(mut self, question: &str, competency: &str) -> Self {
        self.scores
            .insert((question.to_string(), competency.to_string()), None);
        self
    }

    /// The evaluator task panics when asked about `question`.
    pub fn with_panic_for(mut self, question: &str) -> Self {
        self.panics.insert(question.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    pub fn with_delay_for(mut self, question: &str, delay: Duration) -> Self {
        self.delays.insert(question.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluatorOutput, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panics.contains(&request.question) {
            panic!("scripted evaluator panicked on {}", request.question);
        }
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = self
            .delays
            .get(&request.question)
            .copied()
            .or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_all {
            return Err(EvaluatorError::InvalidScore);
        }
        match self
            .scores
            .get(&(request.question.clone(), request.competency.clone()))
        {
            Some(None) => Err(EvaluatorError::InvalidScore),
            Some(Some(score)) => Ok(EvaluatorOutput {
                score: *score,
                rationale: format!(
                    "The candidate's answer to {} showed {} at level {score}.",
                    request.question, request.competency
                ),
            }),
            None => Ok(EvaluatorOutput {
                score: 5.0,
                rationale: "The candidate gave an adequate answer.".to_string(),
            }),
        }
    }
}
