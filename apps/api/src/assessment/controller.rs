//! Report generation: orchestrates the scoring pipeline for one submission.
//!
//! Flow: load submission → (cache check) → evaluator fan-out → penalties →
//!       aggregate → classify → synthesize → persist → return outcome.
//!
//! A run either persists a complete report or persists nothing. Evaluator calls
//! are bounded by a semaphore and the whole fan-out by a timeout; dropping the
//! `JoinSet` on timeout or cancellation aborts whatever is still in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assessment::aggregator::aggregate;
use crate::assessment::classifier::classify;
use crate::assessment::evaluator::{EvaluationRequest, Evaluator, EvaluatorError, EvaluatorOutput};
use crate::assessment::models::{AnalysisStatus, AssessmentKind, Evaluation, QuestionRecord, Report};
use crate::assessment::penalty::{apply_penalties, follow_up_scenarios};
use crate::assessment::store::{ReportUpdate, SubmissionStore};
use crate::assessment::synthesizer::{synthesize, SubmissionStats};
use crate::config::ScoringConfig;
use crate::errors::AppError;

/// Input to a generation run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub submission_id: Uuid,
    /// Kind the caller believes the submission has; a mismatch is rejected.
    pub kind: AssessmentKind,
    pub force_regenerate: bool,
}

/// Where the returned report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    /// Existing report returned without recomputation.
    Cached,
    /// New report computed and persisted.
    Generated,
    /// No evaluation succeeded; the prior report stays authoritative.
    PreviousReport,
}

#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub report: Report,
    pub source: ReportSource,
    pub regenerated: bool,
}

/// One evaluator call, tagged with what the result must be attributed to.
#[derive(Debug, Clone)]
struct EvaluationJob {
    question_number: u32,
    scenario_id: String,
    request: EvaluationRequest,
}

/// Runs the full generation pipeline for a submission.
///
/// Returns the cached report when one exists and `force_regenerate` is false;
/// the evaluator is not called in that case.
pub async fn generate_report(
    store: &dyn SubmissionStore,
    evaluator: Arc<dyn Evaluator>,
    config: &ScoringConfig,
    request: GenerateRequest,
) -> Result<GenerateOutcome, AppError> {
    let submission_id = request.submission_id;

    let submission = store
        .get_by_id(submission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {submission_id} not found")))?;

    if submission.kind != request.kind {
        return Err(AppError::InvalidRequest(format!(
            "Submission {submission_id} is a {} submission, not {}",
            submission.kind.as_str(),
            request.kind.as_str()
        )));
    }

    if let Some(existing) = submission.report.clone() {
        if !request.force_regenerate {
            info!("Submission {submission_id} already analyzed, returning cached report");
            return Ok(GenerateOutcome {
                report: existing,
                source: ReportSource::Cached,
                regenerated: false,
            });
        }
    }

    info!(
        "Submission {submission_id}: {:?} -> {:?} (force_regenerate={})",
        submission.status(),
        AnalysisStatus::Analyzing,
        request.force_regenerate
    );

    // Step 1: Evaluator fan-out
    let jobs = build_jobs(submission.kind, &submission.records);
    let job_count = jobs.len();
    let timeout = config.evaluation_timeout;

    let evaluations = tokio::time::timeout(
        timeout,
        run_evaluations(
            submission_id,
            evaluator,
            jobs,
            config.evaluator_concurrency,
        ),
    )
    .await
    .map_err(|_| AppError::EvaluationTimeout(timeout.as_secs()))?;

    info!(
        "Submission {submission_id}: {}/{} evaluations succeeded",
        evaluations.len(),
        job_count
    );

    if evaluations.is_empty() {
        if let Some(previous) = submission.report {
            warn!(
                "Submission {submission_id}: no evaluation succeeded ({job_count} attempted), keeping previous report"
            );
            return Ok(GenerateOutcome {
                report: previous,
                source: ReportSource::PreviousReport,
                regenerated: false,
            });
        }
        warn!(
            "Submission {submission_id}: no evaluation succeeded ({job_count} attempted), writing fallback report"
        );
    }

    // Step 2: Penalties → aggregation → classification → synthesis
    let follow_ups = follow_up_scenarios(&submission.records);
    let adjusted = apply_penalties(evaluations, &follow_ups, config.follow_up_penalty_percent);
    let stats = SubmissionStats::collect(
        submission.kind,
        &submission.records,
        &adjusted,
        config.follow_up_penalty_percent,
    );
    let aggregates = aggregate(adjusted);
    let classification = classify(&aggregates, config.thresholds);

    let now = Utc::now();
    let mut report = synthesize(&aggregates, &classification, &stats, now);
    report.is_regeneration = request.force_regenerate;

    // Step 3: Persist as a single update
    store
        .update_report(
            submission_id,
            ReportUpdate {
                report: report.clone(),
                analysis_completed: true,
                analysis_completed_at: now,
                regenerated_at: request.force_regenerate.then_some(now),
            },
        )
        .await?;

    info!(
        "Submission {submission_id}: {:?}, {} competencies ({} strengths, {} weaknesses)",
        AnalysisStatus::Analyzed,
        aggregates.len(),
        classification.strengths.len(),
        classification.weaknesses.len()
    );

    Ok(GenerateOutcome {
        report,
        source: ReportSource::Generated,
        regenerated: request.force_regenerate,
    })
}

/// One job per answered record × assessed competency, in question order.
fn build_jobs(kind: AssessmentKind, records: &[QuestionRecord]) -> Vec<EvaluationJob> {
    records
        .iter()
        .flat_map(|record| {
            record.assessed_competencies.iter().filter_map(move |competency| {
                EvaluationRequest::for_record(kind, record, competency).map(|request| {
                    EvaluationJob {
                        question_number: record.question_number,
                        scenario_id: record.scenario_id.clone(),
                        request,
                    }
                })
            })
        })
        .collect()
}

/// Issues evaluator calls concurrently, at most `max_concurrency` at a time.
///
/// Failed calls are logged and dropped. The result is sorted by
/// (question number, competency) so it does not depend on completion order.
async fn run_evaluations(
    submission_id: Uuid,
    evaluator: Arc<dyn Evaluator>,
    jobs: Vec<EvaluationJob>,
    max_concurrency: usize,
) -> Vec<Evaluation> {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut set: JoinSet<(EvaluationJob, Result<EvaluatorOutput, EvaluatorError>)> =
        JoinSet::new();

    // A panicking task loses its job, so keep enough context to log the skip.
    let mut job_context: HashMap<task::Id, (u32, String)> = HashMap::with_capacity(jobs.len());

    for job in jobs {
        let evaluator = Arc::clone(&evaluator);
        let semaphore = Arc::clone(&semaphore);
        let context = (job.question_number, job.request.competency.clone());
        let handle = set.spawn(async move {
            // The semaphore is never closed, so acquisition only fails if it is dropped.
            let _permit = semaphore.acquire_owned().await;
            let result = evaluator.evaluate(&job.request).await;
            (job, result)
        });
        job_context.insert(handle.id(), context);
    }

    let mut evaluations = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((job, Ok(output))) => evaluations.push(Evaluation {
                competency: job.request.competency,
                raw_score: output.score,
                rationale: output.rationale,
                question_number: job.question_number,
                scenario_id: job.scenario_id,
            }),
            Ok((job, Err(e))) => warn!(
                "Submission {submission_id}: evaluation failed for question {} / '{}', skipping: {e}",
                job.question_number, job.request.competency
            ),
            Err(e) => match job_context.get(&e.id()) {
                Some((question_number, competency)) => warn!(
                    "Submission {submission_id}: evaluator task failed for question {question_number} / '{competency}', skipping: {e}"
                ),
                None => warn!("Submission {submission_id}: evaluator task failed, skipping: {e}"),
            },
        }
    }

    evaluations.sort_by(|a, b| {
        a.question_number
            .cmp(&b.question_number)
            .then_with(|| a.competency.cmp(&b.competency))
    });
    evaluations
}
