//! Axum route handlers for the Assessment API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::controller::{generate_report, GenerateRequest, ReportSource};
use crate::assessment::models::{AnalysisStatus, AssessmentKind, Report};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Every field is optional at the serde layer; `validate` turns missing values
/// into 400 INVALID_REQUEST. Bodies that fail to deserialize at all are mapped
/// to the same error in `handle_analyze`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub submission_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub success: bool,
    pub submission_id: Uuid,
    pub regenerated: bool,
    pub source: ReportSource,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub submission_id: Uuid,
    pub status: AnalysisStatus,
    pub report: Report,
    pub analysis_completed_at: Option<DateTime<Utc>>,
    pub regenerated_at: Option<DateTime<Utc>>,
}

impl AnalyzeRequest {
    fn validate(&self) -> Result<GenerateRequest, AppError> {
        let raw_id = self
            .submission_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::InvalidRequest("submissionId is required".to_string()))?;
        let submission_id = Uuid::parse_str(raw_id).map_err(|_| {
            AppError::InvalidRequest(format!("submissionId '{raw_id}' is not a valid id"))
        })?;

        let raw_kind = self
            .kind
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::InvalidRequest("type is required".to_string()))?;
        let kind = AssessmentKind::parse(raw_kind).ok_or_else(|| {
            AppError::InvalidRequest(format!("type must be 'interview' or 'sjt', got '{raw_kind}'"))
        })?;

        Ok(GenerateRequest {
            submission_id,
            kind,
            force_regenerate: self.force_regenerate,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/assessments/analyze
///
/// Generates (or returns the cached) report for a submission.
/// `forceRegenerate: true` re-runs the whole pipeline and replaces the stored report.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;
    let request = request.validate()?;
    let submission_id = request.submission_id;

    let outcome = generate_report(
        state.store.as_ref(),
        Arc::clone(&state.evaluator),
        &state.scoring,
        request,
    )
    .await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        submission_id,
        regenerated: outcome.regenerated,
        source: outcome.source,
    }))
}

/// GET /api/v1/submissions/:id/report
///
/// Returns the current report. 404 when the submission is unknown or not yet analyzed.
pub async fn handle_get_report(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
) -> Result<Json<ReportResponse>, AppError> {
    let submission = state
        .store
        .get_by_id(submission_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {submission_id} not found")))?;

    let status = submission.status();
    let report = submission.report.ok_or_else(|| {
        AppError::NotFound(format!("Submission {submission_id} has not been analyzed yet"))
    })?;

    Ok(Json(ReportResponse {
        submission_id,
        status,
        report,
        analysis_completed_at: submission.analysis_completed_at,
        regenerated_at: submission.regenerated_at,
    }))
}
