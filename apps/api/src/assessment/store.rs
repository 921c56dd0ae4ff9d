//! Submission persistence.
//!
//! Storage sits behind `SubmissionStore`: load a submission, write its report.
//! `PgSubmissionStore` is the PostgreSQL implementation.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::assessment::competencies::{normalize_competencies, CompetencyField};
use crate::assessment::models::{AssessmentKind, QuestionRecord, Report, Submission};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored submission {id} is malformed: {reason}")]
    InvalidData { id: Uuid, reason: String },

    #[error("Submission {0} disappeared before the report could be written")]
    Missing(Uuid),
}

/// Fields written when a report run completes. Applied as a single update.
#[derive(Debug, Clone)]
pub struct ReportUpdate {
    pub report: Report,
    pub analysis_completed: bool,
    pub analysis_completed_at: DateTime<Utc>,
    /// Only set on forced regeneration; `None` keeps the previous marker.
    pub regenerated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;
    async fn update_report(&self, id: Uuid, update: ReportUpdate) -> Result<(), StoreError>;
}

/// A question as stored in the `questions` JSONB column, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQuestion {
    pub question_number: u32,
    pub question: String,
    #[serde(default)]
    pub candidate_answer: Option<String>,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub best_rationale: Option<String>,
    #[serde(default)]
    pub worst_rationale: Option<String>,
    #[serde(default)]
    pub assessed_competencies: CompetencyField,
    #[serde(default)]
    pub is_follow_up: bool,
    #[serde(default)]
    pub scenario_id: Option<String>,
}

/// Normalizes stored questions into records sorted by question number.
///
/// A question without a scenario id forms its own scenario. Duplicate question
/// numbers are rejected: they break the ordering key everything else relies on.
pub fn normalize_questions(
    submission_id: Uuid,
    questions: Vec<StoredQuestion>,
) -> Result<Vec<QuestionRecord>, StoreError> {
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(questions.len());

    for q in questions {
        if !seen.insert(q.question_number) {
            return Err(StoreError::InvalidData {
                id: submission_id,
                reason: format!("duplicate questionNumber {}", q.question_number),
            });
        }
        let scenario_id = q
            .scenario_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| q.question_number.to_string());

        records.push(QuestionRecord {
            question_number: q.question_number,
            question: q.question,
            candidate_answer: q.candidate_answer,
            situation: q.situation,
            best_rationale: q.best_rationale.unwrap_or_default(),
            worst_rationale: q.worst_rationale.unwrap_or_default(),
            assessed_competencies: normalize_competencies(&q.assessed_competencies),
            is_follow_up: q.is_follow_up,
            scenario_id,
        });
    }

    records.sort_by_key(|r| r.question_number);
    Ok(records)
}

#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub kind: String,
    pub questions: Value,
    pub report: Option<Value>,
    pub analysis_completed_at: Option<DateTime<Utc>>,
    pub regenerated_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| StoreError::InvalidData { id: row.id, reason };

        let kind = AssessmentKind::parse(&row.kind)
            .ok_or_else(|| invalid(format!("unknown kind '{}'", row.kind)))?;
        let questions: Vec<StoredQuestion> = serde_json::from_value(row.questions.clone())
            .map_err(|e| invalid(format!("questions: {e}")))?;
        let report = row
            .report
            .clone()
            .map(serde_json::from_value::<Report>)
            .transpose()
            .map_err(|e| invalid(format!("report: {e}")))?;

        Ok(Submission {
            id: row.id,
            kind,
            records: normalize_questions(row.id, questions)?,
            report,
            analysis_completed_at: row.analysis_completed_at,
            regenerated_at: row.regenerated_at,
        })
    }
}

/// PostgreSQL-backed store over the `submissions` table.
#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, kind, questions, report, analysis_completed_at, regenerated_at
            FROM submissions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn update_report(&self, id: Uuid, update: ReportUpdate) -> Result<(), StoreError> {
        let report = serde_json::to_value(&update.report).map_err(|e| StoreError::InvalidData {
            id,
            reason: format!("report serialization: {e}"),
        })?;

        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET report = $2,
                analysis_completed = $3,
                analysis_completed_at = $4,
                regenerated_at = COALESCE($5, regenerated_at),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(report)
        .bind(update.analysis_completed)
        .bind(update.analysis_completed_at)
        .bind(update.regenerated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }
}
