use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::classifier::PerformanceLevel;

/// Which assessment flow produced a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    /// Job-description based structured interview.
    Interview,
    /// Situational-judgment test.
    Sjt,
}

impl AssessmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Interview => "interview",
            AssessmentKind::Sjt => "sjt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "interview" | "jdt" => Some(AssessmentKind::Interview),
            "sjt" => Some(AssessmentKind::Sjt),
            _ => None,
        }
    }

    /// Plural noun used when the summary counts answered units.
    pub fn unit_noun(&self) -> &'static str {
        match self {
            AssessmentKind::Interview => "questions",
            AssessmentKind::Sjt => "scenarios",
        }
    }
}

/// One asked question and the candidate's answer, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_number: u32,
    pub question: String,
    pub candidate_answer: Option<String>,
    pub situation: Option<String>,
    pub best_rationale: String,
    pub worst_rationale: String,
    /// Never empty: defaulted by `competencies::normalize_competencies`.
    pub assessed_competencies: BTreeSet<String>,
    pub is_follow_up: bool,
    pub scenario_id: String,
}

impl QuestionRecord {
    /// Answer text if the candidate actually answered (blank counts as unanswered).
    pub fn answer(&self) -> Option<&str> {
        self.candidate_answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// One (record × competency) result returned by the evaluator. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub competency: String,
    pub raw_score: f64,
    pub rationale: String,
    pub question_number: u32,
    pub scenario_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PenaltyAdjustedEvaluation {
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub has_follow_up: bool,
    pub penalty_percent: f64,
    /// Invariant: `0 <= adjusted_score <= evaluation.raw_score`.
    pub adjusted_score: f64,
}

/// Per-competency roll-up. Rebuilt from scratch on every synthesis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetencyAggregate {
    pub name: String,
    pub evaluations: Vec<PenaltyAdjustedEvaluation>,
    pub average_raw: f64,
    pub average_adjusted: f64,
    pub performance_level: PerformanceLevel,
    pub representative_rationale: String,
}

/// The synthesized report stored on a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub strengths_text: String,
    pub weaknesses_text: String,
    pub summary_text: String,
    pub competency_table: Vec<CompetencyAggregate>,
    pub generated_at: DateTime<Utc>,
    pub is_regeneration: bool,
}

/// Lifecycle of a submission's report.
///
/// `Analyzing` only exists for the duration of a controller run; it is never
/// persisted, so an abandoned run leaves the stored status untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotAnalyzed,
    Analyzing,
    Analyzed,
}

/// A submission as the engine sees it: normalized records plus the current report.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: uuid::Uuid,
    pub kind: AssessmentKind,
    pub records: Vec<QuestionRecord>,
    pub report: Option<Report>,
    pub analysis_completed_at: Option<DateTime<Utc>>,
    pub regenerated_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn status(&self) -> AnalysisStatus {
        if self.report.is_some() {
            AnalysisStatus::Analyzed
        } else {
            AnalysisStatus::NotAnalyzed
        }
    }
}
