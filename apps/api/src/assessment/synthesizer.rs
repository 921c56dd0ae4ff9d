//! Report synthesis: turns classified aggregates into the stored report prose.
//!
//! Pure functions of their inputs: the same aggregates, classification and
//! stats always render byte-identical text.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::assessment::aggregator::mean_one_decimal;
use crate::assessment::classifier::{Classification, PerformanceLevel};
use crate::assessment::models::{
    AssessmentKind, CompetencyAggregate, PenaltyAdjustedEvaluation, QuestionRecord, Report,
};

/// Rationale excerpts are cut to this many sentences. Downstream rendering
/// assumes short paragraphs.
pub const MAX_RATIONALE_SENTENCES: usize = 3;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Counts the summary paragraph reports on.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionStats {
    pub kind: AssessmentKind,
    /// Scenarios for SJT, questions for interviews.
    pub units_total: usize,
    pub units_answered: usize,
    pub evaluation_count: usize,
    /// Scenarios that needed a follow-up, whether or not the penalty changed any score.
    pub follow_up_scenarios: usize,
    pub penalty_percent: f64,
}

impl SubmissionStats {
    pub fn collect(
        kind: AssessmentKind,
        records: &[QuestionRecord],
        evaluations: &[PenaltyAdjustedEvaluation],
        penalty_percent: f64,
    ) -> Self {
        let (units_total, units_answered) = match kind {
            AssessmentKind::Interview => (
                records.len(),
                records.iter().filter(|r| r.answer().is_some()).count(),
            ),
            AssessmentKind::Sjt => {
                let all: BTreeSet<&str> = records.iter().map(|r| r.scenario_id.as_str()).collect();
                let answered: BTreeSet<&str> = records
                    .iter()
                    .filter(|r| r.answer().is_some())
                    .map(|r| r.scenario_id.as_str())
                    .collect();
                (all.len(), answered.len())
            }
        };

        let follow_up_scenarios = evaluations
            .iter()
            .filter(|e| e.has_follow_up)
            .map(|e| e.evaluation.scenario_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            kind,
            units_total,
            units_answered,
            evaluation_count: evaluations.len(),
            follow_up_scenarios,
            penalty_percent,
        }
    }
}

/// Builds the report. Total: an empty aggregate list produces the fallback report.
pub fn synthesize(
    aggregates: &[CompetencyAggregate],
    classification: &Classification,
    stats: &SubmissionStats,
    generated_at: DateTime<Utc>,
) -> Report {
    if aggregates.is_empty() {
        return fallback_report(stats, generated_at);
    }

    let strengths_text = if classification.strengths.is_empty() {
        classification.strengths_placeholder()
    } else {
        render_section(&classification.strengths)
    };
    let weaknesses_text = if classification.weaknesses.is_empty() {
        classification.weaknesses_placeholder()
    } else {
        render_section(&classification.weaknesses)
    };

    Report {
        strengths_text,
        weaknesses_text,
        summary_text: render_summary(aggregates, classification, stats),
        competency_table: sorted_table(aggregates),
        generated_at,
        is_regeneration: false,
    }
}

/// Report produced when nothing could be evaluated.
pub fn fallback_report(stats: &SubmissionStats, generated_at: DateTime<Utc>) -> Report {
    Report {
        strengths_text:
            "No detailed strengths analysis is available because no answers could be evaluated."
                .to_string(),
        weaknesses_text:
            "No detailed development analysis is available because no answers could be evaluated."
                .to_string(),
        summary_text: format!(
            "The candidate completed {} of {} {}. No detailed analysis is available for this submission.",
            stats.units_answered,
            stats.units_total,
            stats.kind.unit_noun()
        ),
        competency_table: Vec::new(),
        generated_at,
        is_regeneration: false,
    }
}

/// Cuts `text` after `max_sentences` sentence boundaries.
///
/// A boundary is `.` or `!` followed by whitespace, or any `?`. Text with fewer
/// boundaries is returned whole (trimmed).
pub fn trim_to_sentences(text: &str, max_sentences: usize) -> String {
    let text = text.trim();
    if max_sentences == 0 {
        return String::new();
    }

    let mut count = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '?' => true,
            '.' | '!' => chars.peek().map_or(false, |(_, next)| next.is_whitespace()),
            _ => false,
        };
        if boundary {
            count += 1;
            if count == max_sentences {
                return text[..i + c.len_utf8()].to_string();
            }
        }
    }
    text.to_string()
}

/// Joins multi-line evaluator output into one prose line, dropping list markers.
fn flatten_prose(text: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix("• "))
                .unwrap_or(line)
        })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_section(items: &[CompetencyAggregate]) -> String {
    items
        .iter()
        .map(render_competency)
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

fn render_competency(aggregate: &CompetencyAggregate) -> String {
    let scores = if aggregate.average_raw != aggregate.average_adjusted {
        format!(
            "an average score of {:.1}/10 ({:.1}/10 before the follow-up penalty)",
            aggregate.average_adjusted, aggregate.average_raw
        )
    } else {
        format!("an average score of {:.1}/10", aggregate.average_adjusted)
    };

    let mut paragraph = format!(
        "{}: {} performance with {}.",
        aggregate.name,
        aggregate.performance_level.label(),
        scores
    );

    let rationale = trim_to_sentences(
        &flatten_prose(&aggregate.representative_rationale),
        MAX_RATIONALE_SENTENCES,
    );
    if !rationale.is_empty() {
        paragraph.push(' ');
        paragraph.push_str(&rationale);
    }
    paragraph
}

fn render_summary(
    aggregates: &[CompetencyAggregate],
    classification: &Classification,
    stats: &SubmissionStats,
) -> String {
    let overall = mean_one_decimal(
        aggregates
            .iter()
            .flat_map(|a| a.evaluations.iter().map(|e| e.adjusted_score)),
    );
    let level = PerformanceLevel::from_score(overall);

    let penalty_sentence = match (stats.follow_up_scenarios, stats.penalty_percent > 0.0) {
        (0, _) => "No scenario required follow-up questions.".to_string(),
        (1, true) => format!(
            "1 scenario required follow-up questions and received a {}% score penalty.",
            stats.penalty_percent
        ),
        (n, true) => format!(
            "{n} scenarios required follow-up questions and received a {}% score penalty.",
            stats.penalty_percent
        ),
        (1, false) => {
            "1 scenario required follow-up questions; no score penalty was applied.".to_string()
        }
        (n, false) => {
            format!("{n} scenarios required follow-up questions; no score penalty was applied.")
        }
    };

    let closing = match classification
        .strengths
        .len()
        .cmp(&classification.weaknesses.len())
    {
        std::cmp::Ordering::Greater => {
            "Overall, the candidate's strengths outweigh the identified development areas."
        }
        std::cmp::Ordering::Less => {
            "Overall, the identified development areas outweigh the candidate's strengths, and targeted development is recommended."
        }
        std::cmp::Ordering::Equal => {
            "Overall, the candidate shows a balanced profile of strengths and development areas."
        }
    };

    format!(
        "The candidate answered {} of {} {}, producing {} competency evaluations across {} competencies. \
The overall average adjusted score is {:.1}/10, an overall performance level of {}. {} {}",
        stats.units_answered,
        stats.units_total,
        stats.kind.unit_noun(),
        stats.evaluation_count,
        aggregates.len(),
        overall,
        level.label(),
        penalty_sentence,
        closing
    )
}

fn sorted_table(aggregates: &[CompetencyAggregate]) -> Vec<CompetencyAggregate> {
    let mut table = aggregates.to_vec();
    table.sort_by(|a, b| a.name.cmp(&b.name));
    table
}
