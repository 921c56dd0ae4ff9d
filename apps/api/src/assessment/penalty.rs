//! Follow-up penalty.
//!
//! A scenario that needed clarifying follow-up questions scores lower than one
//! the candidate handled unprompted. The reduction is a flat percentage of the
//! raw score, floored at zero.

use std::collections::{BTreeSet, HashMap};

use crate::assessment::models::{Evaluation, PenaltyAdjustedEvaluation, QuestionRecord};

/// Applies the follow-up penalty to a single score.
pub fn adjust(raw_score: f64, has_follow_up: bool, penalty_percent: f64) -> f64 {
    if !has_follow_up {
        return raw_score;
    }
    (raw_score - raw_score * penalty_percent / 100.0).max(0.0)
}

/// Returns the scenario ids that count as having a follow-up.
///
/// A scenario qualifies when any of its records is flagged `is_follow_up`, or
/// when more than one record shares its `scenario_id`. Either signal is enough.
pub fn follow_up_scenarios(records: &[QuestionRecord]) -> BTreeSet<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut flagged = BTreeSet::new();

    for record in records {
        *counts.entry(record.scenario_id.as_str()).or_insert(0) += 1;
        if record.is_follow_up {
            flagged.insert(record.scenario_id.clone());
        }
    }

    flagged.extend(
        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.to_string()),
    );
    flagged
}

/// Attaches penalty fields to each evaluation.
pub fn apply_penalties(
    evaluations: Vec<Evaluation>,
    follow_ups: &BTreeSet<String>,
    penalty_percent: f64,
) -> Vec<PenaltyAdjustedEvaluation> {
    evaluations
        .into_iter()
        .map(|evaluation| {
            let has_follow_up = follow_ups.contains(&evaluation.scenario_id);
            let penalty_percent = if has_follow_up { penalty_percent } else { 0.0 };
            let adjusted_score = adjust(evaluation.raw_score, has_follow_up, penalty_percent);
            PenaltyAdjustedEvaluation {
                evaluation,
                has_follow_up,
                penalty_percent,
                adjusted_score,
            }
        })
        .collect()
}
