//! Competency aggregation.
//!
//! Groups penalty-adjusted evaluations by competency name, averages them and
//! picks the rationale that best represents each group. Output order is
//! alphabetical by name regardless of input order, so reports stay comparable
//! across regenerations no matter how evaluator calls completed.

use std::collections::BTreeMap;

use crate::assessment::classifier::PerformanceLevel;
use crate::assessment::models::{CompetencyAggregate, PenaltyAdjustedEvaluation};

/// Absorbs binary representation error so that e.g. 1.15 rounds to 1.2.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Rounds to one decimal digit, halves rounding up.
pub fn round_one_decimal(value: f64) -> f64 {
    ((value * 10.0) + ROUNDING_EPSILON).round() / 10.0
}

/// Unweighted arithmetic mean, rounded to one decimal. Empty input yields 0.0.
pub fn mean_one_decimal(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0_f64, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        return 0.0;
    }
    round_one_decimal(sum / count as f64)
}

pub fn aggregate(evaluations: Vec<PenaltyAdjustedEvaluation>) -> Vec<CompetencyAggregate> {
    let mut groups: BTreeMap<String, Vec<PenaltyAdjustedEvaluation>> = BTreeMap::new();
    for evaluation in evaluations {
        groups
            .entry(evaluation.evaluation.competency.clone())
            .or_default()
            .push(evaluation);
    }

    groups
        .into_iter()
        .map(|(name, mut evaluations)| {
            evaluations.sort_by(|a, b| {
                a.evaluation
                    .question_number
                    .cmp(&b.evaluation.question_number)
                    .then_with(|| a.evaluation.scenario_id.cmp(&b.evaluation.scenario_id))
            });

            let average_raw = mean_one_decimal(evaluations.iter().map(|e| e.evaluation.raw_score));
            let average_adjusted = mean_one_decimal(evaluations.iter().map(|e| e.adjusted_score));
            let representative_rationale = representative_rationale(&evaluations, average_adjusted);

            CompetencyAggregate {
                name,
                evaluations,
                average_raw,
                average_adjusted,
                performance_level: PerformanceLevel::from_score(average_adjusted),
                representative_rationale,
            }
        })
        .collect()
}

/// Rationale of the evaluation whose adjusted score sits closest to the group
/// average. Empty rationales are skipped; ties go to the lowest question number
/// (evaluations arrive sorted).
fn representative_rationale(evaluations: &[PenaltyAdjustedEvaluation], average: f64) -> String {
    evaluations
        .iter()
        .filter(|e| !e.evaluation.rationale.trim().is_empty())
        .fold(None::<(&PenaltyAdjustedEvaluation, f64)>, |best, e| {
            let distance = (e.adjusted_score - average).abs();
            match best {
                Some((_, d)) if d <= distance => best,
                _ => Some((e, distance)),
            }
        })
        .map(|(e, _)| e.evaluation.rationale.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::testing::adjusted;

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(aggregate(vec![]).is_empty());
    }

    #[test]
    fn test_groups_are_sorted_alphabetically() {
        let aggregates = aggregate(vec![
            adjusted("Teamwork", 6.0, 6.0, 1, "s1"),
            adjusted("Adaptability", 5.0, 5.0, 2, "s2"),
            adjusted("Integrity", 9.0, 9.0, 3, "s3"),
        ]);
        let names: Vec<_> = aggregates.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Adaptability", "Integrity", "Teamwork"]);
    }

    #[test]
    fn test_output_is_invariant_under_input_permutation() {
        let items = vec![
            adjusted("Teamwork", 6.0, 5.4, 1, "s1"),
            adjusted("Adaptability", 5.0, 5.0, 2, "s2"),
            adjusted("Teamwork", 8.0, 8.0, 3, "s3"),
            adjusted("Integrity", 9.0, 9.0, 4, "s4"),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        let mut rotated = items.clone();
        rotated.rotate_left(2);

        let baseline = aggregate(items);
        assert_eq!(aggregate(reversed), baseline);
        assert_eq!(aggregate(rotated), baseline);
    }

    #[test]
    fn test_averages_are_unweighted_and_rounded() {
        let aggregates = aggregate(vec![
            adjusted("Decision Making", 8.0, 7.2, 1, "s1"),
            adjusted("Decision Making", 6.0, 5.4, 3, "s2"),
            adjusted("Decision Making", 4.0, 3.6, 5, "s3"),
        ]);
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].average_raw, 6.0);
        assert_eq!(aggregates[0].average_adjusted, 5.4);
        assert_eq!(aggregates[0].evaluations.len(), 3);
    }

    #[test]
    fn test_same_competency_in_multiple_scenarios_counts_each() {
        let aggregates = aggregate(vec![
            adjusted("Integrity", 7.0, 7.0, 1, "s1"),
            adjusted("Integrity", 7.0, 7.0, 2, "s2"),
        ]);
        assert_eq!(aggregates[0].evaluations.len(), 2);
    }

    #[test]
    fn test_round_one_decimal_half_rounds_up() {
        assert_eq!(round_one_decimal(2.25), 2.3);
        assert_eq!(round_one_decimal(1.15), 1.2);
        assert_eq!(round_one_decimal(5.44), 5.4);
        assert_eq!(round_one_decimal(0.0), 0.0);
        assert_eq!(round_one_decimal(10.0), 10.0);
    }

    #[test]
    fn test_representative_rationale_is_closest_to_average() {
        let mut low = adjusted("Teamwork", 2.0, 2.0, 1, "s1");
        low.evaluation.rationale = "Ignored the team.".to_string();
        let mut mid = adjusted("Teamwork", 5.0, 5.0, 2, "s2");
        mid.evaluation.rationale = "Consulted some colleagues.".to_string();
        let mut high = adjusted("Teamwork", 8.0, 8.0, 3, "s3");
        high.evaluation.rationale = "Built consensus.".to_string();

        let aggregates = aggregate(vec![high, low, mid]);
        assert_eq!(
            aggregates[0].representative_rationale,
            "Consulted some colleagues."
        );
    }

    #[test]
    fn test_representative_rationale_skips_blank_text() {
        let mut blank = adjusted("Teamwork", 5.0, 5.0, 1, "s1");
        blank.evaluation.rationale = "  ".to_string();
        let mut other = adjusted("Teamwork", 9.0, 9.0, 2, "s2");
        other.evaluation.rationale = "Strong answer.".to_string();

        let aggregates = aggregate(vec![blank, other]);
        assert_eq!(aggregates[0].representative_rationale, "Strong answer.");
    }

    #[test]
    fn test_performance_level_follows_adjusted_average() {
        let aggregates = aggregate(vec![adjusted("Integrity", 8.0, 7.2, 1, "s1")]);
        assert_eq!(aggregates[0].performance_level, PerformanceLevel::Strong);
    }
}
