//! Strength / weakness classification.
//!
//! Every competency lands in exactly one bucket: strength when its adjusted
//! average reaches the configured threshold (closed lower bound), weakness
//! otherwise. Performance levels come from fixed bands over [0, 10] and are
//! independent of the threshold.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::assessment::models::CompetencyAggregate;

/// Classification cut points. Supplied by configuration, never hard-coded at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub strength: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { strength: 5.0 }
    }
}

/// Performance tier for a 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceLevel {
    NeedsImprovement,
    Developing,
    Good,
    Strong,
    Excellent,
}

impl PerformanceLevel {
    /// Bands: [8,10] Excellent, [7,8) Strong, [5,7) Good, [3,5) Developing, [0,3) Needs Improvement.
    /// Out-of-range input is clamped into the nearest band.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 8.0 => PerformanceLevel::Excellent,
            s if s >= 7.0 => PerformanceLevel::Strong,
            s if s >= 5.0 => PerformanceLevel::Good,
            s if s >= 3.0 => PerformanceLevel::Developing,
            _ => PerformanceLevel::NeedsImprovement,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Strong => "Strong",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Developing => "Developing",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Classifier output. Both buckets hold aggregates in "most notable first" order.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub strengths: Vec<CompetencyAggregate>,
    pub weaknesses: Vec<CompetencyAggregate>,
    pub thresholds: Thresholds,
}

impl Classification {
    /// Sentence used in place of an empty strengths section.
    pub fn strengths_placeholder(&self) -> String {
        format!(
            "No competency reached the strength threshold of {:.1}/10 in this assessment.",
            self.thresholds.strength
        )
    }

    /// Sentence used in place of an empty weaknesses section.
    pub fn weaknesses_placeholder(&self) -> String {
        format!(
            "Every assessed competency met the strength threshold of {:.1}/10, so no specific development areas were identified.",
            self.thresholds.strength
        )
    }
}

pub fn classify(aggregates: &[CompetencyAggregate], thresholds: Thresholds) -> Classification {
    let (mut strengths, mut weaknesses): (Vec<_>, Vec<_>) = aggregates
        .iter()
        .cloned()
        .partition(|a| a.average_adjusted >= thresholds.strength);

    strengths.sort_by(|a, b| {
        cmp_scores(b.average_adjusted, a.average_adjusted).then_with(|| a.name.cmp(&b.name))
    });
    weaknesses.sort_by(|a, b| {
        cmp_scores(a.average_adjusted, b.average_adjusted).then_with(|| a.name.cmp(&b.name))
    });

    Classification {
        strengths,
        weaknesses,
        thresholds,
    }
}

fn cmp_scores(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
