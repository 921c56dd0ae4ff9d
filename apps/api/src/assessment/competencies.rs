//! Competency-set parsing.
//!
//! Stored questions name their competencies as free text: either a JSON list or
//! a single comma-separated string ("Decision Making, Integrity"). Everything
//! downstream works on the normalized set produced here.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Competency assigned when a question names none.
pub const DEFAULT_COMPETENCY: &str = "General";

/// Raw `assessedCompetencies` field as it appears in stored submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompetencyField {
    List(Vec<String>),
    Text(String),
}

impl Default for CompetencyField {
    fn default() -> Self {
        CompetencyField::List(Vec::new())
    }
}

/// Splits on commas, trims, collapses inner whitespace and drops empties.
/// Falls back to [`DEFAULT_COMPETENCY`] so the result is never empty.
/// Case is preserved: "leadership" and "Leadership" are distinct competencies.
pub fn normalize_competencies(field: &CompetencyField) -> BTreeSet<String> {
    let parts: Vec<&str> = match field {
        CompetencyField::List(items) => items.iter().flat_map(|i| i.split(',')).collect(),
        CompetencyField::Text(text) => text.split(',').collect(),
    };

    let mut set: BTreeSet<String> = parts
        .into_iter()
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect();

    if set.is_empty() {
        set.insert(DEFAULT_COMPETENCY.to_string());
    }
    set
}
