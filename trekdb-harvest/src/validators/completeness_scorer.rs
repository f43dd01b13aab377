//! Completeness Scorer
//!
//! Ranks character records by how much data they carry, so the
//! deduplicator can pick the most complete member of an identity group.
//!
//! # Scoring Algorithm
//! - +1 per populated field (null, blank strings, empty arrays/objects don't count;
//!   the `keep` flag itself is ignored)
//! - +`important_field_bonus` per populated biographical field in [`IMPORTANT_FIELDS`]
//! - +`species_bonus` when at least one species is known
//! - +`image_bonus` when a wiki image has been resolved
//!
//! The weights are tuning constants. They only need to rank more complete
//! records higher; the exact magnitudes carry no further meaning.

use serde_json::Value;
use trekdb_common::models::CharacterRecord;

/// Biographical fields earning the important-field bonus (JSON names)
pub const IMPORTANT_FIELDS: &[&str] = &[
    "gender",
    "yearOfBirth",
    "yearOfDeath",
    "height",
    "weight",
    "performer",
    "status",
];

/// Fields never counted
const IGNORED_FIELDS: &[&str] = &["keep"];

/// Bonus magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    pub important_field_bonus: u32,
    pub species_bonus: u32,
    pub image_bonus: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            important_field_bonus: 2,
            species_bonus: 3,
            image_bonus: 10,
        }
    }
}

/// Completeness Scorer
#[derive(Debug, Clone, Default)]
pub struct CompletenessScorer {
    weights: ScoreWeights,
}

impl CompletenessScorer {
    /// Scorer with default weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Scorer with custom weights
    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Score a single record
    pub fn score(&self, record: &CharacterRecord) -> u32 {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                tracing::warn!(uid = %record.uid, "Record did not serialize to an object, scoring 0");
                return 0;
            }
        };

        let mut score = 0u32;
        for (field, value) in &fields {
            if IGNORED_FIELDS.contains(&field.as_str()) || !is_populated(value) {
                continue;
            }
            score += 1;
            if IMPORTANT_FIELDS.contains(&field.as_str()) {
                score += self.weights.important_field_bonus;
            }
        }

        if !record.species.is_empty() {
            score += self.weights.species_bonus;
        }

        let has_image = record
            .wiki_image
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if has_image {
            score += self.weights.image_bonus;
        }

        score
    }
}

/// Score with default weights
pub fn score_record(record: &CharacterRecord) -> u32 {
    CompletenessScorer::new().score(record)
}

/// Whether a JSON value counts as a populated field
fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}
