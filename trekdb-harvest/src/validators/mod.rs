//! Record quality checks

pub mod completeness_scorer;

pub use completeness_scorer::{score_record, CompletenessScorer, ScoreWeights, IMPORTANT_FIELDS};
