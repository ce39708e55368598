//! Scoring: bind a predictor to test data
//!
//! The scorer extends the test schema with prediction columns. The test
//! data must already have gone through the reconstructed pipeline, so the
//! feature columns named by the training binding are guaranteed present.

use crate::error::{Result, TabTrainError};
use crate::roles::{columns_to_array2, RoleBinding};
use crate::trainer::Predictor;
use polars::prelude::*;

/// Name of the appended raw score column.
pub const SCORE_COLUMN: &str = "Score";
/// Name of the appended probability column (classifiers only).
pub const PROBABILITY_COLUMN: &str = "Probability";

/// The scorer contract: pure function of (predictor, test data, binding).
pub trait Scorer {
    fn name(&self) -> &'static str;

    /// Produce a scored dataset: the test schema extended with prediction
    /// columns.
    fn bind(
        &self,
        predictor: &Predictor,
        test: &DataFrame,
        binding: &RoleBinding,
    ) -> Result<DataFrame>;
}

/// Default scorer: appends `Score`, plus `Probability` when the predictor
/// emits probabilities.
pub struct ScoreColumnScorer;

impl Scorer for ScoreColumnScorer {
    fn name(&self) -> &'static str {
        "score-column"
    }

    fn bind(
        &self,
        predictor: &Predictor,
        test: &DataFrame,
        binding: &RoleBinding,
    ) -> Result<DataFrame> {
        let features = columns_to_array2(test, binding.features.columns())?;
        let scores = predictor.score(&features)?;

        let mut scored = test.clone();
        scored = scored
            .with_column(Series::new(SCORE_COLUMN.into(), scores.to_vec()))
            .map_err(|e| TabTrainError::DataError(e.to_string()))?
            .clone();

        if let Some(probs) = predictor.probability(&features) {
            let probs = probs?;
            scored = scored
                .with_column(Series::new(PROBABILITY_COLUMN.into(), probs.to_vec()))
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .clone();
        }

        Ok(scored)
    }
}

/// Select a scorer by name; `None` auto-selects the default.
pub fn create_scorer(name: Option<&str>) -> Result<Box<dyn Scorer>> {
    match name {
        None | Some("auto") | Some("score-column") => Ok(Box::new(ScoreColumnScorer)),
        Some(other) => Err(TabTrainError::ConfigError(format!(
            "Unknown scorer '{}' (from option 'scorer')",
            other
        ))),
    }
}
