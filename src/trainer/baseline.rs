//! Baseline trainer: predicts the (weighted) label mean

use super::{Predictor, TrainRequest, Trainer, TrainerCapabilities};
use crate::context::RunContext;
use crate::error::{Result, TabTrainError};

/// Predicts the weighted mean of the training labels for every row. Declares
/// no optional-input capabilities, which makes it the reference trainer for
/// capability-gating behavior.
pub struct MeanTrainer;

impl Trainer for MeanTrainer {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn capabilities(&self) -> TrainerCapabilities {
        TrainerCapabilities::default()
    }

    fn train(&self, _ctx: &mut RunContext, req: TrainRequest<'_>) -> Result<Predictor> {
        let labels = req.train.label_values()?;
        if labels.is_empty() {
            return Err(TabTrainError::TrainingError(
                "training data has no rows".to_string(),
            ));
        }

        let value = match req.train.weight_values()? {
            Some(weights) => {
                let total: f64 = weights.sum();
                if total <= 0.0 {
                    return Err(TabTrainError::TrainingError(
                        "weight column sums to zero".to_string(),
                    ));
                }
                labels
                    .iter()
                    .zip(weights.iter())
                    .map(|(y, w)| y * w)
                    .sum::<f64>()
                    / total
            }
            None => labels.mean().unwrap_or(0.0),
        };

        Ok(Predictor::Mean { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Schema;
    use crate::roles::{DeclaredColumns, RoleBinding, RoleMappedData};
    use polars::prelude::*;

    #[test]
    fn test_mean_trainer_uses_weights() {
        let df = df!(
            "Label" => &[0.0, 10.0],
            "Weight" => &[1.0, 3.0],
            "f1" => &[1.0, 2.0]
        )
        .unwrap();
        let binding = RoleBinding::resolve(&Schema::of(&df), &DeclaredColumns::default()).unwrap();
        let data = RoleMappedData::new(df, binding);

        let mut ctx = RunContext::new();
        let predictor = MeanTrainer
            .train(
                &mut ctx,
                TrainRequest {
                    train: &data,
                    validation: None,
                    test: None,
                    seed: None,
                    cache_hint: None,
                },
            )
            .unwrap();
        match predictor {
            Predictor::Mean { value } => assert!((value - 7.5).abs() < 1e-12),
            other => panic!("unexpected predictor {:?}", other),
        }
    }
}
