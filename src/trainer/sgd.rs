//! Gradient-descent linear trainer with validation-based early stopping

use super::{Predictor, TrainRequest, Trainer, TrainerCapabilities};
use crate::context::RunContext;
use crate::error::{Result, TabTrainError};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Linear regression by full-batch gradient descent. Supports a validation
/// set (early stopping on validation RMSE) and an in-training test set
/// (reported, never used to fit). Expects normalized features.
pub struct SgdTrainer {
    learning_rate: f64,
    max_epochs: usize,
    patience: usize,
}

impl SgdTrainer {
    pub fn new() -> Self {
        Self {
            learning_rate: 0.05,
            max_epochs: 500,
            patience: 10,
        }
    }

    fn rmse(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, b: f64) -> f64 {
        let pred = x.dot(w) + b;
        let n = y.len() as f64;
        ((&pred - y).mapv(|e| e * e).sum() / n).sqrt()
    }
}

impl Default for SgdTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for SgdTrainer {
    fn name(&self) -> &'static str {
        "sgd"
    }

    fn capabilities(&self) -> TrainerCapabilities {
        TrainerCapabilities {
            supports_validation: true,
            supports_test: true,
        }
    }

    fn wants_normalization(&self) -> bool {
        true
    }

    fn train(&self, ctx: &mut RunContext, req: TrainRequest<'_>) -> Result<Predictor> {
        let x = req.train.feature_matrix()?;
        let y = req.train.label_values()?;
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(TabTrainError::TrainingError(format!(
                "invalid training inputs: {} feature rows, {} labels",
                n,
                y.len()
            )));
        }

        let d = x.ncols();
        let (mut w, mut b) = match req.seed {
            Some(Predictor::Linear { weights, intercept }) if weights.len() == d => {
                debug!("continuing training from seed predictor");
                (weights, intercept)
            }
            Some(other) => {
                ctx.advise(format!(
                    "Seed predictor of kind '{}' is incompatible with trainer 'sgd'; starting fresh.",
                    other.kind()
                ));
                (Array1::zeros(d), 0.0)
            }
            None => (Array1::zeros(d), 0.0),
        };

        let validation = req
            .validation
            .map(|v| Ok::<_, crate::error::TabTrainError>((v.feature_matrix()?, v.label_values()?)))
            .transpose()?;

        let mut best_val = f64::INFINITY;
        let mut stale = 0usize;
        let scale = self.learning_rate / n as f64;

        for epoch in 0..self.max_epochs {
            let residuals = &x.dot(&w) + b - &y;
            let grad_w = x.t().dot(&residuals);
            let grad_b = residuals.sum();
            w = &w - &(grad_w * scale);
            b -= grad_b * scale;

            if let Some((ref vx, ref vy)) = validation {
                let val_rmse = Self::rmse(vx, vy, &w, b);
                if val_rmse + 1e-12 < best_val {
                    best_val = val_rmse;
                    stale = 0;
                } else {
                    stale += 1;
                    if stale >= self.patience {
                        debug!(epoch, val_rmse, "early stop on validation loss");
                        break;
                    }
                }
            }
        }

        if let Some(test) = req.test {
            let tx = test.feature_matrix()?;
            let ty = test.label_values()?;
            debug!(rmse = Self::rmse(&tx, &ty, &w, b), "in-training test loss");
        }

        Ok(Predictor::Linear { weights: w, intercept: b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Schema;
    use crate::roles::{DeclaredColumns, RoleBinding, RoleMappedData};
    use polars::prelude::*;

    fn mapped(df: DataFrame) -> RoleMappedData {
        let binding = RoleBinding::resolve(&Schema::of(&df), &DeclaredColumns::default()).unwrap();
        RoleMappedData::new(df, binding)
    }

    #[test]
    fn test_sgd_fits_normalized_relation() {
        // Features already centered; y = 2*f1.
        let df = df!(
            "Label" => &[-4.0, -2.0, 0.0, 2.0, 4.0],
            "f1" => &[-2.0, -1.0, 0.0, 1.0, 2.0]
        )
        .unwrap();
        let data = mapped(df);
        let mut ctx = RunContext::new();
        let predictor = SgdTrainer::new()
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
        match &predictor {
            Predictor::Linear { weights, intercept } => {
                assert!((weights[0] - 2.0).abs() < 0.05);
                assert!(intercept.abs() < 0.05);
            }
            other => panic!("unexpected predictor {:?}", other),
        }
    }

    #[test]
    fn test_incompatible_seed_degrades_with_advisory() {
        let df = df!(
            "Label" => &[0.0, 1.0, 2.0],
            "f1" => &[-1.0, 0.0, 1.0]
        )
        .unwrap();
        let data = mapped(df);
        let mut ctx = RunContext::new();
        let seed = Predictor::Mean { value: 1.0 };
        let result = SgdTrainer::new().train(
            &mut ctx,
            TrainRequest {
                train: &data,
                validation: None,
                test: None,
                seed: Some(seed),
                cache_hint: None,
            },
        );
        assert!(result.is_ok());
        assert_eq!(ctx.advisories().len(), 1);
    }
}
