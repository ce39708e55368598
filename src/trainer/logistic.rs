//! Binary logistic regression trainer

use super::{Predictor, TrainRequest, Trainer, TrainerCapabilities};
use crate::context::RunContext;
use crate::error::{Result, TabTrainError};
use ndarray::{Array1, Array2};
use tracing::debug;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn log_loss(x: &Array2<f64>, y: &Array1<f64>, w: &Array1<f64>, b: f64) -> f64 {
    let n = y.len() as f64;
    let probs = (x.dot(w) + b).mapv(sigmoid);
    probs
        .iter()
        .zip(y.iter())
        .map(|(&p, &t)| {
            let p = p.clamp(1e-12, 1.0 - 1e-12);
            -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
        })
        .sum::<f64>()
        / n
}

/// Binary classifier fitted by gradient descent. Supports validation-based
/// early stopping; emits probabilities.
pub struct LogisticTrainer {
    learning_rate: f64,
    l2: f64,
    max_epochs: usize,
    patience: usize,
}

impl LogisticTrainer {
    pub fn new() -> Self {
        Self {
            learning_rate: 0.5,
            l2: 1e-4,
            max_epochs: 500,
            patience: 10,
        }
    }
}

impl Default for LogisticTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for LogisticTrainer {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn capabilities(&self) -> TrainerCapabilities {
        TrainerCapabilities {
            supports_validation: true,
            supports_test: false,
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
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(TabTrainError::TrainingError(
                "logistic trainer requires 0/1 labels".to_string(),
            ));
        }

        let d = x.ncols();
        let (mut w, mut b) = match req.seed {
            Some(Predictor::Logistic { weights, intercept }) if weights.len() == d => {
                debug!("continuing training from seed predictor");
                (weights, intercept)
            }
            Some(other) => {
                ctx.advise(format!(
                    "Seed predictor of kind '{}' is incompatible with trainer 'logistic'; starting fresh.",
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
            let probs = (x.dot(&w) + b).mapv(sigmoid);
            let residuals = &probs - &y;
            let grad_w = x.t().dot(&residuals) + &(w.mapv(|v| v * self.l2));
            let grad_b = residuals.sum();
            w = &w - &(grad_w * scale);
            b -= grad_b * scale;

            if let Some((ref vx, ref vy)) = validation {
                let val_loss = log_loss(vx, vy, &w, b);
                if val_loss + 1e-12 < best_val {
                    best_val = val_loss;
                    stale = 0;
                } else {
                    stale += 1;
                    if stale >= self.patience {
                        debug!(epoch, val_loss, "early stop on validation loss");
                        break;
                    }
                }
            }
        }

        Ok(Predictor::Logistic { weights: w, intercept: b })
    }
}
