//! Ordinary least squares trainer

use super::{Predictor, TrainRequest, Trainer, TrainerCapabilities};
use crate::context::RunContext;
use crate::error::{Result, TabTrainError};
use ndarray::{Array1, Array2};
use tracing::debug;

/// Solves the normal equations (XᵀX + λI) w = Xᵀy by Cholesky decomposition.
/// Retries once with a larger ridge term when the system is not positive
/// definite.
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>, ridge: f64) -> Option<Array1<f64>> {
    let mut xtx = x.t().dot(x);
    let xty = x.t().dot(y);
    let n = xtx.nrows();
    for i in 0..n {
        xtx[[i, i]] += ridge;
    }

    let l = cholesky(&xtx)?;

    // Forward solve L z = Xᵀy, then backward solve Lᵀ w = z.
    let mut z = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (xty[i] - sum) / l[[i, i]];
    }
    let mut w = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * w[j];
        }
        w[i] = (z[i] - sum) / l[[i, i]];
    }
    Some(w)
}

fn cholesky(a: &Array2<f64>) -> Option<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Some(l)
}

/// Least squares linear regression. No optional-input capabilities.
pub struct LinearTrainer {
    ridge: f64,
}

impl LinearTrainer {
    pub fn new() -> Self {
        Self { ridge: 1e-10 }
    }
}

impl Default for LinearTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Trainer for LinearTrainer {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn capabilities(&self) -> TrainerCapabilities {
        TrainerCapabilities::default()
    }

    fn train(&self, _ctx: &mut RunContext, req: TrainRequest<'_>) -> Result<Predictor> {
        let x = req.train.feature_matrix()?;
        let y = req.train.label_values()?;
        if x.nrows() != y.len() || x.nrows() == 0 {
            return Err(TabTrainError::TrainingError(format!(
                "invalid training inputs: {} feature rows, {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if req.seed.is_some() {
            debug!("linear trainer solves in closed form; seed predictor ignored");
        }

        // Augment with an intercept column.
        let n = x.nrows();
        let d = x.ncols();
        let mut aug = Array2::ones((n, d + 1));
        aug.slice_mut(ndarray::s![.., ..d]).assign(&x);

        let solution = solve_normal_equations(&aug, &y, self.ridge)
            .or_else(|| solve_normal_equations(&aug, &y, 1e-6))
            .ok_or_else(|| {
                TabTrainError::TrainingError(
                    "normal equations are singular; features may be collinear".to_string(),
                )
            })?;

        let weights = solution.slice(ndarray::s![..d]).to_owned();
        let intercept = solution[d];
        Ok(Predictor::Linear { weights, intercept })
    }
}
