//! Trained predictor variants
//!
//! The orchestrator treats a predictor as an opaque, persistable, scoreable
//! artifact. Concrete variants live in one serde-friendly enum so the model
//! store can round-trip them without dynamic dispatch in the byte format.

use crate::calibrate::{Calibrator, PlattCalibrator};
use crate::error::{Result, TabTrainError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A trained predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predictor {
    /// Constant prediction (baseline).
    Mean { value: f64 },
    /// Linear model: score = x·w + b.
    Linear { weights: Array1<f64>, intercept: f64 },
    /// Binary logistic model: probability = sigmoid(x·w + b).
    Logistic { weights: Array1<f64>, intercept: f64 },
    /// A predictor wrapped with a fitted probability calibrator.
    Calibrated {
        inner: Box<Predictor>,
        calibrator: PlattCalibrator,
    },
}

impl Predictor {
    pub fn kind(&self) -> &'static str {
        match self {
            Predictor::Mean { .. } => "mean",
            Predictor::Linear { .. } => "linear",
            Predictor::Logistic { .. } => "logistic",
            Predictor::Calibrated { .. } => "calibrated",
        }
    }

    /// Whether this predictor targets a binary classification task.
    pub fn is_classifier(&self) -> bool {
        match self {
            Predictor::Logistic { .. } => true,
            Predictor::Calibrated { inner, .. } => inner.is_classifier(),
            _ => false,
        }
    }

    /// Whether `probability` yields calibrated or model probabilities.
    pub fn emits_probability(&self) -> bool {
        matches!(
            self,
            Predictor::Logistic { .. } | Predictor::Calibrated { .. }
        )
    }

    fn check_width(&self, x: &Array2<f64>, weights: &Array1<f64>) -> Result<()> {
        if x.ncols() != weights.len() {
            return Err(TabTrainError::DataError(format!(
                "feature width mismatch: data has {} columns, predictor expects {}",
                x.ncols(),
                weights.len()
            )));
        }
        Ok(())
    }

    /// Raw scores for a feature matrix. For classifiers this is the margin
    /// (pre-sigmoid) so calibrators see the uncompressed signal.
    pub fn score(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Predictor::Mean { value } => Ok(Array1::from_elem(x.nrows(), *value)),
            Predictor::Linear { weights, intercept } => {
                self.check_width(x, weights)?;
                Ok(x.dot(weights) + *intercept)
            }
            Predictor::Logistic { weights, intercept } => {
                self.check_width(x, weights)?;
                Ok(x.dot(weights) + *intercept)
            }
            Predictor::Calibrated { inner, .. } => inner.score(x),
        }
    }

    /// Probabilities for classifiers; `None` for regressors.
    pub fn probability(&self, x: &Array2<f64>) -> Option<Result<Array1<f64>>> {
        match self {
            Predictor::Logistic { .. } => {
                Some(self.score(x).map(|s| s.mapv(sigmoid)))
            }
            Predictor::Calibrated { inner, calibrator } => Some(
                inner
                    .score(x)
                    .and_then(|scores| calibrator.calibrate(&scores)),
            ),
            _ => None,
        }
    }
}
