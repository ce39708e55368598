//! Probability calibration
//!
//! A calibrator maps raw classifier scores to calibrated probabilities. It is
//! fitted on a bounded sample of training predictions after the trainer
//! finishes, and travels inside the persisted predictor.

use crate::error::{Result, TabTrainError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Trait for probability calibrators.
pub trait Calibrator {
    /// Fit on raw scores and true 0/1 labels.
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()>;

    /// Map raw scores to calibrated probabilities.
    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>>;
}

/// Platt scaling: fits P(y=1|s) = sigmoid(a*s + b) by Newton iterations,
/// with Platt's target adjustment for small samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlattCalibrator {
    a: Option<f64>,
    b: Option<f64>,
    max_iter: usize,
    tol: f64,
}

impl PlattCalibrator {
    pub fn new() -> Self {
        Self {
            a: None,
            b: None,
            max_iter: 200,
            tol: 1e-7,
        }
    }

    pub fn parameters(&self) -> Option<(f64, f64)> {
        match (self.a, self.b) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }
}

impl Default for PlattCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calibrator for PlattCalibrator {
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()> {
        let n = scores.len();
        if n == 0 {
            return Err(TabTrainError::TrainingError(
                "calibrator fitted on empty input".to_string(),
            ));
        }
        if n != labels.len() {
            return Err(TabTrainError::TrainingError(format!(
                "calibrator input length mismatch: {} scores, {} labels",
                n,
                labels.len()
            )));
        }

        // Platt's adjusted targets keep the fit stable on small samples.
        let n_pos = labels.iter().filter(|&&y| y > 0.5).count() as f64;
        let n_neg = n as f64 - n_pos;
        let target_pos = (n_pos + 1.0) / (n_pos + 2.0);
        let target_neg = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|&y| if y > 0.5 { target_pos } else { target_neg })
            .collect();

        let mut a = 1.0;
        let mut b = 0.0;

        for _ in 0..self.max_iter {
            let mut grad_a = 0.0;
            let mut grad_b = 0.0;
            let mut h_aa = 1e-6;
            let mut h_ab = 0.0;
            let mut h_bb = 1e-6;

            for (i, &s) in scores.iter().enumerate() {
                let p = Self::sigmoid(a * s + b);
                let d1 = p - targets[i];
                let d2 = p * (1.0 - p);
                grad_a += s * d1;
                grad_b += d1;
                h_aa += s * s * d2;
                h_ab += s * d2;
                h_bb += d2;
            }

            let det = h_aa * h_bb - h_ab * h_ab;
            if det.abs() < 1e-12 {
                break;
            }
            let delta_a = (h_bb * grad_a - h_ab * grad_b) / det;
            let delta_b = (h_aa * grad_b - h_ab * grad_a) / det;
            a -= delta_a;
            b -= delta_b;

            if delta_a.abs() < self.tol && delta_b.abs() < self.tol {
                break;
            }
        }

        self.a = Some(a);
        self.b = Some(b);
        Ok(())
    }

    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b) = self.parameters().ok_or_else(|| {
            TabTrainError::TrainingError("calibrator used before fitting".to_string())
        })?;
        Ok(scores.mapv(|s| Self::sigmoid(a * s + b)))
    }
}

/// Construct a calibrator by name. `platt` is the default probability
/// calibrator; `none` disables calibration.
pub fn create_calibrator(name: &str) -> Result<Option<PlattCalibrator>> {
    match name {
        "platt" => Ok(Some(PlattCalibrator::new())),
        "none" => Ok(None),
        other => Err(TabTrainError::ConfigError(format!(
            "Unknown calibrator '{}' (from option 'calibrator')",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_platt_outputs_probabilities() {
        let scores = array![-2.0, -1.0, -0.5, 0.5, 1.0, 2.0, -1.5, 1.5];
        let labels = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0];
        let mut cal = PlattCalibrator::new();
        cal.fit(&scores, &labels).unwrap();
        let out = cal.calibrate(&scores).unwrap();
        assert_eq!(out.len(), scores.len());
        assert!(out.iter().all(|&p| (0.0..=1.0).contains(&p)));
        // Higher raw score must not yield lower probability.
        assert!(out[5] >= out[0]);
    }

    #[test]
    fn test_calibrate_before_fit_fails() {
        let cal = PlattCalibrator::new();
        assert!(cal.calibrate(&array![0.0]).is_err());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut cal = PlattCalibrator::new();
        let err = cal.fit(&array![0.0, 1.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, TabTrainError::TrainingError(_)));
    }

    #[test]
    fn test_registry_names() {
        assert!(create_calibrator("platt").unwrap().is_some());
        assert!(create_calibrator("none").unwrap().is_none());
        assert!(create_calibrator("bogus").is_err());
    }
}
