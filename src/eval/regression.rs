//! Regression evaluator: MSE, RMSE, MAE, R²

use super::{
    instance_column, per_fold_from_overall, warnings_table, Evaluator, MetricKind, MetricsBundle,
};
use crate::error::{Result, TabTrainError};
use crate::roles::RoleMappedData;
use crate::score::SCORE_COLUMN;
use polars::prelude::*;

pub struct RegressionEvaluator;

impl RegressionEvaluator {
    fn losses(data: &RoleMappedData) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>)> {
        let labels = data.label_values()?;
        let scores = data.column_values(SCORE_COLUMN)?;
        if labels.len() != scores.len() {
            return Err(TabTrainError::DataError(format!(
                "label/score length mismatch: {} vs {}",
                labels.len(),
                scores.len()
            )));
        }
        let l1: Vec<f64> = labels
            .iter()
            .zip(scores.iter())
            .map(|(t, p)| (t - p).abs())
            .collect();
        let l2: Vec<f64> = l1.iter().map(|e| e * e).collect();
        Ok((labels.to_vec(), scores.to_vec(), l1, l2))
    }
}

impl Evaluator for RegressionEvaluator {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn evaluate(&self, data: &RoleMappedData) -> Result<MetricsBundle> {
        let (labels, _scores, l1, l2) = Self::losses(data)?;
        let weights = data.weight_values()?;
        let mut warnings = Vec::new();

        let (mse, mae) = match &weights {
            Some(w) => {
                let total: f64 = w.sum();
                if total <= 0.0 {
                    return Err(TabTrainError::DataError(
                        "weight column sums to zero".to_string(),
                    ));
                }
                let mse = l2.iter().zip(w.iter()).map(|(e, wi)| e * wi).sum::<f64>() / total;
                let mae = l1.iter().zip(w.iter()).map(|(e, wi)| e * wi).sum::<f64>() / total;
                (mse, mae)
            }
            None => {
                let n = labels.len() as f64;
                (
                    l2.iter().sum::<f64>() / n,
                    l1.iter().sum::<f64>() / n,
                )
            }
        };

        let n = labels.len() as f64;
        let mean = labels.iter().sum::<f64>() / n;
        let ss_tot: f64 = labels.iter().map(|y| (y - mean) * (y - mean)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - l2.iter().sum::<f64>() / ss_tot
        } else {
            warnings.push(
                "Label has zero variance; R² is reported as 0 and is not meaningful.".to_string(),
            );
            0.0
        };

        let overall = df!(
            "MSE" => &[mse],
            "RMSE" => &[mse.sqrt()],
            "MAE" => &[mae],
            "R2" => &[r2]
        )
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;

        let per_fold = per_fold_from_overall(&overall)?;
        let mut bundle = MetricsBundle::new()
            .with(MetricKind::Overall, overall)
            .with(MetricKind::PerFold, per_fold);
        if let Some(table) = warnings_table(warnings)? {
            bundle = bundle.with(MetricKind::Warnings, table);
        }
        Ok(bundle)
    }

    fn per_instance_metrics(&self, data: &RoleMappedData) -> Result<DataFrame> {
        let (labels, scores, l1, l2) = Self::losses(data)?;
        let mut columns = vec![instance_column(data)?];
        columns.push(Column::new("Label".into(), labels));
        columns.push(Column::new(SCORE_COLUMN.into(), scores));
        columns.push(Column::new("L1Loss".into(), l1));
        columns.push(Column::new("L2Loss".into(), l2));
        DataFrame::new(columns).map_err(|e| TabTrainError::DataError(e.to_string()))
    }
}
