//! Standard (z-score) feature scaler used as the normalization step

use crate::error::{Result, TabTrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fitted per-column scaling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScaleParams {
    mean: f64,
    std: f64,
}

/// Standard scaler: (x - mean) / std, fitted once on training data and
/// replayed verbatim on validation and test data.
///
/// Columns are kept in a BTreeMap so two loads of the same persisted scaler
/// transform in identical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    params: BTreeMap<String, ScaleParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.params.is_empty()
    }

    /// Column names this scaler was fitted on.
    pub fn columns(&self) -> Vec<&str> {
        self.params.keys().map(|k| k.as_str()).collect()
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        for col_name in columns {
            let series = df
                .column(col_name)
                .map_err(|_| TabTrainError::DataError(format!("column '{}' not found", col_name)))?
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;
            let ca = series
                .f64()
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.params.insert(
                col_name.clone(),
                ScaleParams {
                    mean,
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted() {
            return Err(TabTrainError::TrainingError(
                "scaler used before fitting".to_string(),
            ));
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let series = df
                .column(col_name)
                .map_err(|_| TabTrainError::DataError(format!("column '{}' not found", col_name)))?
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;
            let scaled: Vec<f64> = series
                .f64()
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .into_iter()
                .map(|v| (v.unwrap_or(params.mean) - params.mean) / params.std)
                .collect();
            result = result
                .with_column(Series::new(col_name.as_str().into(), scaled))
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .clone();
        }
        Ok(result)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}
