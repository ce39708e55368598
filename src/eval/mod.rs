//! Evaluation: metrics bundle, evaluator contract, built-in evaluators

mod classification;
mod regression;

pub use classification::ClassificationEvaluator;
pub use regression::RegressionEvaluator;

use crate::error::{Result, TabTrainError};
use crate::roles::RoleMappedData;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

/// Tags for the tables an evaluator produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MetricKind {
    /// Aggregate metrics over the whole test set. Mandatory.
    Overall,
    /// Metrics per training fold (a single fold for this command).
    PerFold,
    /// Data-quality or metric-validity warnings.
    Warnings,
    /// Evaluator-specific extra tables (e.g. confusion counts).
    Additional,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Overall => "Overall",
            MetricKind::PerFold => "PerFold",
            MetricKind::Warnings => "Warnings",
            MetricKind::Additional => "Additional",
        };
        f.write_str(name)
    }
}

/// Named collection of result tables. Immutable after creation; consumers
/// only read or derive views.
#[derive(Debug, Clone)]
pub struct MetricsBundle {
    tables: BTreeMap<MetricKind, DataFrame>,
}

impl MetricsBundle {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
        }
    }

    pub fn with(mut self, kind: MetricKind, table: DataFrame) -> Self {
        self.tables.insert(kind, table);
        self
    }

    pub fn get(&self, kind: MetricKind) -> Option<&DataFrame> {
        self.tables.get(&kind)
    }

    /// The mandatory overall view. Its absence is a fatal evaluator defect.
    pub fn overall(&self) -> Result<&DataFrame> {
        self.tables.get(&MetricKind::Overall).ok_or_else(|| {
            TabTrainError::MissingMetrics(
                "evaluator produced no overall metrics table".to_string(),
            )
        })
    }

    pub fn kinds(&self) -> Vec<MetricKind> {
        self.tables.keys().copied().collect()
    }
}

impl Default for MetricsBundle {
    fn default() -> Self {
        Self::new()
    }
}

/// The evaluator contract.
pub trait Evaluator {
    fn name(&self) -> &'static str;

    /// Compute the metrics bundle from role-mapped scored data.
    fn evaluate(&self, data: &RoleMappedData) -> Result<MetricsBundle>;

    /// Per-instance metric rows, aligned 1:1 with the scored data.
    fn per_instance_metrics(&self, data: &RoleMappedData) -> Result<DataFrame>;
}

/// Derive the single-fold view from an overall table.
pub(crate) fn per_fold_from_overall(overall: &DataFrame) -> Result<DataFrame> {
    let mut table = overall.clone();
    table = table
        .with_column(Series::new("Fold".into(), vec![0i64; overall.height()]))
        .map_err(|e| TabTrainError::DataError(e.to_string()))?
        .clone();
    Ok(table)
}

/// Build a warnings table; `None` when there is nothing to warn about.
pub(crate) fn warnings_table(warnings: Vec<String>) -> Result<Option<DataFrame>> {
    if warnings.is_empty() {
        return Ok(None);
    }
    let df = DataFrame::new(vec![Column::new("WarningText".into(), warnings)])
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;
    Ok(Some(df))
}

/// Instance identifiers for the per-instance view: the bound name column
/// when present, the row index otherwise.
pub(crate) fn instance_column(data: &RoleMappedData) -> Result<Column> {
    match data.binding().row_name.column() {
        Some(name) => {
            let col = data
                .data()
                .column(name)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .as_materialized_series()
                .cast(&DataType::String)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;
            Ok(col.with_name("Instance".into()).into_column())
        }
        None => {
            let ids: Vec<i64> = (0..data.height() as i64).collect();
            Ok(Column::new("Instance".into(), ids))
        }
    }
}

/// Select an evaluator by name, or auto-select from the scored data: a label
/// made entirely of 0/1 values selects classification, anything else
/// regression.
pub fn create_evaluator(
    name: Option<&str>,
    scored: &RoleMappedData,
) -> Result<Box<dyn Evaluator>> {
    match name {
        Some("regression") => Ok(Box::new(RegressionEvaluator)),
        Some("classification") => Ok(Box::new(ClassificationEvaluator)),
        Some(other) => Err(TabTrainError::ConfigError(format!(
            "Unknown evaluator '{}' (from option 'evaluator')",
            other
        ))),
        None => {
            let labels = scored.label_values()?;
            let binary = labels.iter().all(|&v| v == 0.0 || v == 1.0);
            if binary {
                Ok(Box::new(ClassificationEvaluator))
            } else {
                Ok(Box::new(RegressionEvaluator))
            }
        }
    }
}
