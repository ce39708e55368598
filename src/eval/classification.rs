//! Binary classification evaluator: accuracy, precision, recall, F1, log-loss

use super::{
    instance_column, per_fold_from_overall, warnings_table, Evaluator, MetricKind, MetricsBundle,
};
use crate::error::{Result, TabTrainError};
use crate::roles::RoleMappedData;
use crate::score::{PROBABILITY_COLUMN, SCORE_COLUMN};
use polars::prelude::*;

const THRESHOLD: f64 = 0.5;

pub struct ClassificationEvaluator;

struct Predictions {
    labels: Vec<f64>,
    decisions: Vec<f64>,
    probabilities: Option<Vec<f64>>,
}

impl ClassificationEvaluator {
    /// Decision values come from the probability column when present, the raw
    /// score column otherwise.
    fn predictions(data: &RoleMappedData) -> Result<Predictions> {
        let labels = data.label_values()?.to_vec();
        let (decisions, probabilities) = if data.data().column(PROBABILITY_COLUMN).is_ok() {
            let probs = data.column_values(PROBABILITY_COLUMN)?.to_vec();
            (probs.clone(), Some(probs))
        } else {
            (data.column_values(SCORE_COLUMN)?.to_vec(), None)
        };
        if labels.len() != decisions.len() {
            return Err(TabTrainError::DataError(format!(
                "label/prediction length mismatch: {} vs {}",
                labels.len(),
                decisions.len()
            )));
        }
        if labels.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(TabTrainError::DataError(
                "classification evaluation requires 0/1 labels".to_string(),
            ));
        }
        Ok(Predictions {
            labels,
            decisions,
            probabilities,
        })
    }
}

fn confusion_counts(preds: &Predictions) -> (u64, u64, u64, u64) {
    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut tn = 0u64;
    let mut fn_ = 0u64;
    for (&label, &dec) in preds.labels.iter().zip(preds.decisions.iter()) {
        let positive = dec >= THRESHOLD;
        match (label == 1.0, positive) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }
    (tp, fp, tn, fn_)
}

impl Evaluator for ClassificationEvaluator {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn evaluate(&self, data: &RoleMappedData) -> Result<MetricsBundle> {
        let preds = Self::predictions(data)?;
        let (tp, fp, tn, fn_) = confusion_counts(&preds);
        let mut warnings = Vec::new();

        let total = (tp + fp + tn + fn_) as f64;
        let accuracy = (tp + tn) as f64 / total;
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            warnings.push("No positive predictions; precision is reported as 0.".to_string());
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            warnings.push("No positive labels; recall is reported as 0.".to_string());
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let mut overall = df!(
            "Accuracy" => &[accuracy],
            "Precision" => &[precision],
            "Recall" => &[recall],
            "F1" => &[f1]
        )
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;

        if let Some(probs) = &preds.probabilities {
            let log_loss = probs
                .iter()
                .zip(preds.labels.iter())
                .map(|(&p, &t)| {
                    let p = p.clamp(1e-12, 1.0 - 1e-12);
                    -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
                })
                .sum::<f64>()
                / total;
            overall = overall
                .with_column(Series::new("LogLoss".into(), vec![log_loss]))
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .clone();
        }

        let per_fold = per_fold_from_overall(&overall)?;
        let additional = df!(
            "TruePositives" => &[tp],
            "FalsePositives" => &[fp],
            "TrueNegatives" => &[tn],
            "FalseNegatives" => &[fn_]
        )
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;

        let mut bundle = MetricsBundle::new()
            .with(MetricKind::Overall, overall)
            .with(MetricKind::PerFold, per_fold)
            .with(MetricKind::Additional, additional);
        if let Some(table) = warnings_table(warnings)? {
            bundle = bundle.with(MetricKind::Warnings, table);
        }
        Ok(bundle)
    }

    fn per_instance_metrics(&self, data: &RoleMappedData) -> Result<DataFrame> {
        let preds = Self::predictions(data)?;
        let correct: Vec<bool> = preds
            .labels
            .iter()
            .zip(preds.decisions.iter())
            .map(|(&t, &d)| (d >= THRESHOLD) == (t == 1.0))
            .collect();

        let mut columns = vec![instance_column(data)?];
        columns.push(Column::new("Label".into(), preds.labels));
        if let Some(probs) = preds.probabilities {
            columns.push(Column::new(PROBABILITY_COLUMN.into(), probs));
        } else {
            columns.push(Column::new(SCORE_COLUMN.into(), preds.decisions));
        }
        columns.push(Column::new("Correct".into(), correct));
        DataFrame::new(columns).map_err(|e| TabTrainError::DataError(e.to_string()))
    }
}
