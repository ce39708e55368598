//! Recorded transform pipelines with replay
//!
//! A `TransformPipeline` captures the transform sequence applied while
//! building the training dataset, together with the raw schema it requires.
//! Replaying the pipeline against a fresh raw dataset reproduces the exact
//! feature engineering, which is what guarantees train/validation/test
//! parity without re-specifying any transform configuration.

mod scaler;

pub use scaler::StandardScaler;

use crate::data::{is_numeric_dtype, Schema};
use crate::error::{Result, TabTrainError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// When to normalize feature columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizePolicy {
    /// Normalize only when the trainer asks for normalized features.
    Auto,
    /// Always normalize.
    Always,
    /// Never normalize.
    Never,
}

impl NormalizePolicy {
    pub fn selects(&self, trainer_wants_normalization: bool) -> bool {
        match self {
            NormalizePolicy::Auto => trainer_wants_normalization,
            NormalizePolicy::Always => true,
            NormalizePolicy::Never => false,
        }
    }
}

/// Coarse column class used for replay compatibility. Exact integer widths
/// may differ between files of the same dataset (CSV inference), so raw
/// schemas are compared by class, not by dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnClass {
    Numeric,
    Text,
    Other,
}

impl ColumnClass {
    fn of(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) {
            ColumnClass::Numeric
        } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
            ColumnClass::Text
        } else {
            ColumnClass::Other
        }
    }
}

/// A column the pipeline requires in raw input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub class: ColumnClass,
}

/// One recorded, fitted transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformStep {
    /// Cast every numeric column to Float64.
    CastNumericToF64,
    /// Apply a fitted standard scaler to its recorded columns.
    Normalize(StandardScaler),
}

impl TransformStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        match self {
            TransformStep::CastNumericToF64 => cast_numeric_to_f64(df),
            TransformStep::Normalize(scaler) => scaler.transform(df),
        }
    }
}

/// The recorded pipeline: required raw schema plus fitted steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformPipeline {
    required: Vec<ColumnSpec>,
    steps: Vec<TransformStep>,
}

impl TransformPipeline {
    /// Start a pipeline from a raw training dataset. Records the raw schema
    /// and applies the numeric cast. Returns the transformed frame alongside
    /// the pipeline so callers keep working on the transformed data.
    pub fn fit(raw: &DataFrame) -> Result<(DataFrame, Self)> {
        let required = raw
            .get_columns()
            .iter()
            .map(|c| ColumnSpec {
                name: c.name().to_string(),
                class: ColumnClass::of(c.dtype()),
            })
            .collect();
        let steps = vec![TransformStep::CastNumericToF64];
        let casted = cast_numeric_to_f64(raw)?;
        Ok((casted, Self { required, steps }))
    }

    /// Fit a normalizer on the given columns of the current (already
    /// transformed) frame, record it as a step, and return the normalized
    /// frame.
    pub fn add_normalizer(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        let mut scaler = StandardScaler::new();
        scaler.fit(df, columns)?;
        let out = scaler.transform(df)?;
        self.steps.push(TransformStep::Normalize(scaler));
        Ok(out)
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    /// Re-apply every recorded step to a new raw dataset. The identity of
    /// the original base frame is irrelevant; only schema compatibility
    /// matters.
    pub fn replay(&self, raw: &DataFrame) -> Result<DataFrame> {
        self.check_compatibility(raw)?;
        let mut df = raw.clone();
        for step in &self.steps {
            df = step.apply(&df)?;
        }
        Ok(df)
    }

    fn check_compatibility(&self, raw: &DataFrame) -> Result<()> {
        let schema = Schema::of(raw);
        for spec in &self.required {
            let dtype = schema.dtype(&spec.name).ok_or_else(|| {
                TabTrainError::SchemaMismatch(format!(
                    "required column '{}' is missing from the raw data",
                    spec.name
                ))
            })?;
            let class = ColumnClass::of(dtype);
            if class != spec.class {
                return Err(TabTrainError::SchemaMismatch(format!(
                    "column '{}' is {:?}, pipeline requires {:?}",
                    spec.name, class, spec.class
                )));
            }
        }
        Ok(())
    }
}

/// Cast all integer and Float32 columns to Float64.
pub fn cast_numeric_to_f64(df: &DataFrame) -> Result<DataFrame> {
    let mut result = df.clone();
    for col in df.get_columns() {
        if is_numeric_dtype(col.dtype()) && col.dtype() != &DataType::Float64 {
            let casted = col
                .cast(&DataType::Float64)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;
            result = result
                .with_column(casted)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?
                .clone();
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train_frame() -> DataFrame {
        df!(
            "Label" => &[0i64, 1, 0, 1],
            "f1" => &[1.0, 2.0, 3.0, 4.0],
            "tag" => &["a", "b", "a", "b"]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_casts_integers() {
        let (casted, _) = TransformPipeline::fit(&train_frame()).unwrap();
        assert_eq!(casted.column("Label").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_replay_matches_training_columns() {
        let (casted, mut pipeline) = TransformPipeline::fit(&train_frame()).unwrap();
        let normalized = pipeline
            .add_normalizer(&casted, &["f1".to_string()])
            .unwrap();

        let raw = df!(
            "Label" => &[1i64, 0],
            "f1" => &[5.0, 6.0],
            "tag" => &["b", "a"]
        )
        .unwrap();
        let replayed = pipeline.replay(&raw).unwrap();

        assert_eq!(
            Schema::of(&replayed).names(),
            Schema::of(&normalized).names()
        );
        assert_eq!(replayed.column("f1").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_replay_uses_training_statistics() {
        let (casted, mut pipeline) = TransformPipeline::fit(&train_frame()).unwrap();
        pipeline
            .add_normalizer(&casted, &["f1".to_string()])
            .unwrap();

        // Train mean is 2.5, std ~1.29; a raw value equal to the train mean
        // must map to zero even though this frame's own mean differs.
        let raw = df!(
            "Label" => &[0i64],
            "f1" => &[2.5],
            "tag" => &["a"]
        )
        .unwrap();
        let replayed = pipeline.replay(&raw).unwrap();
        let v = replayed
            .column("f1")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        assert!(v.abs() < 1e-9);
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let (_, pipeline) = TransformPipeline::fit(&train_frame()).unwrap();
        let raw = df!("f1" => &[1.0]).unwrap();
        let err = pipeline.replay(&raw).unwrap_err();
        assert!(matches!(err, TabTrainError::SchemaMismatch(_)));
    }

    #[test]
    fn test_wrong_class_is_schema_mismatch() {
        let (_, pipeline) = TransformPipeline::fit(&train_frame()).unwrap();
        let raw = df!(
            "Label" => &[0i64],
            "f1" => &["not a number"],
            "tag" => &["a"]
        )
        .unwrap();
        let err = pipeline.replay(&raw).unwrap_err();
        assert!(matches!(err, TabTrainError::SchemaMismatch(_)));
    }

    #[test]
    fn test_extra_columns_are_tolerated() {
        let (_, pipeline) = TransformPipeline::fit(&train_frame()).unwrap();
        let raw = df!(
            "Label" => &[0i64],
            "f1" => &[1.0],
            "tag" => &["a"],
            "extra" => &[9.0]
        )
        .unwrap();
        assert!(pipeline.replay(&raw).is_ok());
    }
}
