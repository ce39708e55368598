//! Dataset loading and schema inspection
//!
//! A dataset is a polars `DataFrame`; a `Schema` is its ordered list of
//! (name, dtype) pairs. Files are loaded by extension (CSV, JSON, Parquet).

use crate::error::{Result, TabTrainError};
use polars::prelude::*;
use std::path::Path;

/// Load a dataset from a file, dispatching on the extension.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let df = match ext {
        "csv" => CsvReadOptions::default()
            .with_infer_schema_length(Some(1000))
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "json" => JsonReader::new(std::fs::File::open(path)?).finish()?,
        "parquet" => ParquetReader::new(std::fs::File::open(path)?).finish()?,
        _ => {
            return Err(TabTrainError::ConfigError(format!(
                "Unsupported file format '{}' for {}",
                ext,
                path.display()
            )))
        }
    };

    if df.height() == 0 {
        return Err(TabTrainError::DataError(format!(
            "Dataset {} contains no rows",
            path.display()
        )));
    }

    Ok(df)
}

/// Whether a dtype is usable as a numeric feature or label.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Ordered (name, dtype) view of a DataFrame.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, DataType)>,
}

impl Schema {
    pub fn of(df: &DataFrame) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().clone()))
            .collect();
        Self { columns }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn dtype(&self, name: &str) -> Option<&DataType> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, dt)| dt)
    }

    /// Column names in schema order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Names of all numeric columns, in schema order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|(_, dt)| is_numeric_dtype(dt))
            .map(|(n, _)| n.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
