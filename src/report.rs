//! Result reporting: console tables, summary file, per-instance output

use crate::error::{Result, TabTrainError};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn any_value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::Float64(v) => format!("{:.6}", v),
        AnyValue::Float32(v) => format!("{:.6}", v),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Flatten a table into (column, value) pairs, row by row.
fn table_rows(table: &DataFrame) -> Result<Vec<Vec<(String, String)>>> {
    let mut rows = Vec::with_capacity(table.height());
    for i in 0..table.height() {
        let mut row = Vec::with_capacity(table.width());
        for col in table.get_columns() {
            let value = col
                .as_materialized_series()
                .get(i)
                .map_err(|e| TabTrainError::DataError(e.to_string()))?;
            row.push((col.name().to_string(), any_value_to_string(&value)));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn print_table(title: &str, table: &DataFrame) -> Result<()> {
    println!();
    println!("  {}", title);
    println!("  {}", "─".repeat(46));
    for row in table_rows(table)? {
        for (name, value) in row {
            println!("  {:<24} {:>18}", name, value);
        }
        println!("  {}", "─".repeat(46));
    }
    Ok(())
}

/// Print evaluator warnings, one line per warning.
pub fn print_warnings(table: &DataFrame) -> Result<()> {
    println!();
    println!("  Warnings");
    println!("  {}", "─".repeat(46));
    let texts = table
        .column("WarningText")
        .map_err(|e| TabTrainError::DataError(e.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;
    for value in texts
        .str()
        .map_err(|e| TabTrainError::DataError(e.to_string()))?
        .into_iter()
        .flatten()
    {
        println!("  {}", value);
    }
    Ok(())
}

/// Print the per-fold view.
pub fn print_fold_results(table: &DataFrame) -> Result<()> {
    print_table("Per-fold results", table)
}

/// Print the overall metrics, and append them to the summary file when one
/// is configured. The caller decides how to handle a summary write failure.
pub fn print_overall(table: &DataFrame, summary_path: Option<&Path>) -> Result<()> {
    print_table("Overall metrics", table)?;
    if let Some(path) = summary_path {
        let mut lines = String::new();
        for row in table_rows(table)? {
            for (name, value) in row {
                lines.push_str(&format!("{}\t{}\n", name, value));
            }
        }
        std::fs::write(path, lines).map_err(|e| {
            TabTrainError::IoError(e)
        })?;
        println!("  Summary written to {}", path.display());
    }
    Ok(())
}

/// Print evaluator-specific extra tables.
pub fn print_additional(table: &DataFrame) -> Result<()> {
    print_table("Additional metrics", table)
}

/// Write the per-instance view as CSV.
pub fn save_per_instance(table: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        TabTrainError::PersistenceError(format!(
            "could not create prediction output {}: {}",
            path.display(),
            e
        ))
    })?;
    let mut out = table.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut out)
        .map_err(|e| TabTrainError::DataError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_overall_summary_file_written() {
        let table = df!("RMSE" => &[0.25], "MAE" => &[0.125]).unwrap();
        let file = NamedTempFile::new().unwrap();
        print_overall(&table, Some(file.path())).unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("RMSE\t0.250000"));
        assert!(written.contains("MAE\t0.125000"));
    }

    #[test]
    fn test_summary_write_failure_surfaces() {
        let table = df!("RMSE" => &[0.25]).unwrap();
        let err = print_overall(&table, Some(Path::new("/nonexistent/dir/summary.txt")))
            .unwrap_err();
        assert!(matches!(err, TabTrainError::IoError(_)));
    }

    #[test]
    fn test_per_instance_round_trips_through_csv() {
        let table = df!(
            "Instance" => &[0i64, 1],
            "Label" => &[1.0, 0.0],
            "Score" => &[0.8, 0.3]
        )
        .unwrap();
        let file = NamedTempFile::new().unwrap();
        save_per_instance(&table, file.path()).unwrap();
        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.starts_with("Instance,Label,Score"));
        assert_eq!(written.lines().count(), 3);
    }

    #[test]
    fn test_warnings_print_requires_text_column() {
        let table = df!("Other" => &["x"]).unwrap();
        assert!(print_warnings(&table).is_err());
    }
}
