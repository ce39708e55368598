//! Command-line definition and mapping to an experiment configuration

use crate::experiment::ExperimentConfig;
use crate::transform::NormalizePolicy;
use clap::Parser;
use std::path::PathBuf;

fn parse_norm(s: &str) -> Result<NormalizePolicy, String> {
    match s {
        "auto" => Ok(NormalizePolicy::Auto),
        "always" | "yes" => Ok(NormalizePolicy::Always),
        "never" | "no" => Ok(NormalizePolicy::Never),
        other => Err(format!(
            "invalid normalization policy '{}' (expected auto, always, or never)",
            other
        )),
    }
}

fn parse_role_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((role, column)) if !role.is_empty() && !column.is_empty() => {
            Ok((role.to_string(), column.to_string()))
        }
        _ => Err(format!("invalid role assignment '{}' (expected Role=Column)", s)),
    }
}

#[derive(Parser)]
#[command(name = "tabtrain")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a model, evaluate it on a held-out test set, report metrics")]
#[command(long_about = None)]
pub struct Cli {
    /// Training data file (CSV, JSON, or Parquet)
    #[arg(long)]
    pub train: PathBuf,

    /// Test data file
    #[arg(long)]
    pub test: PathBuf,

    /// Validation data file (used only by trainers that support it)
    #[arg(long)]
    pub valid: Option<PathBuf>,

    /// Trainer name (mean, linear, sgd, logistic)
    #[arg(long, default_value = "mean")]
    pub trainer: String,

    /// Label column name
    #[arg(long)]
    pub label: Option<String>,

    /// Feature column names, comma separated
    #[arg(long, value_delimiter = ',')]
    pub features: Vec<String>,

    /// Group column name
    #[arg(long)]
    pub group: Option<String>,

    /// Weight column name
    #[arg(long)]
    pub weight: Option<String>,

    /// Row-name column name
    #[arg(long)]
    pub name_column: Option<String>,

    /// Custom role assignment, Role=Column (repeatable)
    #[arg(long = "col", value_parser = parse_role_assignment)]
    pub custom: Vec<(String, String)>,

    /// Feature normalization policy (auto, always, never)
    #[arg(long, default_value = "auto", value_parser = parse_norm)]
    pub norm: NormalizePolicy,

    /// Caching hint passed to the trainer
    #[arg(long)]
    pub cache: Option<bool>,

    /// Output calibrator (platt, none)
    #[arg(long, default_value = "platt")]
    pub calibrator: String,

    /// Maximum examples used to fit the calibrator
    #[arg(long, default_value_t = 1_000_000_000)]
    pub max_calibration_examples: usize,

    /// Append overall metrics to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Write per-instance predictions to this file
    #[arg(long)]
    pub output_predictions: Option<PathBuf>,

    /// Persist the trained model here (a temp location is used otherwise)
    #[arg(long)]
    pub output_model: Option<PathBuf>,

    /// Continue training from this model
    #[arg(long)]
    pub input_model: Option<PathBuf>,

    /// Scorer name (defaults to auto-selection)
    #[arg(long)]
    pub scorer: Option<String>,

    /// Evaluator name (regression, classification; defaults to auto-selection)
    #[arg(long)]
    pub evaluator: Option<String>,
}

impl Cli {
    pub fn into_config(self) -> ExperimentConfig {
        ExperimentConfig {
            train_file: self.train,
            test_file: self.test,
            valid_file: self.valid,
            trainer: self.trainer,
            label: self.label,
            features: self.features,
            group: self.group,
            weight: self.weight,
            name: self.name_column,
            custom: self.custom,
            norm: self.norm,
            cache_hint: self.cache,
            calibrator: self.calibrator,
            max_calibration_examples: self.max_calibration_examples,
            summary: self.summary,
            output_predictions: self.output_predictions,
            output_model: self.output_model,
            input_model: self.input_model,
            scorer: self.scorer,
            evaluator: self.evaluator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let cli = Cli::parse_from(["tabtrain", "--train", "a.csv", "--test", "b.csv"]);
        let config = cli.into_config();
        assert_eq!(config.trainer, "mean");
        assert_eq!(config.calibrator, "platt");
        assert_eq!(config.max_calibration_examples, 1_000_000_000);
        assert!(config.valid_file.is_none());
    }

    #[test]
    fn test_feature_list_is_comma_delimited() {
        let cli = Cli::parse_from([
            "tabtrain",
            "--train", "a.csv",
            "--test", "b.csv",
            "--features", "f1,f2,f3",
        ]);
        assert_eq!(cli.features, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_custom_role_assignments() {
        let cli = Cli::parse_from([
            "tabtrain",
            "--train", "a.csv",
            "--test", "b.csv",
            "--col", "Strata=region",
            "--col", "Id=row_id",
        ]);
        assert_eq!(cli.custom.len(), 2);
        assert_eq!(cli.custom[0], ("Strata".to_string(), "region".to_string()));
    }

    #[test]
    fn test_bad_role_assignment_rejected() {
        let result = Cli::try_parse_from([
            "tabtrain",
            "--train", "a.csv",
            "--test", "b.csv",
            "--col", "NoEquals",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_norm_policy_parses() {
        let cli = Cli::parse_from([
            "tabtrain",
            "--train", "a.csv",
            "--test", "b.csv",
            "--norm", "never",
        ]);
        assert_eq!(cli.norm, NormalizePolicy::Never);
    }
}
