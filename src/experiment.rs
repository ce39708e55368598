//! The train→test experiment orchestrator
//!
//! One `Experiment::run` performs the whole sequence: load and transform the
//! training data, resolve column roles, train (with optional validation and
//! in-training test data, capability-gated), persist the model, reconstruct
//! the test pipeline from the persisted artifact, score, evaluate, report.
//! Scoring always goes through the reconstructed artifact, never the
//! in-memory one.

use crate::context::{RunContext, RunState};
use crate::data::{load_dataset, Schema};
use crate::error::{Result, TabTrainError};
use crate::eval::{create_evaluator, MetricKind, MetricsBundle};
use crate::report;
use crate::roles::{check_numeric_role, DeclaredColumns, RoleBinding, RoleMappedData};
use crate::score::create_scorer;
use crate::store::{ModelArtifact, ModelStore, StoreLocation};
use crate::trainer::{train_and_calibrate, Predictor, TrainRequest, TrainerRegistry};
use crate::transform::{NormalizePolicy, TransformPipeline};
use std::path::PathBuf;
use tracing::{debug, info};

/// Full configuration of one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub valid_file: Option<PathBuf>,
    pub trainer: String,
    pub label: Option<String>,
    pub features: Vec<String>,
    pub group: Option<String>,
    pub weight: Option<String>,
    pub name: Option<String>,
    pub custom: Vec<(String, String)>,
    pub norm: NormalizePolicy,
    pub cache_hint: Option<bool>,
    pub calibrator: String,
    pub max_calibration_examples: usize,
    pub summary: Option<PathBuf>,
    pub output_predictions: Option<PathBuf>,
    pub output_model: Option<PathBuf>,
    pub input_model: Option<PathBuf>,
    pub scorer: Option<String>,
    pub evaluator: Option<String>,
}

impl ExperimentConfig {
    /// Minimal config over a train/test pair; everything else defaulted.
    pub fn new(train_file: impl Into<PathBuf>, test_file: impl Into<PathBuf>) -> Self {
        Self {
            train_file: train_file.into(),
            test_file: test_file.into(),
            valid_file: None,
            trainer: "mean".to_string(),
            label: None,
            features: Vec::new(),
            group: None,
            weight: None,
            name: None,
            custom: Vec::new(),
            norm: NormalizePolicy::Auto,
            cache_hint: None,
            calibrator: "platt".to_string(),
            max_calibration_examples: 1_000_000_000,
            summary: None,
            output_predictions: None,
            output_model: None,
            input_model: None,
            scorer: None,
            evaluator: None,
        }
    }

    /// Reject configurations that cannot possibly run.
    pub fn validate(&self) -> Result<()> {
        if self.train_file.as_os_str().is_empty() {
            return Err(TabTrainError::ConfigError(
                "A training file is required (option 'train')".to_string(),
            ));
        }
        if self.test_file.as_os_str().is_empty() {
            return Err(TabTrainError::ConfigError(
                "A test file is required (option 'test')".to_string(),
            ));
        }
        if self.trainer.trim().is_empty() {
            return Err(TabTrainError::ConfigError(
                "A trainer is required (option 'trainer')".to_string(),
            ));
        }
        if self.max_calibration_examples == 0 {
            return Err(TabTrainError::ConfigError(
                "maxCalibrationExamples must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn declared_columns(&self) -> DeclaredColumns {
        DeclaredColumns {
            label: self.label.clone(),
            features: self.features.clone(),
            group: self.group.clone(),
            weight: self.weight.clone(),
            name: self.name.clone(),
            custom: self.custom.clone(),
        }
    }
}

/// What a completed run hands back to the caller.
#[derive(Debug)]
pub struct ExperimentResult {
    pub metrics: MetricsBundle,
    pub advisories: Vec<String>,
    pub final_state: RunState,
}

#[derive(Debug)]
pub struct Experiment {
    config: ExperimentConfig,
    registry: TrainerRegistry,
}

impl Experiment {
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: TrainerRegistry::builtin(),
        })
    }

    /// Registry access for callers that plug in extra trainers.
    pub fn registry_mut(&mut self) -> &mut TrainerRegistry {
        &mut self.registry
    }

    pub fn run(&self) -> Result<ExperimentResult> {
        let mut ctx = RunContext::new();
        let cfg = &self.config;
        info!(
            train = %cfg.train_file.display(),
            test = %cfg.test_file.display(),
            valid = ?cfg.valid_file,
            trainer = %cfg.trainer,
            calibrator = %cfg.calibrator,
            "starting experiment"
        );

        // Training data and the recorded transform pipeline.
        let raw_train = load_dataset(&cfg.train_file)?;
        let (mut train_df, mut pipeline) = TransformPipeline::fit(&raw_train)?;

        // Roles bind once, against the transformed training schema.
        let schema = Schema::of(&train_df);
        let binding = RoleBinding::resolve(&schema, &cfg.declared_columns())?;
        check_numeric_role(&schema, &binding.label, "labelColumn")?;
        check_numeric_role(&schema, &binding.weight, "weightColumn")?;
        binding.require_training_roles()?;
        ctx.enter(RunState::RolesResolved);
        info!(
            trainer = %cfg.trainer,
            label = ?binding.label.column(),
            features = binding.features.columns().len(),
            "roles resolved"
        );

        let trainer = self.registry.create(&cfg.trainer)?;
        let caps = trainer.capabilities();

        if cfg.norm.selects(trainer.wants_normalization()) {
            train_df = pipeline.add_normalizer(&train_df, binding.features.columns())?;
            debug!("feature normalization recorded in pipeline");
        }
        let train_data = RoleMappedData::new(train_df, binding.clone());

        // Optional validation data, gated on trainer capability. An unusable
        // validation file degrades the run with an advisory, never aborts it.
        let validation = match &cfg.valid_file {
            Some(path) if caps.supports_validation => {
                let df = pipeline.replay(&load_dataset(path)?)?;
                Some(RoleMappedData::new(df, binding.clone()))
            }
            Some(_) => {
                ctx.advise(format!(
                    "Trainer '{}' does not support validation data; the validation file is ignored.",
                    cfg.trainer
                ));
                None
            }
            None => None,
        };

        // The test set is additionally offered to trainers that can monitor
        // it during training. Declining trainers skip it without ceremony.
        let in_training_test = if caps.supports_test {
            let df = pipeline.replay(&load_dataset(&cfg.test_file)?)?;
            Some(RoleMappedData::new(df, binding.clone()))
        } else {
            debug!(trainer = %cfg.trainer, "trainer does not consume in-training test data");
            None
        };

        // Continue-training seed. A missing or unreadable input model is an
        // advisory; training starts fresh.
        let seed: Option<Predictor> = match &cfg.input_model {
            Some(path) => match ModelStore::open(path) {
                Ok(loader) => Some(loader.artifact().predictor.clone()),
                Err(e) => {
                    ctx.advise(format!(
                        "Could not load input model for continued training: {}; training from scratch.",
                        e
                    ));
                    None
                }
            },
            None => None,
        };

        let calibrator = crate::calibrate::create_calibrator(&cfg.calibrator)?;
        let predictor = train_and_calibrate(
            &mut ctx,
            trainer.as_ref(),
            TrainRequest {
                train: &train_data,
                validation: validation.as_ref(),
                test: in_training_test.as_ref(),
                seed,
                cache_hint: cfg.cache_hint,
            },
            calibrator,
            cfg.max_calibration_examples,
        )?;
        ctx.enter(RunState::Trained);

        // Persist, then immediately reopen. Everything downstream runs off
        // the reopened artifact.
        let artifact = ModelArtifact {
            predictor,
            binding,
            pipeline,
        };
        let location = StoreLocation::for_output(cfg.output_model.as_deref())?;
        ModelStore::save(&artifact, location.path())?;
        ctx.enter(RunState::Persisted);

        let loader = ModelStore::open(location.path())?;
        ctx.enter(RunState::TestPipelineReconstructed);

        let test_df = loader.load(&cfg.test_file)?;
        let persisted = loader.artifact();

        let scorer = create_scorer(cfg.scorer.as_deref())?;
        let scored = scorer.bind(&persisted.predictor, &test_df, &persisted.binding)?;
        ctx.enter(RunState::Scored);

        // The scored schema extends the test schema, so rebinding cannot
        // lose the roles scoring relied on; roles absent from the test file
        // degrade to unbound.
        let scored_binding = persisted.binding.rebind_permissive(&Schema::of(&scored));
        let scored_data = RoleMappedData::new(scored, scored_binding);

        let evaluator = create_evaluator(cfg.evaluator.as_deref(), &scored_data)?;
        let metrics = evaluator.evaluate(&scored_data)?;
        metrics.overall()?;
        ctx.enter(RunState::Evaluated);

        if let Some(table) = metrics.get(MetricKind::Warnings) {
            report::print_warnings(table)?;
        }
        if let Some(table) = metrics.get(MetricKind::PerFold) {
            report::print_fold_results(table)?;
        }
        if let Err(e) = report::print_overall(metrics.overall()?, cfg.summary.as_deref()) {
            ctx.advise(format!("Could not write the summary file: {}", e));
        }
        if let Some(table) = metrics.get(MetricKind::Additional) {
            report::print_additional(table)?;
        }

        if let Some(path) = &cfg.output_predictions {
            let per_instance_binding = scored_data.binding().without_features();
            let per_instance_data =
                RoleMappedData::new(scored_data.data().clone(), per_instance_binding);
            let table = evaluator.per_instance_metrics(&per_instance_data)?;
            report::save_per_instance(&table, path)?;
            info!(path = %path.display(), rows = table.height(), "per-instance output written");
        }

        ctx.enter(RunState::Reported);
        info!(elapsed_secs = ctx.elapsed_secs(), "experiment complete");

        Ok(ExperimentResult {
            metrics,
            advisories: ctx.advisories().to_vec(),
            final_state: ctx.state(),
        })
    }
}
