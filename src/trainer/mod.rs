//! Trainer contract, built-in trainers, and the trainer registry
//!
//! Trainers are selected by name at configuration time through an explicit
//! registry. Each trainer declares its capabilities up front; the
//! orchestrator queries them before attaching optional validation or
//! in-training test data.

mod baseline;
mod linear;
mod logistic;
mod predictor;
mod sgd;

pub use baseline::MeanTrainer;
pub use linear::LinearTrainer;
pub use logistic::LogisticTrainer;
pub use predictor::Predictor;
pub use sgd::SgdTrainer;

use crate::calibrate::Calibrator;
use crate::context::RunContext;
use crate::error::{Result, TabTrainError};
use crate::roles::RoleMappedData;
use std::collections::BTreeMap;
use tracing::debug;

/// Optional-input capabilities a trainer declares. Read-only; queried before
/// optional datasets are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrainerCapabilities {
    pub supports_validation: bool,
    pub supports_test: bool,
}

/// Everything a trainer receives for one training invocation.
pub struct TrainRequest<'a> {
    pub train: &'a RoleMappedData,
    pub validation: Option<&'a RoleMappedData>,
    pub test: Option<&'a RoleMappedData>,
    /// Predictor to continue training from, when configured and loadable.
    pub seed: Option<Predictor>,
    /// Tri-state caching hint; trainers may ignore it.
    pub cache_hint: Option<bool>,
}

/// The trainer contract.
pub trait Trainer {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> TrainerCapabilities;

    /// Whether this trainer expects normalized features (consulted by the
    /// Auto normalization policy).
    fn wants_normalization(&self) -> bool {
        false
    }

    fn train(&self, ctx: &mut RunContext, req: TrainRequest<'_>) -> Result<Predictor>;
}

/// Explicit name→factory map of available trainers.
#[derive(Debug)]
pub struct TrainerRegistry {
    factories: BTreeMap<&'static str, fn() -> Box<dyn Trainer>>,
}

impl TrainerRegistry {
    /// Registry with the built-in trainers.
    pub fn builtin() -> Self {
        let mut factories: BTreeMap<&'static str, fn() -> Box<dyn Trainer>> = BTreeMap::new();
        factories.insert("mean", || Box::new(MeanTrainer));
        factories.insert("linear", || Box::new(LinearTrainer::new()));
        factories.insert("sgd", || Box::new(SgdTrainer::new()));
        factories.insert("logistic", || Box::new(LogisticTrainer::new()));
        Self { factories }
    }

    pub fn register(&mut self, name: &'static str, factory: fn() -> Box<dyn Trainer>) {
        self.factories.insert(name, factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Trainer>> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| {
                TabTrainError::ConfigError(format!(
                    "Unknown trainer '{}' (from option 'trainer'); available: {}",
                    name,
                    self.names().join(", ")
                ))
            })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

/// Train, then calibrate classifier output when a calibrator is configured.
///
/// Calibration is fitted on at most `max_examples` training rows. Regressors
/// and already-probabilistic baselines pass through untouched.
pub fn train_and_calibrate(
    ctx: &mut RunContext,
    trainer: &dyn Trainer,
    req: TrainRequest<'_>,
    calibrator: Option<crate::calibrate::PlattCalibrator>,
    max_examples: usize,
) -> Result<Predictor> {
    let train_data = req.train;
    let predictor = trainer.train(ctx, req)?;

    let Some(mut calibrator) = calibrator else {
        return Ok(predictor);
    };
    if !predictor.is_classifier() {
        debug!(
            kind = predictor.kind(),
            "skipping calibration for non-classifier predictor"
        );
        return Ok(predictor);
    }

    let features = train_data.feature_matrix()?;
    let labels = train_data.label_values()?;
    let n = features.nrows().min(max_examples);
    if n < features.nrows() {
        debug!(
            cap = max_examples,
            total = features.nrows(),
            "calibration sample capped"
        );
    }

    let sample = features.slice(ndarray::s![..n, ..]).to_owned();
    let sample_labels = labels.slice(ndarray::s![..n]).to_owned();
    let raw_scores = predictor.score(&sample)?;
    calibrator.fit(&raw_scores, &sample_labels)?;

    Ok(Predictor::Calibrated {
        inner: Box::new(predictor),
        calibrator,
    })
}
