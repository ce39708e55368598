//! Model persistence and the mandatory round-trip
//!
//! A trained run persists {predictor, role binding, transform pipeline} as
//! one artifact, then immediately reopens the store to reconstruct a
//! test-time loader from the persisted bytes. The reconstructed loader, not
//! the in-memory pipeline object, processes the test file; that is the
//! mechanism enforcing train/test pipeline parity.

use crate::data::load_dataset;
use crate::error::{Result, TabTrainError};
use crate::roles::RoleBinding;
use crate::trainer::Predictor;
use crate::transform::TransformPipeline;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything persisted for one trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub predictor: Predictor,
    pub binding: RoleBinding,
    pub pipeline: TransformPipeline,
}

/// Where the artifact is written. A transient location is a temp file
/// removed on every exit path, including panics, via its Drop impl.
pub enum StoreLocation {
    Durable(PathBuf),
    Transient(NamedTempFile),
}

impl StoreLocation {
    /// Durable when an output model path is configured, transient otherwise.
    pub fn for_output(output_model: Option<&Path>) -> Result<Self> {
        match output_model {
            Some(path) => Ok(StoreLocation::Durable(path.to_path_buf())),
            None => {
                let file = NamedTempFile::new().map_err(|e| {
                    TabTrainError::PersistenceError(format!(
                        "could not create transient model store: {}",
                        e
                    ))
                })?;
                Ok(StoreLocation::Transient(file))
            }
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StoreLocation::Durable(p) => p,
            StoreLocation::Transient(f) => f.path(),
        }
    }
}

/// Save/open interface over a JSON artifact file.
pub struct ModelStore;

impl ModelStore {
    /// Persist the artifact. Write failures are fatal.
    pub fn save(artifact: &ModelArtifact, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(artifact)?;
        std::fs::write(path, json).map_err(|e| {
            TabTrainError::PersistenceError(format!(
                "could not write model to {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Reopen a store and reconstruct a loader from the persisted metadata.
    pub fn open(path: &Path) -> Result<ModelLoader> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            TabTrainError::RoundTripError(format!(
                "could not reopen model store {}: {}",
                path.display(),
                e
            ))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&json).map_err(|e| {
            TabTrainError::RoundTripError(format!(
                "model store {} is not a valid artifact: {}",
                path.display(),
                e
            ))
        })?;
        Ok(ModelLoader { artifact })
    }
}

/// A test-time loader rebuilt purely from persisted metadata.
#[derive(Debug)]
pub struct ModelLoader {
    artifact: ModelArtifact,
}

impl ModelLoader {
    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Load a raw file and replay the persisted pipeline over it.
    pub fn load(&self, raw_path: &Path) -> Result<DataFrame> {
        let raw = load_dataset(raw_path)?;
        self.artifact.pipeline.replay(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Schema;
    use crate::roles::{DeclaredColumns, RoleBinding};
    use crate::transform::TransformPipeline;
    use ndarray::array;
    use polars::prelude::*;

    fn artifact() -> ModelArtifact {
        let df = df!(
            "Label" => &[0.0, 1.0],
            "f1" => &[1.0, 2.0]
        )
        .unwrap();
        let (casted, pipeline) = TransformPipeline::fit(&df).unwrap();
        let binding =
            RoleBinding::resolve(&Schema::of(&casted), &DeclaredColumns::default()).unwrap();
        ModelArtifact {
            predictor: Predictor::Linear {
                weights: array![1.0],
                intercept: 0.5,
            },
            binding,
            pipeline,
        }
    }

    #[test]
    fn test_save_open_preserves_artifact() {
        let artifact = artifact();
        let file = NamedTempFile::new().unwrap();
        ModelStore::save(&artifact, file.path()).unwrap();
        let loader = ModelStore::open(file.path()).unwrap();
        assert_eq!(loader.artifact(), &artifact);
    }

    #[test]
    fn test_two_opens_yield_identical_loaders() {
        let artifact = artifact();
        let file = NamedTempFile::new().unwrap();
        ModelStore::save(&artifact, file.path()).unwrap();
        let a = ModelStore::open(file.path()).unwrap();
        let b = ModelStore::open(file.path()).unwrap();
        assert_eq!(a.artifact(), b.artifact());
    }

    #[test]
    fn test_open_missing_store_is_round_trip_error() {
        let err = ModelStore::open(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, TabTrainError::RoundTripError(_)));
    }

    #[test]
    fn test_save_to_bad_path_is_persistence_error() {
        let artifact = artifact();
        let err =
            ModelStore::save(&artifact, Path::new("/nonexistent/dir/model.json")).unwrap_err();
        assert!(matches!(err, TabTrainError::PersistenceError(_)));
    }

    #[test]
    fn test_transient_location_is_removed_on_drop() {
        let path = {
            let loc = StoreLocation::for_output(None).unwrap();
            loc.path().to_path_buf()
        };
        assert!(!path.exists());
    }
}
