//! tabtrain - Train/test experiment runner for tabular data
//!
//! One command trains a model on a training file, optionally feeds the
//! trainer validation and in-training test data (when it supports them),
//! persists the model, reconstructs the test pipeline from the persisted
//! artifact, scores the test file, evaluates, and reports metric tables.
//!
//! # Modules
//!
//! ## Orchestration
//! - [`experiment`] - The end-to-end train→test run
//! - [`context`] - Per-run state machine and advisory collection
//!
//! ## Data
//! - [`data`] - Dataset loading and schema inspection
//! - [`roles`] - Column role resolution and role-mapped datasets
//! - [`transform`] - Recorded transform pipelines with replay
//!
//! ## Modeling
//! - [`trainer`] - Trainer contract, built-in trainers, registry
//! - [`calibrate`] - Probability calibration
//! - [`store`] - Model persistence and the round-trip loader
//!
//! ## Results
//! - [`score`] - Binding a predictor to test data
//! - [`eval`] - Evaluators and metric bundles
//! - [`report`] - Console tables, summary file, per-instance output
//!
//! ## Interface
//! - [`cli`] - Command-line interface

pub mod error;

pub mod context;
pub mod data;
pub mod roles;
pub mod transform;

pub mod calibrate;
pub mod store;
pub mod trainer;

pub mod eval;
pub mod report;
pub mod score;

pub mod cli;
pub mod experiment;

pub use error::{Result, TabTrainError};
