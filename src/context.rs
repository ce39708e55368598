//! Per-run context: state tracking and advisory messages
//!
//! One `RunContext` is created per experiment run. It replaces any
//! process-global channel: advisories are collected on the context and also
//! emitted as tracing events, so callers can inspect what degraded during a
//! run without parsing log output.

use std::time::Instant;
use tracing::{debug, warn};

/// Linear state machine of a single experiment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Configured,
    RolesResolved,
    Trained,
    Persisted,
    TestPipelineReconstructed,
    Scored,
    Evaluated,
    Reported,
}

/// Context object threaded through every orchestration step.
#[derive(Debug)]
pub struct RunContext {
    state: RunState,
    advisories: Vec<String>,
    started: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            state: RunState::Configured,
            advisories: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Record a non-fatal degradation. The run continues.
    pub fn advise(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        warn!("{}", msg);
        self.advisories.push(msg);
    }

    /// Advance the run to the next state.
    pub fn enter(&mut self, state: RunState) {
        debug!(?state, "run state transition");
        self.state = state;
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }

    /// Seconds elapsed since the context was created.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
