//! Batch simulation over random instances.
//!
//! Generates many random instances, runs each to completion, and
//! aggregates how the algorithm behaved: how many steps and rounds runs
//! took, and whether every outcome passed an independent stability audit.

use crate::analysis::stability::is_stable;
use crate::engine::deferred_acceptance::{EngineError, MatchingEngine};
use crate::simulation::generator::{random_instance_with, synthetic_sides, GeneratorError};
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Configuration for a batch of random runs.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of independent random instances to run.
    pub runs: usize,
    /// Members per side of each instance.
    pub side_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            runs: 20,
            side_size: 8,
        }
    }
}

/// Aggregate statistics over a batch of runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStats {
    pub runs: usize,
    pub side_size: usize,
    pub mean_steps: f64,
    pub max_steps: usize,
    pub mean_rounds: f64,
    pub max_rounds: u32,
    /// True if every outcome passed the blocking-pair audit.
    pub all_stable: bool,
}

/// Run `config.runs` random instances to completion with the
/// thread-local RNG.
pub fn run_batch(config: &BatchConfig) -> Result<BatchStats, BatchError> {
    run_batch_with(config, &mut rand::thread_rng())
}

/// Run a batch with a caller-supplied RNG, for reproducible statistics.
pub fn run_batch_with<R: Rng>(
    config: &BatchConfig,
    rng: &mut R,
) -> Result<BatchStats, BatchError> {
    let (side_a, side_b) = synthetic_sides(config.side_size);
    let mut total_steps = 0usize;
    let mut max_steps = 0usize;
    let mut total_rounds = 0u64;
    let mut max_rounds = 0u32;
    let mut all_stable = true;

    for run in 0..config.runs {
        let instance = random_instance_with(&side_a, &side_b, rng)?;
        let (proposers, proposees) = (instance.side_a(), instance.side_b());

        let mut engine = MatchingEngine::new();
        engine.start(proposers, proposees)?;
        let reports = engine.run_to_completion()?;

        let steps = reports.len();
        let rounds = engine.round();
        total_steps += steps;
        max_steps = max_steps.max(steps);
        total_rounds += u64::from(rounds);
        max_rounds = max_rounds.max(rounds);
        if !is_stable(proposers, proposees, &engine.matched_pairs()) {
            all_stable = false;
        }
        info!(
            "batch run {}/{}: {} steps, {} rounds",
            run + 1,
            config.runs,
            steps,
            rounds
        );
    }

    let runs = config.runs.max(1) as f64;
    Ok(BatchStats {
        runs: config.runs,
        side_size: config.side_size,
        mean_steps: total_steps as f64 / runs,
        max_steps,
        mean_rounds: total_rounds as f64 / runs,
        max_rounds,
        all_stable,
    })
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Batch Simulation ===")?;
        writeln!(f, "Runs:        {}", self.runs)?;
        writeln!(f, "Side size:   {}", self.side_size)?;
        writeln!(f, "Mean steps:  {:.2}", self.mean_steps)?;
        writeln!(f, "Max steps:   {}", self.max_steps)?;
        writeln!(f, "Mean rounds: {:.2}", self.mean_rounds)?;
        writeln!(f, "Max rounds:  {}", self.max_rounds)?;
        writeln!(f, "All stable:  {}", self.all_stable)?;
        Ok(())
    }
}
