//! # ordbench
//!
//! Comparative micro-benchmarks for ordered key-value containers.
//!
//! One dataset of distinct 16-byte decimal keys is generated per run. Every
//! registered [`Candidate`] then goes through the same fixed phase sequence
//! (inserts, lookups, deletes, pivot ranges and a full scan) with identical
//! orderings, and each phase becomes one line of the console report.
//!
//! ## Example
//!
//! ```rust
//! use ordbench::{BenchConfig, MemoryMode};
//!
//! let config = BenchConfig {
//!     count: 1_000,
//!     seed: Some(7),
//!     memory: MemoryMode::Off,
//!     ..BenchConfig::default()
//! };
//! let reporter = ordbench::run(&config).unwrap();
//! assert!(!reporter.rows().is_empty());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

pub mod art;
pub mod btree;
pub mod candidate;
pub mod candidates;
pub mod config;
pub mod dataset;
pub mod error;
pub mod measure;
pub mod order;
pub mod phase;
pub mod report;

#[cfg(test)]
mod proptests;

pub use candidate::{Candidate, Capabilities, PathHint, Registry};
pub use config::{BenchConfig, MemoryMode, PhaseGroups};
pub use dataset::{Dataset, Key, Probe, Record};
pub use error::{BenchError, Result};
pub use phase::PhaseRunner;
pub use report::Reporter;

/// What a run produced. `error` is the fatal violation that stopped it, if
/// any; `reporter` still holds every row measured before that point.
#[derive(Debug)]
pub struct RunOutput {
    pub seed: u64,
    pub reporter: Reporter,
    pub error: Option<BenchError>,
}

/// Generate the dataset, run the selected candidates, and return the
/// collected rows for rendering.
pub fn run(config: &BenchConfig) -> Result<Reporter> {
    let registry = select(config)?;
    let output = execute(config, &registry)?;
    match output.error {
        Some(err) => Err(err),
        None => Ok(output.reporter),
    }
}

/// Run `registry` against a fresh dataset. Only dataset generation fails
/// through the outer `Result`; a candidate failing mid-run ends up in
/// [`RunOutput::error`].
pub fn execute(config: &BenchConfig, registry: &Registry) -> Result<RunOutput> {
    let seed = match config.seed {
        Some(seed) => seed,
        None => {
            let seed: u64 = rand::random();
            warn!(seed, "no seed given, pass --seed {seed} to reproduce this run");
            seed
        }
    };
    info!(seed, count = config.count, "generating dataset");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut dataset = dataset::generate(config.count, &mut rng)?;
    let controller = order::OrderController::new(rng.gen());

    let recorder = measure::Recorder::new(config.memory.sampler());
    let mut runner = PhaseRunner::new(config, &mut dataset, controller, recorder);
    let error = runner.run(registry).err();
    Ok(RunOutput {
        seed,
        reporter: runner.finish(),
        error,
    })
}

/// The standard registry narrowed to `config.candidates`, when given.
pub fn select(config: &BenchConfig) -> Result<Registry> {
    let mut registry = Registry::standard();
    if config.candidates.is_empty() {
        return Ok(registry);
    }

    let known = registry.labels();
    let unknown: Vec<&String> = config
        .candidates
        .iter()
        .filter(|c| !known.contains(&c.as_str()))
        .collect();
    if !unknown.is_empty() {
        warn!(?unknown, ?known, "ignoring unknown candidates");
    }

    registry.retain(&config.candidates);
    if registry.is_empty() {
        return Err(BenchError::NoCandidates {
            requested: config.candidates.clone(),
        });
    }
    Ok(registry)
}
