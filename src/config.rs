//! Run configuration.

use clap::ValueEnum;

use crate::measure::{JemallocSampler, MemorySampler, NoopSampler, RssSampler};

pub const DEFAULT_COUNT: usize = 1_000_000;
pub const DEFAULT_DEGREE: usize = 32;

/// Where memory figures come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MemoryMode {
    /// Bytes allocated through jemalloc.
    #[default]
    Jemalloc,
    /// Resident set size of the process.
    Rss,
    /// No memory columns.
    Off,
}

impl MemoryMode {
    pub fn sampler(self) -> Box<dyn MemorySampler> {
        match self {
            MemoryMode::Jemalloc => Box::new(JemallocSampler),
            MemoryMode::Rss => Box::new(RssSampler),
            MemoryMode::Off => Box::new(NoopSampler),
        }
    }
}

/// Phase groups that can be switched off. All on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseGroups {
    pub sequential: bool,
    pub random: bool,
    pub delete: bool,
    pub hints: bool,
    pub pivot: bool,
    pub scan: bool,
}

impl Default for PhaseGroups {
    fn default() -> Self {
        Self {
            sequential: true,
            random: true,
            delete: true,
            hints: true,
            pivot: true,
            scan: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchConfig {
    /// Dataset size, and the op count of every phase.
    pub count: usize,
    /// Fanout handed to `Candidate::construct`.
    pub degree: usize,
    /// Fixed seed for dataset and orderings; drawn from entropy when unset.
    pub seed: Option<u64>,
    pub memory: MemoryMode,
    /// Candidate labels to run; empty runs all of them.
    pub candidates: Vec<String>,
    /// When non-empty, run the degree sweep instead of the phase sequence.
    pub sweep: Vec<usize>,
    pub groups: PhaseGroups,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            degree: DEFAULT_DEGREE,
            seed: None,
            memory: MemoryMode::default(),
            candidates: Vec::new(),
            sweep: Vec::new(),
            groups: PhaseGroups::default(),
        }
    }
}
