//! Timing and memory sampling around a phase's operation loop.

use std::hint::black_box;
use std::time::{Duration, Instant};

use tikv_jemalloc_ctl::{epoch, stats};
use tracing::warn;

use crate::candidate::Candidate;
use crate::error::Result;

/// Source of "bytes in use" figures.
pub trait MemorySampler {
    fn name(&self) -> &'static str;

    /// Settle allocator statistics, then read bytes in use.
    ///
    /// `None` when the figure is unavailable; callers drop the memory column
    /// rather than fail the run.
    fn sample(&mut self) -> Option<u64>;
}

/// Bytes allocated through jemalloc.
///
/// Only meaningful when the binary installs `tikv_jemallocator::Jemalloc`
/// as its global allocator.
#[derive(Debug, Default)]
pub struct JemallocSampler;

impl MemorySampler for JemallocSampler {
    fn name(&self) -> &'static str {
        "jemalloc"
    }

    fn sample(&mut self) -> Option<u64> {
        // Statistics are cached per epoch; advancing is the settle pass.
        if let Err(err) = epoch::advance() {
            warn!(%err, "jemalloc epoch advance failed");
            return None;
        }
        match stats::allocated::read() {
            Ok(bytes) => Some(bytes as u64),
            Err(err) => {
                warn!(%err, "jemalloc stats read failed");
                None
            }
        }
    }
}

/// Resident set size of the process.
#[derive(Debug, Default)]
pub struct RssSampler;

impl MemorySampler for RssSampler {
    fn name(&self) -> &'static str {
        "rss"
    }

    fn sample(&mut self) -> Option<u64> {
        match memory_stats::memory_stats() {
            Some(usage) => Some(usage.physical_mem as u64),
            None => {
                warn!("resident set size unavailable on this platform");
                None
            }
        }
    }
}

/// Never samples.
#[derive(Debug, Default)]
pub struct NoopSampler;

impl MemorySampler for NoopSampler {
    fn name(&self) -> &'static str {
        "off"
    }

    fn sample(&mut self) -> Option<u64> {
        None
    }
}

/// Result of one timed loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub ops: usize,
    pub elapsed: Duration,
    /// Signed change in bytes in use across the loop.
    pub memory: Option<i64>,
}

impl Measurement {
    fn elapsed_nanos(&self) -> f64 {
        (self.elapsed.as_nanos() as f64).max(1.0)
    }

    pub fn ops_per_sec(&self) -> f64 {
        self.ops as f64 * 1e9 / self.elapsed_nanos()
    }

    pub fn ns_per_op(&self) -> f64 {
        if self.ops == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / self.ops as f64
    }

    pub fn bytes_per_op(&self) -> Option<f64> {
        let bytes = self.memory?;
        if self.ops == 0 {
            return None;
        }
        Some(bytes as f64 / self.ops as f64)
    }
}

/// Wraps a fixed-count loop with a clock and, optionally, memory samples.
pub struct Recorder {
    sampler: Box<dyn MemorySampler>,
}

impl Recorder {
    pub fn new(sampler: Box<dyn MemorySampler>) -> Self {
        Self { sampler }
    }

    pub fn sampler_name(&self) -> &'static str {
        self.sampler.name()
    }

    /// Run `op(target, i)` for `i in 0..n`.
    ///
    /// The first error stops the loop and is returned. When `sample_memory`
    /// is set, memory is read before the loop and after it; between the loop
    /// and the second sample the target is touched once so it is provably
    /// still live when the figure is taken.
    pub fn ops<T, F>(
        &mut self,
        target: &mut T,
        n: usize,
        sample_memory: bool,
        mut op: F,
    ) -> Result<Measurement>
    where
        T: Candidate,
        F: FnMut(&mut T, usize) -> Result<()>,
    {
        let before = if sample_memory {
            self.sampler.sample()
        } else {
            None
        };

        let start = Instant::now();
        for i in 0..n {
            op(target, i)?;
        }
        let elapsed = start.elapsed();

        black_box(&*target).touch();
        let after = if sample_memory {
            self.sampler.sample()
        } else {
            None
        };
        black_box(&*target);

        let memory = match (before, after) {
            (Some(b), Some(a)) => Some(a as i64 - b as i64),
            _ => None,
        };
        Ok(Measurement {
            ops: n,
            elapsed,
            memory,
        })
    }
}
