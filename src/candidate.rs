//! The capability interface every container under test implements, and the
//! registry the runner iterates.

use bitflags::bitflags;

use crate::dataset::{Probe, Record, Value};
use crate::error::Result;
use crate::phase::PhaseRunner;

bitflags! {
    /// Optional behaviour a candidate supports, read once at registration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u8 {
        /// `set_hint` / `get_hint` / `ascend_hint` / `descend_hint` use the hint.
        const HINTS = 1 << 0;
        /// `load` is a distinct fast path for ascending input.
        const TRUSTED_LOAD = 1 << 1;
        /// `try_clone` returns `Some`.
        const CLONE = 1 << 2;
        /// `delete` removes records.
        const DELETE = 1 << 3;
        /// `construct` honours the degree parameter.
        const FANOUT = 1 << 4;
        /// Stores the raw byte projection rather than `Key`. Informational
        /// only: shown by `--list`, never used to skip a phase.
        const BYTE_KEYS = 1 << 5;
    }
}

const HINT_DEPTH: usize = 8;

/// Cursor state threaded through nearby-key operations.
///
/// The runner owns it and passes it by reference; only the candidate reads
/// or writes the remembered path. One slot per tree level, up to eight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathHint {
    used: [bool; HINT_DEPTH],
    path: [u16; HINT_DEPTH],
}

impl PathHint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembered index at `depth`, if any.
    #[inline]
    pub fn slot(&self, depth: usize) -> Option<usize> {
        match self.used.get(depth) {
            Some(true) => Some(self.path[depth] as usize),
            _ => None,
        }
    }

    #[inline]
    pub fn remember(&mut self, depth: usize, index: usize) {
        if depth >= HINT_DEPTH {
            return;
        }
        match u16::try_from(index) {
            Ok(index) => {
                self.used[depth] = true;
                self.path[depth] = index;
            }
            Err(_) => self.used[depth] = false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// An ordered container under comparison.
///
/// Calls on absent keys report "not found" without side effects. Range
/// visits are strictly monotonic in key and stop the moment `visit` returns
/// false.
pub trait Candidate: Sized {
    const CAPABILITIES: Capabilities;

    /// Empty instance; `degree` is the fanout for tree-shaped containers.
    fn construct(degree: usize) -> Self;

    /// Upsert. `Some(previously_present)` when the container reports it.
    fn set(&mut self, probe: Probe<'_>) -> Option<bool>;

    fn get(&self, probe: Probe<'_>) -> Option<Value>;

    /// True when a record was removed.
    fn delete(&mut self, probe: Probe<'_>) -> bool;

    /// Visit records with key >= the probe key, ascending.
    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F);

    /// Visit records with key <= the probe key, descending.
    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F);

    /// Visit every record ascending.
    fn scan<F: FnMut(&Record) -> bool>(&self, visit: F);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_hint(&mut self, probe: Probe<'_>, _hint: &mut PathHint) -> Option<bool> {
        self.set(probe)
    }

    fn get_hint(&self, probe: Probe<'_>, _hint: &mut PathHint) -> Option<Value> {
        self.get(probe)
    }

    fn ascend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        _hint: &mut PathHint,
        visit: F,
    ) {
        self.ascend_from(probe, visit)
    }

    fn descend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        _hint: &mut PathHint,
        visit: F,
    ) {
        self.descend_from(probe, visit)
    }

    /// Insert for callers that guarantee strictly ascending keys.
    ///
    /// Feeding keys out of order is outside the contract; what happens then
    /// is up to the candidate.
    fn load(&mut self, probe: Probe<'_>) -> Option<bool> {
        self.set(probe)
    }

    /// Independent copy; mutations of either side never show in the other.
    fn try_clone(&self) -> Option<Self> {
        None
    }

    /// One harmless read, used to keep the instance live until a memory
    /// sample has been taken.
    fn touch(&self) {
        let mut first = None;
        self.scan(|record| {
            first = Some(*record);
            false
        });
        std::hint::black_box(first);
    }
}

type RunEntry = fn(&mut PhaseRunner<'_>, &Registration) -> Result<()>;
type SweepEntry = fn(&mut PhaseRunner<'_>, &Registration, usize) -> Result<()>;

/// A registered candidate: label, capabilities and monomorphized entry points.
pub struct Registration {
    label: String,
    capabilities: Capabilities,
    run: RunEntry,
    sweep: SweepEntry,
}

impl Registration {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn supports(&self, caps: Capabilities) -> bool {
        self.capabilities.contains(caps)
    }

    pub(crate) fn run(&self, runner: &mut PhaseRunner<'_>) -> Result<()> {
        (self.run)(runner, self)
    }

    pub(crate) fn sweep(&self, runner: &mut PhaseRunner<'_>, degree: usize) -> Result<()> {
        (self.sweep)(runner, self, degree)
    }
}

fn run_entry<C: Candidate>(runner: &mut PhaseRunner<'_>, reg: &Registration) -> Result<()> {
    runner.run_candidate::<C>(reg)
}

fn sweep_entry<C: Candidate>(
    runner: &mut PhaseRunner<'_>,
    reg: &Registration,
    degree: usize,
) -> Result<()> {
    runner.sweep_candidate::<C>(reg, degree)
}

/// Ordered list of candidates to benchmark.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Candidate>(&mut self, label: impl Into<String>) -> &mut Self {
        self.entries.push(Registration {
            label: label.into(),
            capabilities: C::CAPABILITIES,
            run: run_entry::<C>,
            sweep: sweep_entry::<C>,
        });
        self
    }

    /// Keep only the candidates whose label is in `labels`.
    pub fn retain(&mut self, labels: &[String]) {
        self.entries.retain(|e| labels.iter().any(|l| l == &e.label));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_slots() {
        let mut hint = PathHint::new();
        assert_eq!(hint.slot(0), None);
        hint.remember(0, 5);
        hint.remember(3, 70);
        assert_eq!(hint.slot(0), Some(5));
        assert_eq!(hint.slot(3), Some(70));
        assert_eq!(hint.slot(1), None);

        // Deeper than the hint tracks: ignored.
        hint.remember(HINT_DEPTH, 1);
        assert_eq!(hint.slot(HINT_DEPTH), None);

        // Too wide to store: the slot is forgotten rather than truncated.
        hint.remember(0, usize::from(u16::MAX) + 1);
        assert_eq!(hint.slot(0), None);

        hint.clear();
        assert_eq!(hint.slot(3), None);
    }
}
