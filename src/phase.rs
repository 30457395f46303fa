//! The fixed phase sequence every candidate goes through.
//!
//! Candidates run one after another. Before each, the dataset is put back in
//! sorted order and the order controller is rewound, so every candidate sees
//! exactly the same sequence of orderings. Phases a candidate has no
//! capability for are skipped, never failed.

use tracing::{debug, info, warn};

use crate::candidate::{Candidate, Capabilities, PathHint, Registration, Registry};
use crate::config::BenchConfig;
use crate::dataset::{Dataset, Key, Record, Value};
use crate::error::{BenchError, Result};
use crate::measure::{Measurement, Recorder};
use crate::order::{self, OrderController, Ordering};
use crate::report::{Group, Reporter, Row};

/// Records visited by one pivot-range operation.
pub const PIVOT_SPAN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    SetSeq,
    SetSeqHint,
    LoadSeq,
    GetSeq,
    GetSeqHint,
    DeleteSeq,
    SetRand,
    SetRandHint,
    LoadRand,
    GetRand,
    GetRandHint,
    DeleteRand,
    DeleteRandMiss,
    SetAfterCopy,
    AscendSeq,
    DescendSeq,
    AscendSeqHint,
    DescendSeqHint,
    AscendRand,
    DescendRand,
    AscendRandHint,
    DescendRandHint,
    Scan,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::SetSeq => "set-seq",
            Phase::SetSeqHint => "set-seq-hint",
            Phase::LoadSeq => "load-seq",
            Phase::GetSeq => "get-seq",
            Phase::GetSeqHint => "get-seq-hint",
            Phase::DeleteSeq => "delete-seq",
            Phase::SetRand => "set-rand",
            Phase::SetRandHint => "set-rand-hint",
            Phase::LoadRand => "load-rand",
            Phase::GetRand => "get-rand",
            Phase::GetRandHint => "get-rand-hint",
            Phase::DeleteRand => "delete-rand",
            Phase::DeleteRandMiss => "delete-rand-miss",
            Phase::SetAfterCopy => "set-after-copy",
            Phase::AscendSeq => "ascend-seq",
            Phase::DescendSeq => "descend-seq",
            Phase::AscendSeqHint => "ascend-seq-hint",
            Phase::DescendSeqHint => "descend-seq-hint",
            Phase::AscendRand => "ascend-rand",
            Phase::DescendRand => "descend-rand",
            Phase::AscendRandHint => "ascend-rand-hint",
            Phase::DescendRandHint => "descend-rand-hint",
            Phase::Scan => "scan",
        }
    }

    pub fn group(self) -> Group {
        use Phase::*;
        match self {
            SetSeq | SetSeqHint | LoadSeq => Group::SequentialSet,
            GetSeq | GetSeqHint => Group::SequentialGet,
            DeleteSeq => Group::SequentialDelete,
            SetRand | SetRandHint | LoadRand | SetAfterCopy => Group::RandomSet,
            GetRand | GetRandHint => Group::RandomGet,
            DeleteRand | DeleteRandMiss => Group::RandomDelete,
            AscendSeq | DescendSeq | AscendSeqHint | DescendSeqHint => Group::SequentialPivot,
            AscendRand | DescendRand | AscendRandHint | DescendRandHint => Group::RandomPivot,
            Scan => Group::Scan,
        }
    }

    /// Insert and load phases carry a memory figure. For `set-after-copy`
    /// it is what the copy allocates on top of the shared original.
    pub fn reports_memory(self) -> bool {
        use Phase::*;
        matches!(
            self,
            SetSeq | SetSeqHint | LoadSeq | SetRand | SetRandHint | LoadRand | SetAfterCopy
        )
    }

    pub fn uses_hint(self) -> bool {
        use Phase::*;
        matches!(
            self,
            SetSeqHint
                | GetSeqHint
                | SetRandHint
                | GetRandHint
                | AscendSeqHint
                | DescendSeqHint
                | AscendRandHint
                | DescendRandHint
        )
    }

    pub fn is_delete(self) -> bool {
        matches!(self, Phase::DeleteSeq | Phase::DeleteRand | Phase::DeleteRandMiss)
    }

    fn is_ascending(self) -> bool {
        use Phase::*;
        matches!(self, AscendSeq | AscendSeqHint | AscendRand | AscendRandHint)
    }

    /// Capabilities a candidate needs for this phase to run.
    pub fn required(self) -> Capabilities {
        let mut caps = Capabilities::empty();
        if self.uses_hint() {
            caps |= Capabilities::HINTS;
        }
        if self.is_delete() {
            caps |= Capabilities::DELETE;
        }
        match self {
            Phase::LoadSeq | Phase::LoadRand => caps |= Capabilities::TRUSTED_LOAD,
            Phase::SetAfterCopy => caps |= Capabilities::CLONE,
            _ => {}
        }
        caps
    }
}

/// Dataset index -> position in key order.
fn key_ranks(dataset: &Dataset) -> Vec<usize> {
    let records = dataset.records();
    let mut by_key: Vec<usize> = (0..records.len()).collect();
    by_key.sort_unstable_by_key(|&i| records[i].key);
    let mut ranks = vec![0; records.len()];
    for (rank, &i) in by_key.iter().enumerate() {
        ranks[i] = rank;
    }
    ranks
}

fn expect_value(candidate: &str, phase: &'static str, record: &Record, got: Option<Value>) -> Result<()> {
    match got {
        Some(v) if v == record.value => Ok(()),
        Some(actual) => Err(BenchError::ValueMismatch {
            candidate: candidate.to_string(),
            phase,
            key: record.key,
            expected: record.value,
            actual,
        }),
        None => Err(BenchError::MissingKey {
            candidate: candidate.to_string(),
            phase,
            key: record.key,
        }),
    }
}

pub struct PhaseRunner<'a> {
    config: &'a BenchConfig,
    dataset: &'a mut Dataset,
    controller: OrderController,
    recorder: Recorder,
    reporter: Reporter,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        config: &'a BenchConfig,
        dataset: &'a mut Dataset,
        controller: OrderController,
        recorder: Recorder,
    ) -> Self {
        Self {
            reporter: Reporter::new(config.degree, dataset.len()),
            config,
            dataset,
            controller,
            recorder,
        }
    }

    /// Run every registered candidate, or the degree sweep when one is
    /// configured.
    pub fn run(&mut self, registry: &Registry) -> Result<()> {
        info!(
            candidates = ?registry.labels(),
            count = self.dataset.len(),
            degree = self.config.degree,
            seed = self.controller.seed(),
            memory = self.recorder.sampler_name(),
            "starting run"
        );

        if !self.config.sweep.is_empty() {
            for &degree in &self.config.sweep {
                for reg in registry.iter() {
                    reg.sweep(self, degree)?;
                }
            }
            return Ok(());
        }

        for reg in registry.iter() {
            reg.run(self)?;
        }
        Ok(())
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn finish(self) -> Reporter {
        self.reporter
    }

    fn reorder(&mut self, ordering: Ordering) {
        self.controller.apply(ordering, self.dataset);
    }

    fn skip(&self, reg: &Registration, phase: Phase) -> bool {
        let groups = &self.config.groups;
        let switched_off = (phase.uses_hint() && !groups.hints) || (phase.is_delete() && !groups.delete);
        let unsupported = !reg.supports(phase.required());
        if switched_off || unsupported {
            debug!(
                candidate = reg.label(),
                phase = phase.label(),
                switched_off,
                unsupported,
                "skipping phase"
            );
            return true;
        }
        false
    }

    fn record(&mut self, reg: &Registration, phase: Phase, measurement: Measurement) {
        debug!(
            candidate = reg.label(),
            phase = phase.label(),
            ops = measurement.ops,
            elapsed_ms = measurement.elapsed.as_millis() as u64,
            memory = ?measurement.memory,
            "phase complete"
        );
        self.reporter.record(Row {
            group: phase.group(),
            candidate: reg.label().to_string(),
            phase: phase.label().to_string(),
            rank: phase as usize,
            measurement,
            show_memory: phase.reports_memory(),
        });
    }

    pub(crate) fn run_candidate<C: Candidate>(&mut self, reg: &Registration) -> Result<()> {
        info!(candidate = reg.label(), capabilities = ?reg.capabilities(), "benchmarking candidate");
        order::sort_ascending(self.dataset);
        self.controller.rewind();

        let groups = self.config.groups;
        if groups.sequential {
            self.sequential::<C>(reg)?;
        }
        if groups.random {
            self.random::<C>(reg)?;
        }
        let mut populated = None;
        if groups.pivot {
            populated = Some(self.pivots::<C>(reg)?);
        }
        if groups.scan {
            let mut target = match populated.take() {
                Some(target) => target,
                None => self.populate::<C>(),
            };
            self.scan(reg, &mut target)?;
        }
        Ok(())
    }

    /// Time `set-seq` then `get-seq` at one fanout.
    pub(crate) fn sweep_candidate<C: Candidate>(&mut self, reg: &Registration, degree: usize) -> Result<()> {
        if !reg.supports(Capabilities::FANOUT) {
            debug!(candidate = reg.label(), degree, "no fanout parameter, skipping sweep");
            return Ok(());
        }
        info!(candidate = reg.label(), degree, "sweeping degree");
        self.reorder(Ordering::Sorted);

        let label = reg.label();
        let ds = &*self.dataset;
        let n = ds.len();
        let mut target = C::construct(degree);
        let set = self.recorder.ops(&mut target, n, true, |t, i| {
            t.set(ds.probe(i));
            Ok(())
        })?;
        let get = self.recorder.ops(&mut target, n, false, |t, i| {
            expect_value(label, "sweep-get", &ds.records()[i], t.get(ds.probe(i)))
        })?;
        drop(target);

        for (phase, measurement, show_memory) in [
            (format!("degree {degree}"), set, true),
            (format!("get-seq degree {degree}"), get, false),
        ] {
            self.reporter.record(Row {
                group: Group::DegreeSweep,
                candidate: label.to_string(),
                phase,
                rank: 0,
                measurement,
                show_memory,
            });
        }
        Ok(())
    }

    fn sequential<C: Candidate>(&mut self, reg: &Registration) -> Result<()> {
        self.reorder(Ordering::Sorted);
        let Some(mut target) = self.inserts::<C>(reg, [Phase::SetSeq, Phase::SetSeqHint, Phase::LoadSeq])? else {
            return Ok(());
        };
        for phase in [Phase::GetSeq, Phase::GetSeqHint] {
            if !self.skip(reg, phase) {
                self.get(reg, phase, &mut target)?;
            }
        }
        if !self.skip(reg, Phase::DeleteSeq) {
            self.drain(reg, Phase::DeleteSeq, &mut target)?;
        }
        Ok(())
    }

    fn random<C: Candidate>(&mut self, reg: &Registration) -> Result<()> {
        self.reorder(Ordering::Shuffled);
        let Some(mut target) = self.inserts::<C>(reg, [Phase::SetRand, Phase::SetRandHint, Phase::LoadRand])? else {
            return Ok(());
        };

        self.reorder(Ordering::Shuffled);
        for phase in [Phase::GetRand, Phase::GetRandHint] {
            if !self.skip(reg, phase) {
                self.get(reg, phase, &mut target)?;
            }
        }

        self.reorder(Ordering::Shuffled);
        if !self.skip(reg, Phase::DeleteRand) {
            self.drain(reg, Phase::DeleteRand, &mut target)?;
            if !self.skip(reg, Phase::DeleteRandMiss) {
                self.drain(reg, Phase::DeleteRandMiss, &mut target)?;
            }
        }
        drop(target);

        if !self.skip(reg, Phase::SetAfterCopy) {
            self.set_after_copy::<C>(reg)?;
        }
        Ok(())
    }

    /// Run each insert phase on a fresh instance; keep the last one.
    fn inserts<C: Candidate>(&mut self, reg: &Registration, phases: [Phase; 3]) -> Result<Option<C>> {
        let mut latest = None;
        for phase in phases {
            if self.skip(reg, phase) {
                continue;
            }
            // The previous instance must be gone before the next before-sample.
            drop(latest.take());
            latest = Some(self.insert::<C>(reg, phase)?);
        }
        Ok(latest)
    }

    fn insert<C: Candidate>(&mut self, reg: &Registration, phase: Phase) -> Result<C> {
        let ds = &*self.dataset;
        let n = ds.len();
        let sample = phase.reports_memory();
        let mut target = C::construct(self.config.degree);
        let mut hint = PathHint::new();

        let measurement = match phase {
            Phase::LoadSeq | Phase::LoadRand => self.recorder.ops(&mut target, n, sample, |t, i| {
                t.load(ds.probe(i));
                Ok(())
            }),
            _ if phase.uses_hint() => self.recorder.ops(&mut target, n, sample, |t, i| {
                t.set_hint(ds.probe(i), &mut hint);
                Ok(())
            }),
            _ => self.recorder.ops(&mut target, n, sample, |t, i| {
                t.set(ds.probe(i));
                Ok(())
            }),
        }?;

        self.record(reg, phase, measurement);
        Ok(target)
    }

    fn get<C: Candidate>(&mut self, reg: &Registration, phase: Phase, target: &mut C) -> Result<()> {
        let ds = &*self.dataset;
        let n = ds.len();
        let label = reg.label();
        let name = phase.label();
        let mut hint = PathHint::new();

        let measurement = if phase.uses_hint() {
            self.recorder.ops(target, n, false, |t, i| {
                expect_value(label, name, &ds.records()[i], t.get_hint(ds.probe(i), &mut hint))
            })
        } else {
            self.recorder.ops(target, n, false, |t, i| {
                expect_value(label, name, &ds.records()[i], t.get(ds.probe(i)))
            })
        }?;

        self.record(reg, phase, measurement);
        Ok(())
    }

    /// Delete every key. `delete-rand-miss` runs over an already drained
    /// instance, where "nothing removed" is the expected outcome.
    fn drain<C: Candidate>(&mut self, reg: &Registration, phase: Phase, target: &mut C) -> Result<()> {
        let ds = &*self.dataset;
        let n = ds.len();
        let label = reg.label();
        let name = phase.label();
        let expect_present = phase != Phase::DeleteRandMiss;

        let measurement = self.recorder.ops(target, n, false, |t, i| {
            let removed = t.delete(ds.probe(i));
            if removed == expect_present {
                return Ok(());
            }
            let key = ds.records()[i].key;
            let candidate = label.to_string();
            Err(if expect_present {
                BenchError::DeleteMismatch { candidate, phase: name, key }
            } else {
                BenchError::UnexpectedPresence { candidate, phase: name, key }
            })
        })?;

        if !target.is_empty() {
            return Err(BenchError::DrainIncomplete {
                candidate: label.to_string(),
                phase: name,
                remaining: target.len(),
            });
        }
        self.record(reg, phase, measurement);
        Ok(())
    }

    fn set_after_copy<C: Candidate>(&mut self, reg: &Registration) -> Result<()> {
        let base = self.populate::<C>();
        let Some(mut copy) = base.try_clone() else {
            warn!(candidate = reg.label(), "advertises clone but returned no copy");
            return Ok(());
        };

        let ds = &*self.dataset;
        let sample = Phase::SetAfterCopy.reports_memory();
        let measurement = self.recorder.ops(&mut copy, ds.len(), sample, |t, i| {
            t.set(ds.probe(i));
            Ok(())
        })?;
        std::hint::black_box(&base);
        drop(copy);
        drop(base);

        self.record(reg, Phase::SetAfterCopy, measurement);
        Ok(())
    }

    /// Untimed insert of the whole dataset in its current order.
    fn populate<C: Candidate>(&self) -> C {
        let mut target = C::construct(self.config.degree);
        for i in 0..self.dataset.len() {
            target.set(self.dataset.probe(i));
        }
        target
    }

    fn pivots<C: Candidate>(&mut self, reg: &Registration) -> Result<C> {
        self.reorder(Ordering::Sorted);
        let mut target = self.populate::<C>();
        for phase in [Phase::AscendSeq, Phase::DescendSeq, Phase::AscendSeqHint, Phase::DescendSeqHint] {
            if !self.skip(reg, phase) {
                self.pivot(reg, phase, &mut target)?;
            }
        }

        self.reorder(Ordering::Shuffled);
        for phase in [Phase::AscendRand, Phase::DescendRand, Phase::AscendRandHint, Phase::DescendRandHint] {
            if !self.skip(reg, phase) {
                self.pivot(reg, phase, &mut target)?;
            }
        }
        Ok(target)
    }

    /// Each op opens a cursor at one dataset key and walks up to
    /// [`PIVOT_SPAN`] records. The cursor must start at the pivot itself and
    /// stop early only when the keys run out.
    fn pivot<C: Candidate>(&mut self, reg: &Registration, phase: Phase, target: &mut C) -> Result<()> {
        let ranks = key_ranks(&*self.dataset);
        let ds = &*self.dataset;
        let n = ds.len();
        let label = reg.label();
        let name = phase.label();
        let ascending = phase.is_ascending();
        let hinted = phase.uses_hint();
        let mut hint = PathHint::new();

        let measurement = self.recorder.ops(target, n, false, |t, i| {
            let probe = ds.probe(i);
            let mut visited = 0usize;
            let mut first: Option<Key> = None;
            let visit = |r: &Record| {
                if visited == 0 {
                    first = Some(r.key);
                }
                visited += 1;
                visited < PIVOT_SPAN
            };
            match (ascending, hinted) {
                (true, false) => t.ascend_from(probe, visit),
                (false, false) => t.descend_from(probe, visit),
                (true, true) => t.ascend_hint(probe, &mut hint, visit),
                (false, true) => t.descend_hint(probe, &mut hint, visit),
            }

            let pivot = *probe.key();
            if first != Some(pivot) {
                return Err(BenchError::PivotMismatch {
                    candidate: label.to_string(),
                    phase: name,
                    pivot,
                    found: first.map_or_else(|| "nothing".to_string(), |k| k.to_string()),
                });
            }
            let remaining = if ascending { n - ranks[i] } else { ranks[i] + 1 };
            let expected = remaining.min(PIVOT_SPAN);
            if visited != expected {
                return Err(BenchError::ScanMismatch {
                    candidate: label.to_string(),
                    phase: name,
                    visited,
                    expected,
                });
            }
            Ok(())
        })?;

        self.record(reg, phase, measurement);
        Ok(())
    }

    /// Charged as one operation: the loop scans on its first iteration only.
    fn scan<C: Candidate>(&mut self, reg: &Registration, target: &mut C) -> Result<()> {
        let n = self.dataset.len();
        let label = reg.label();
        let measurement = self.recorder.ops(target, n, false, |t, i| {
            if i != 0 {
                return Ok(());
            }
            let mut visited = 0usize;
            t.scan(|_| {
                visited += 1;
                true
            });
            if visited != n {
                return Err(BenchError::ScanMismatch {
                    candidate: label.to_string(),
                    phase: Phase::Scan.label(),
                    visited,
                    expected: n,
                });
            }
            Ok(())
        })?;

        self.record(reg, Phase::Scan, measurement);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::{ArtCandidate, BTreeCandidate, StdBTree};
    use crate::config::MemoryMode;
    use crate::measure::NoopSampler;

    fn runner<'a>(config: &'a BenchConfig, dataset: &'a mut Dataset) -> PhaseRunner<'a> {
        PhaseRunner::new(config, dataset, OrderController::new(17), Recorder::new(Box::new(NoopSampler)))
    }

    fn config(count: usize) -> BenchConfig {
        BenchConfig {
            count,
            degree: 3,
            memory: MemoryMode::Off,
            ..BenchConfig::default()
        }
    }

    fn phases_of(reporter: &Reporter, candidate: &str) -> Vec<String> {
        reporter
            .rows()
            .iter()
            .filter(|r| r.candidate == candidate)
            .map(|r| r.phase.clone())
            .collect()
    }

    #[test]
    fn test_labels_are_distinct() {
        use std::collections::HashSet;
        let all = [
            Phase::SetSeq,
            Phase::SetSeqHint,
            Phase::LoadSeq,
            Phase::GetSeq,
            Phase::GetSeqHint,
            Phase::DeleteSeq,
            Phase::SetRand,
            Phase::SetRandHint,
            Phase::LoadRand,
            Phase::GetRand,
            Phase::GetRandHint,
            Phase::DeleteRand,
            Phase::DeleteRandMiss,
            Phase::SetAfterCopy,
            Phase::AscendSeq,
            Phase::DescendSeq,
            Phase::AscendSeqHint,
            Phase::DescendSeqHint,
            Phase::AscendRand,
            Phase::DescendRand,
            Phase::AscendRandHint,
            Phase::DescendRandHint,
            Phase::Scan,
        ];
        let labels: HashSet<_> = all.iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), all.len());
        assert!(all.iter().all(|p| p.label().len() <= 17));
    }

    #[test]
    fn test_required_capabilities() {
        assert_eq!(Phase::SetSeq.required(), Capabilities::empty());
        assert_eq!(Phase::GetRandHint.required(), Capabilities::HINTS);
        assert_eq!(Phase::LoadRand.required(), Capabilities::TRUSTED_LOAD);
        assert_eq!(Phase::DeleteRandMiss.required(), Capabilities::DELETE);
        assert_eq!(Phase::SetAfterCopy.required(), Capabilities::CLONE);
        assert!(Phase::LoadSeq.reports_memory());
        assert!(Phase::SetAfterCopy.reports_memory());
        assert!(!Phase::GetSeq.reports_memory());
    }

    /// Every sample reads 64 bytes more than the last.
    struct Ticking(u64);

    impl crate::measure::MemorySampler for Ticking {
        fn name(&self) -> &'static str {
            "ticking"
        }

        fn sample(&mut self) -> Option<u64> {
            self.0 += 64;
            Some(self.0)
        }
    }

    #[test]
    fn test_set_after_copy_reports_memory() {
        let mut cfg = config(40);
        cfg.groups.sequential = false;
        cfg.groups.pivot = false;
        cfg.groups.scan = false;
        let mut ds = Dataset::from_values(0..40).unwrap();
        let mut registry = Registry::new();
        registry.register::<BTreeCandidate>("btree");

        let recorder = Recorder::new(Box::new(Ticking(0)));
        let mut runner = PhaseRunner::new(&cfg, &mut ds, OrderController::new(5), recorder);
        runner.run(&registry).unwrap();

        let row = runner
            .reporter()
            .rows()
            .iter()
            .find(|r| r.phase == "set-after-copy")
            .cloned()
            .unwrap();
        assert!(row.show_memory);
        assert_eq!(row.measurement.memory, Some(64));
        assert_eq!(row.group, Group::RandomSet);

        let gets = runner.reporter().rows().iter().filter(|r| r.phase == "get-rand");
        assert!(gets.into_iter().all(|r| r.measurement.memory.is_none()));
    }

    #[test]
    fn test_key_ranks() {
        let ds = Dataset::from_values([30, 10, 20]).unwrap();
        assert_eq!(key_ranks(&ds), vec![2, 0, 1]);
    }

    #[test]
    fn test_full_sequence_for_capable_candidate() {
        let cfg = config(200);
        let mut ds = Dataset::from_values((0..200).map(|v| v * 13)).unwrap();
        let mut registry = Registry::new();
        registry.register::<BTreeCandidate>("btree");

        let mut runner = runner(&cfg, &mut ds);
        runner.run(&registry).unwrap();
        let reporter = runner.finish();

        let phases = phases_of(&reporter, "btree");
        assert_eq!(phases.len(), 23);
        assert_eq!(phases.first().map(String::as_str), Some("set-seq"));
        assert_eq!(phases.last().map(String::as_str), Some("scan"));
        assert!(reporter.rows().iter().all(|r| r.measurement.ops == 200));
    }

    #[test]
    fn test_unsupported_phases_are_skipped() {
        let cfg = config(50);
        let mut ds = Dataset::from_values(0..50).unwrap();
        let mut registry = Registry::new();
        registry.register::<ArtCandidate>("art");

        let mut runner = runner(&cfg, &mut ds);
        runner.run(&registry).unwrap();
        let phases = phases_of(runner.reporter(), "art");

        assert!(phases.iter().all(|p| !p.contains("hint") && !p.starts_with("load")));
        assert!(phases.contains(&"set-after-copy".to_string()));
        assert!(phases.contains(&"delete-rand-miss".to_string()));
    }

    #[test]
    fn test_group_switches() {
        let mut cfg = config(20);
        cfg.groups.random = false;
        cfg.groups.pivot = false;
        cfg.groups.hints = false;
        cfg.groups.delete = false;
        let mut ds = Dataset::from_values(0..20).unwrap();
        let mut registry = Registry::new();
        registry.register::<StdBTree>("std");

        let mut runner = runner(&cfg, &mut ds);
        runner.run(&registry).unwrap();
        assert_eq!(phases_of(runner.reporter(), "std"), vec!["set-seq", "get-seq", "scan"]);
    }

    #[test]
    fn test_sweep_only_fanout_candidates() {
        let mut cfg = config(30);
        cfg.sweep = vec![2, 8];
        let mut ds = Dataset::from_values(0..30).unwrap();
        let mut registry = Registry::new();
        registry
            .register::<StdBTree>("std")
            .register::<BTreeCandidate>("btree");

        let mut runner = runner(&cfg, &mut ds);
        runner.run(&registry).unwrap();
        let reporter = runner.finish();

        assert!(phases_of(&reporter, "std").is_empty());
        assert_eq!(
            phases_of(&reporter, "btree"),
            vec!["degree 2", "get-seq degree 2", "degree 8", "get-seq degree 8"]
        );
        assert!(reporter.rows().iter().all(|r| r.group == Group::DegreeSweep));
    }

    #[test]
    fn test_empty_dataset_runs_clean() {
        let cfg = config(0);
        let mut ds = Dataset::default();
        let mut registry = Registry::new();
        registry.register::<BTreeCandidate>("btree");

        let mut runner = runner(&cfg, &mut ds);
        runner.run(&registry).unwrap();
        assert!(runner.reporter().rows().iter().all(|r| r.measurement.ops == 0));
    }
}
