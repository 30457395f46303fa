//! The containers shipped with the harness, adapted to [`Candidate`].

use std::collections::BTreeMap;

use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;

use crate::art::Art;
use crate::btree::BTree;
use crate::candidate::{Candidate, Capabilities, PathHint, Registry};
use crate::dataset::{Key, Probe, RawKey, Record, Value};

/// `std::collections::BTreeMap`, the baseline.
#[derive(Clone, Debug, Default)]
pub struct StdBTree(BTreeMap<Key, Value>);

impl Candidate for StdBTree {
    const CAPABILITIES: Capabilities = Capabilities::CLONE.union(Capabilities::DELETE);

    fn construct(_degree: usize) -> Self {
        Self::default()
    }

    fn set(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.insert(*probe.key(), probe.value()).is_some())
    }

    fn get(&self, probe: Probe<'_>) -> Option<Value> {
        self.0.get(probe.key()).copied()
    }

    fn delete(&mut self, probe: Probe<'_>) -> bool {
        self.0.remove(probe.key()).is_some()
    }

    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, mut visit: F) {
        for (&key, &value) in self.0.range(*probe.key()..) {
            if !visit(&Record { key, value }) {
                break;
            }
        }
    }

    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, mut visit: F) {
        for (&key, &value) in self.0.range(..=*probe.key()).rev() {
            if !visit(&Record { key, value }) {
                break;
            }
        }
    }

    fn scan<F: FnMut(&Record) -> bool>(&self, mut visit: F) {
        for (&key, &value) in &self.0 {
            if !visit(&Record { key, value }) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// In-crate copy-on-write B-tree; the only candidate using hints and load.
#[derive(Clone, Debug)]
pub struct BTreeCandidate(BTree);

impl BTreeCandidate {
    pub fn tree(&self) -> &BTree {
        &self.0
    }
}

impl Candidate for BTreeCandidate {
    const CAPABILITIES: Capabilities = Capabilities::HINTS
        .union(Capabilities::TRUSTED_LOAD)
        .union(Capabilities::CLONE)
        .union(Capabilities::DELETE)
        .union(Capabilities::FANOUT);

    fn construct(degree: usize) -> Self {
        Self(BTree::new(degree))
    }

    fn set(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.insert(*probe.record, None).is_some())
    }

    fn get(&self, probe: Probe<'_>) -> Option<Value> {
        self.0.get(probe.key(), None).map(|r| r.value)
    }

    fn delete(&mut self, probe: Probe<'_>) -> bool {
        self.0.remove(probe.key()).is_some()
    }

    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.ascend(Some(probe.key()), None, visit)
    }

    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.descend(Some(probe.key()), None, visit)
    }

    fn scan<F: FnMut(&Record) -> bool>(&self, visit: F) {
        self.0.ascend(None, None, visit)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn set_hint(&mut self, probe: Probe<'_>, hint: &mut PathHint) -> Option<bool> {
        Some(self.0.insert(*probe.record, Some(hint)).is_some())
    }

    fn get_hint(&self, probe: Probe<'_>, hint: &mut PathHint) -> Option<Value> {
        self.0.get(probe.key(), Some(hint)).map(|r| r.value)
    }

    fn ascend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        hint: &mut PathHint,
        visit: F,
    ) {
        self.0.ascend(Some(probe.key()), Some(hint), visit)
    }

    fn descend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        hint: &mut PathHint,
        visit: F,
    ) {
        self.0.descend(Some(probe.key()), Some(hint), visit)
    }

    fn load(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.load(*probe.record).is_some())
    }

    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }

    fn touch(&self) {
        std::hint::black_box(self.0.first());
    }
}

/// The same B-tree with every call taking a `parking_lot` lock.
#[derive(Debug)]
pub struct LockedBTree(RwLock<BTree>);

impl Candidate for LockedBTree {
    const CAPABILITIES: Capabilities = BTreeCandidate::CAPABILITIES;

    fn construct(degree: usize) -> Self {
        Self(RwLock::new(BTree::new(degree)))
    }

    fn set(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.write().insert(*probe.record, None).is_some())
    }

    fn get(&self, probe: Probe<'_>) -> Option<Value> {
        self.0.read().get(probe.key(), None).map(|r| r.value)
    }

    fn delete(&mut self, probe: Probe<'_>) -> bool {
        self.0.write().remove(probe.key()).is_some()
    }

    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.read().ascend(Some(probe.key()), None, visit)
    }

    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.read().descend(Some(probe.key()), None, visit)
    }

    fn scan<F: FnMut(&Record) -> bool>(&self, visit: F) {
        self.0.read().ascend(None, None, visit)
    }

    fn len(&self) -> usize {
        self.0.read().len()
    }

    fn set_hint(&mut self, probe: Probe<'_>, hint: &mut PathHint) -> Option<bool> {
        Some(self.0.write().insert(*probe.record, Some(hint)).is_some())
    }

    fn get_hint(&self, probe: Probe<'_>, hint: &mut PathHint) -> Option<Value> {
        self.0.read().get(probe.key(), Some(hint)).map(|r| r.value)
    }

    fn ascend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        hint: &mut PathHint,
        visit: F,
    ) {
        self.0.read().ascend(Some(probe.key()), Some(hint), visit)
    }

    fn descend_hint<F: FnMut(&Record) -> bool>(
        &self,
        probe: Probe<'_>,
        hint: &mut PathHint,
        visit: F,
    ) {
        self.0.read().descend(Some(probe.key()), Some(hint), visit)
    }

    fn load(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.write().load(*probe.record).is_some())
    }

    fn try_clone(&self) -> Option<Self> {
        Some(Self(RwLock::new(self.0.read().clone())))
    }

    fn touch(&self) {
        std::hint::black_box(self.0.read().first().copied());
    }
}

/// Adaptive radix tree keyed by the raw byte projection.
#[derive(Clone, Debug, Default)]
pub struct ArtCandidate(Art);

impl Candidate for ArtCandidate {
    const CAPABILITIES: Capabilities = Capabilities::CLONE
        .union(Capabilities::DELETE)
        .union(Capabilities::BYTE_KEYS);

    fn construct(_degree: usize) -> Self {
        Self::default()
    }

    fn set(&mut self, probe: Probe<'_>) -> Option<bool> {
        Some(self.0.insert(probe.raw, probe.value()).is_some())
    }

    fn get(&self, probe: Probe<'_>) -> Option<Value> {
        self.0.get(probe.raw)
    }

    fn delete(&mut self, probe: Probe<'_>) -> bool {
        self.0.remove(probe.raw).is_some()
    }

    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.ascend(Some(probe.raw), visit)
    }

    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, visit: F) {
        self.0.descend(Some(probe.raw), visit)
    }

    fn scan<F: FnMut(&Record) -> bool>(&self, visit: F) {
        self.0.ascend(None, visit)
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn try_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// `crossbeam_skiplist::SkipMap` keyed by the raw byte projection.
///
/// Its insert does not say whether the key was already present, and it has
/// no snapshot clone.
#[derive(Default)]
pub struct SkipListCandidate(SkipMap<RawKey, Value>);

impl Candidate for SkipListCandidate {
    const CAPABILITIES: Capabilities = Capabilities::DELETE.union(Capabilities::BYTE_KEYS);

    fn construct(_degree: usize) -> Self {
        Self::default()
    }

    fn set(&mut self, probe: Probe<'_>) -> Option<bool> {
        self.0.insert(*probe.raw, probe.value());
        None
    }

    fn get(&self, probe: Probe<'_>) -> Option<Value> {
        self.0.get(probe.raw).map(|e| *e.value())
    }

    fn delete(&mut self, probe: Probe<'_>) -> bool {
        self.0.remove(probe.raw).is_some()
    }

    fn ascend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, mut visit: F) {
        for e in self.0.range(*probe.raw..) {
            if !visit(&Record::from_raw(*e.key(), *e.value())) {
                break;
            }
        }
    }

    fn descend_from<F: FnMut(&Record) -> bool>(&self, probe: Probe<'_>, mut visit: F) {
        for e in self.0.range(..=*probe.raw).rev() {
            if !visit(&Record::from_raw(*e.key(), *e.value())) {
                break;
            }
        }
    }

    fn scan<F: FnMut(&Record) -> bool>(&self, mut visit: F) {
        for e in self.0.iter() {
            if !visit(&Record::from_raw(*e.key(), *e.value())) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn touch(&self) {
        std::hint::black_box(self.0.front().map(|e| *e.value()));
    }
}

impl Registry {
    /// Every shipped candidate, in report order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register::<StdBTree>("std")
            .register::<BTreeCandidate>("btree")
            .register::<LockedBTree>("btree(lock)")
            .register::<ArtCandidate>("art")
            .register::<SkipListCandidate>("skiplist");
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn dataset() -> Dataset {
        Dataset::from_values([40, 10, 30, 50, 20]).unwrap()
    }

    fn values<C: Candidate>(c: &C, from: usize, ascending: bool, limit: usize, ds: &Dataset) -> Vec<i64> {
        let mut out = Vec::new();
        let visit = |r: &Record| {
            out.push(r.value);
            out.len() < limit
        };
        if ascending {
            c.ascend_from(ds.probe(from), visit);
        } else {
            c.descend_from(ds.probe(from), visit);
        }
        out
    }

    fn exercise<C: Candidate>() {
        let ds = dataset();
        let mut c = C::construct(2);
        for i in 0..ds.len() {
            assert_ne!(c.set(ds.probe(i)), Some(true));
        }
        assert_eq!(c.len(), 5);
        if let Some(present) = c.set(ds.probe(0)) {
            assert!(present, "re-set must report the key as present");
        }
        assert_eq!(c.len(), 5);

        for i in 0..ds.len() {
            assert_eq!(c.get(ds.probe(i)), Some(ds.records()[i].value));
        }

        // Pivot 30 sits at dataset index 2.
        assert_eq!(values(&c, 2, true, 10, &ds), vec![30, 40, 50]);
        assert_eq!(values(&c, 2, false, 10, &ds), vec![30, 20, 10]);
        assert_eq!(values(&c, 2, true, 2, &ds), vec![30, 40]);

        let mut scanned = Vec::new();
        c.scan(|r| {
            scanned.push(r.value);
            true
        });
        assert_eq!(scanned, vec![10, 20, 30, 40, 50]);

        let mut hint = PathHint::new();
        assert_eq!(c.get_hint(ds.probe(3), &mut hint), Some(50));

        if C::CAPABILITIES.contains(Capabilities::CLONE) {
            let copy = c.try_clone().unwrap();
            assert!(c.delete(ds.probe(1)));
            assert_eq!(copy.get(ds.probe(1)), Some(10));
        } else {
            assert!(c.try_clone().is_none());
            assert!(c.delete(ds.probe(1)));
        }
        assert!(!c.delete(ds.probe(1)));
        assert_eq!(c.get(ds.probe(1)), None);
        assert_eq!(c.len(), 4);
        c.touch();
    }

    #[test]
    fn test_std_btree() {
        exercise::<StdBTree>();
    }

    #[test]
    fn test_btree() {
        exercise::<BTreeCandidate>();
    }

    #[test]
    fn test_locked_btree() {
        exercise::<LockedBTree>();
    }

    #[test]
    fn test_art() {
        exercise::<ArtCandidate>();
    }

    #[test]
    fn test_skiplist() {
        exercise::<SkipListCandidate>();
    }

    #[test]
    fn test_standard_registry() {
        let mut registry = Registry::standard();
        assert_eq!(registry.labels(), vec!["std", "btree", "btree(lock)", "art", "skiplist"]);
        assert!(registry.iter().all(|r| r.supports(Capabilities::DELETE)));
        assert_eq!(
            registry
                .iter()
                .filter(|r| r.supports(Capabilities::HINTS))
                .count(),
            2
        );
        let byte_keyed: Vec<&str> = registry
            .iter()
            .filter(|r| r.supports(Capabilities::BYTE_KEYS))
            .map(|r| r.label())
            .collect();
        assert_eq!(byte_keyed, vec!["art", "skiplist"]);

        registry.retain(&["art".to_string(), "std".to_string()]);
        assert_eq!(registry.labels(), vec!["std", "art"]);
    }
}
