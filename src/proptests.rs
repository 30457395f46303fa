use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

use crate::btree::{tests::validate, BTree};
use crate::candidates::{ArtCandidate, BTreeCandidate, LockedBTree, SkipListCandidate, StdBTree};
use crate::dataset::RawKey;

#[derive(Clone, Debug)]
enum Op {
    Set(i64, i64),
    Get(i64),
    Delete(i64),
    Ascend(i64, usize),
    Descend(i64, usize),
}

fn key_strategy() -> impl Strategy<Value = i64> + Clone {
    // Narrow enough that sets, gets and deletes keep hitting the same keys.
    prop_oneof![
        4 => 0i64..256,
        1 => 0i64..dataset::KEY_SPACE,
    ]
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let key = key_strategy();
    let op = prop_oneof![
        45 => (key.clone(), any::<i64>()).prop_map(|(k, v)| Op::Set(k, v)),
        20 => key.clone().prop_map(Op::Get),
        20 => key.clone().prop_map(Op::Delete),
        8 => (key.clone(), 1usize..=12).prop_map(|(k, n)| Op::Ascend(k, n)),
        7 => (key.clone(), 1usize..=12).prop_map(|(k, n)| Op::Descend(k, n)),
    ];
    prop::collection::vec(op, 0..=1500)
}

/// Probe material for one key: the record and its raw projection.
fn material(k: i64, value: i64) -> (Record, RawKey) {
    let mut record = Record::from_int(k).unwrap();
    record.value = value;
    let raw = *record.key.as_raw();
    (record, raw)
}

fn collect<C: Candidate>(c: &C, k: i64, limit: usize, ascending: bool) -> Vec<(Key, i64)> {
    let (record, raw) = material(k, 0);
    let probe = Probe { record: &record, raw: &raw };
    let mut out = Vec::new();
    let visit = |r: &Record| {
        out.push((r.key, r.value));
        out.len() < limit
    };
    if ascending {
        c.ascend_from(probe, visit);
    } else {
        c.descend_from(probe, visit);
    }
    out
}

fn check_model<C: Candidate>(ops: Vec<Op>, degree: usize) -> std::result::Result<C, TestCaseError> {
    let mut c = C::construct(degree);
    let mut m: BTreeMap<Key, i64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Set(k, v) => {
                let (record, raw) = material(k, v);
                let reported = c.set(Probe { record: &record, raw: &raw });
                let existed = m.insert(record.key, v).is_some();
                if let Some(existed_c) = reported {
                    prop_assert_eq!(existed_c, existed);
                }
            }
            Op::Get(k) => {
                let (record, raw) = material(k, 0);
                let got = c.get(Probe { record: &record, raw: &raw });
                prop_assert_eq!(got, m.get(&record.key).copied());
            }
            Op::Delete(k) => {
                let (record, raw) = material(k, 0);
                let removed = c.delete(Probe { record: &record, raw: &raw });
                prop_assert_eq!(removed, m.remove(&record.key).is_some());
            }
            Op::Ascend(k, n) => {
                let pivot = Key::from_int(k).unwrap();
                let expected: Vec<_> = m.range(pivot..).take(n).map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(collect(&c, k, n, true), expected);
            }
            Op::Descend(k, n) => {
                let pivot = Key::from_int(k).unwrap();
                let expected: Vec<_> = m.range(..=pivot).rev().take(n).map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(collect(&c, k, n, false), expected);
            }
        }
        prop_assert_eq!(c.len(), m.len());
    }

    let mut scanned = Vec::new();
    c.scan(|r| {
        scanned.push((r.key, r.value));
        true
    });
    let expected: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
    prop_assert_eq!(scanned, expected);
    Ok(c)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        max_shrink_iters: 20_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_std_matches_model(ops in ops_strategy()) {
        check_model::<StdBTree>(ops, 32)?;
    }

    #[test]
    fn prop_btree_matches_model(ops in ops_strategy(), degree in 2usize..=9) {
        let c = check_model::<BTreeCandidate>(ops, degree)?;
        validate(c.tree());
    }

    #[test]
    fn prop_locked_btree_matches_model(ops in ops_strategy(), degree in 2usize..=5) {
        check_model::<LockedBTree>(ops, degree)?;
    }

    #[test]
    fn prop_art_matches_model(ops in ops_strategy()) {
        check_model::<ArtCandidate>(ops, 0)?;
    }

    #[test]
    fn prop_skiplist_matches_model(ops in ops_strategy()) {
        check_model::<SkipListCandidate>(ops, 0)?;
    }

    #[test]
    fn prop_btree_structure_holds(keys in prop::collection::vec(0i64..512, 0..=600), degree in 2usize..=6) {
        let mut t = BTree::new(degree);
        let mut m = BTreeMap::new();
        for (i, &k) in keys.iter().enumerate() {
            let (record, _) = material(k, i as i64);
            t.insert(record, None);
            m.insert(record.key, record.value);
        }
        validate(&t);
        prop_assert_eq!(t.len(), m.len());

        // Remove every other key and check the structure after each step.
        for (i, k) in m.keys().enumerate() {
            if i % 2 == 0 {
                prop_assert!(t.remove(k).is_some());
                validate(&t);
            }
        }
        prop_assert_eq!(t.len(), m.len() / 2);
    }

    #[test]
    fn prop_load_matches_insert(mut keys in prop::collection::vec(0i64..100_000, 0..=800), degree in 2usize..=8) {
        keys.sort_unstable();
        keys.dedup();
        let mut loaded = BTree::new(degree);
        let mut inserted = BTree::new(degree);
        for &k in &keys {
            let (record, _) = material(k, k);
            loaded.load(record);
            inserted.insert(record, None);
        }
        validate(&loaded);

        let mut a = Vec::new();
        loaded.ascend(None, None, |r| { a.push(r.key); true });
        let mut b = Vec::new();
        inserted.ascend(None, None, |r| { b.push(r.key); true });
        prop_assert_eq!(a, b);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_remove_order_small_btree() {
    let keys: Vec<i64> = vec![1, 2, 3, 10, 11, 20, 30];

    let mut base = BTree::new(2);
    for &k in &keys {
        base.insert(material(k, k).0, None);
    }
    validate(&base);

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        for k in perm {
            let key = Key::from_int(k).unwrap();
            assert_eq!(t.remove(&key).map(|r| r.value), Some(k));
            validate(&t);
        }
        assert!(t.is_empty());
        // The shared original is untouched by removals on the copy.
        assert_eq!(base.len(), keys.len());
    });
}

#[test]
fn exhaustive_insert_order_small_art() {
    // Keys sharing long prefixes exercise prefix splits and collapses.
    let keys: Vec<i64> = vec![0, 1, 10, 100, 1_000_000, 9_999_999_999_999_999];

    for_each_permutation(&keys, |perm| {
        let mut art = art::Art::new();
        for &k in &perm {
            let (record, raw) = material(k, k);
            assert_eq!(art.insert(&raw, record.value), None);
        }
        let mut got = Vec::new();
        art.ascend(None, |r| {
            got.push(r.value);
            true
        });
        assert_eq!(got, keys);

        for &k in perm.iter().rev() {
            let (_, raw) = material(k, 0);
            assert_eq!(art.remove(&raw), Some(k));
        }
        assert!(art.is_empty());
    });
}
