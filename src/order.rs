//! Sorted and shuffled orderings over a [`Dataset`], applied in place.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::dataset::Dataset;

/// Order in which a phase walks the dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ordering {
    Sorted,
    Shuffled,
}

/// Reorder records by key ascending, then re-derive the raw projection.
pub fn sort_ascending(dataset: &mut Dataset) {
    dataset.records_mut().sort_unstable_by(|a, b| a.key.cmp(&b.key));
    dataset.rebuild_raw();
}

/// Fisher–Yates over `[0, n)`: step `i` swaps with a uniform index in `[0, i]`.
///
/// Records and raw keys move together, so index alignment never breaks.
pub fn shuffle<R: Rng + ?Sized>(dataset: &mut Dataset, rng: &mut R) {
    for i in 0..dataset.len() {
        let j = rng.gen_range(0..=i);
        dataset.swap(i, j);
    }
}

/// Applies orderings from a seeded generator.
///
/// [`OrderController::rewind`] replays the same permutation sequence, which
/// is how every candidate gets the same random orders.
pub struct OrderController {
    seed: u64,
    rng: StdRng,
}

impl OrderController {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rewind(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    pub fn apply(&mut self, ordering: Ordering, dataset: &mut Dataset) {
        debug!(?ordering, len = dataset.len(), "reordering dataset");
        match ordering {
            Ordering::Sorted => sort_ascending(dataset),
            Ordering::Shuffled => shuffle(dataset, &mut self.rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::generate;

    fn is_sorted(ds: &Dataset) -> bool {
        ds.records().windows(2).all(|w| w[0].key < w[1].key)
    }

    #[test]
    fn test_sort_rebuilds_raw_projection() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut ds = generate(500, &mut rng).unwrap();
        sort_ascending(&mut ds);
        assert!(is_sorted(&ds));
        for (record, raw) in ds.records().iter().zip(ds.raw_keys()) {
            assert_eq!(record.key.as_raw(), raw);
        }
    }

    #[test]
    fn test_shuffle_keeps_alignment() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut ds = generate(500, &mut rng).unwrap();
        shuffle(&mut ds, &mut rng);
        ds.verify_distinct().unwrap();
        for (record, raw) in ds.records().iter().zip(ds.raw_keys()) {
            assert_eq!(record.key.as_raw(), raw);
        }
    }

    #[test]
    fn test_shuffle_then_sort_round_trips() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut ds = generate(1000, &mut rng).unwrap();
        sort_ascending(&mut ds);
        let sorted = ds.records().to_vec();

        shuffle(&mut ds, &mut rng);
        assert_ne!(ds.records(), sorted.as_slice());
        sort_ascending(&mut ds);
        assert_eq!(ds.records(), sorted.as_slice());
    }

    #[test]
    fn test_rewind_replays_permutations() {
        let mut rng = StdRng::seed_from_u64(6);
        let base = generate(200, &mut rng).unwrap();
        let mut controller = OrderController::new(99);

        let mut first = base.clone();
        controller.apply(Ordering::Shuffled, &mut first);

        controller.rewind();
        let mut second = base.clone();
        controller.apply(Ordering::Shuffled, &mut second);

        assert_eq!(first.records(), second.records());
    }

    #[test]
    fn test_shuffle_single_and_empty() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut empty = Dataset::default();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = Dataset::from_values([7]).unwrap();
        shuffle(&mut one, &mut rng);
        assert_eq!(one.records()[0].value, 7);
    }
}
