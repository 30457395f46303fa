//! Key/value universe shared by every candidate and phase.

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::error::{BenchError, Result};

/// Width of every formatted key, in bytes.
pub const KEY_WIDTH: usize = 16;

/// Keys are drawn from `[0, KEY_SPACE)`.
pub const KEY_SPACE: i64 = 10_000_000_000_000_000;

/// Byte projection of a key, consumed by byte-oriented candidates.
pub type RawKey = [u8; KEY_WIDTH];

/// Value stored alongside a key: the key's source integer.
pub type Value = i64;

/// Zero-padded decimal key.
///
/// Fixed width plus zero padding make byte order equal numeric order, so the
/// derived `Ord` is the numeric order of the source integers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(RawKey);

impl Key {
    /// Format `value` as a key, rejecting anything that does not land on
    /// exactly [`KEY_WIDTH`] digits.
    pub fn from_int(value: i64) -> Result<Self> {
        let text = format!("{value:0width$}", width = KEY_WIDTH);
        if value < 0 || text.len() != KEY_WIDTH {
            return Err(BenchError::MalformedKey {
                value,
                width: text.len(),
                expected: KEY_WIDTH,
            });
        }
        let mut raw = [0u8; KEY_WIDTH];
        raw.copy_from_slice(text.as_bytes());
        Ok(Self(raw))
    }

    /// Rebuild a key from its byte projection.
    #[inline]
    pub fn from_raw(raw: RawKey) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn as_raw(&self) -> &RawKey {
        &self.0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}

/// Immutable key/value pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: Key,
    pub value: Value,
}

impl Record {
    /// Record whose key encodes `value` and whose value is `value`.
    pub fn from_int(value: i64) -> Result<Self> {
        Ok(Self {
            key: Key::from_int(value)?,
            value,
        })
    }

    #[inline]
    pub fn from_raw(raw: RawKey, value: Value) -> Self {
        Self {
            key: Key::from_raw(raw),
            value,
        }
    }
}

/// The record and raw key at one dataset index.
///
/// Candidates read whichever representation they store natively.
#[derive(Clone, Copy, Debug)]
pub struct Probe<'a> {
    pub record: &'a Record,
    pub raw: &'a RawKey,
}

impl Probe<'_> {
    #[inline]
    pub fn key(&self) -> &Key {
        &self.record.key
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.record.value
    }
}

/// N records plus their raw key projection, index-aligned at all times.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<Record>,
    raw: Vec<RawKey>,
}

impl Dataset {
    /// Build a dataset from explicit source integers, in the given order.
    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Result<Self> {
        let records = values
            .into_iter()
            .map(Record::from_int)
            .collect::<Result<Vec<_>>>()?;
        let dataset = Self::from_records(records);
        dataset.verify_distinct()?;
        Ok(dataset)
    }

    fn from_records(records: Vec<Record>) -> Self {
        let raw = records.iter().map(|r| *r.key.as_raw()).collect();
        Self { records, raw }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn raw_keys(&self) -> &[RawKey] {
        &self.raw
    }

    #[inline]
    pub fn probe(&self, index: usize) -> Probe<'_> {
        Probe {
            record: &self.records[index],
            raw: &self.raw[index],
        }
    }

    /// Check that no key appears twice and that the raw projection matches.
    pub fn verify_distinct(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.records.len());
        for (index, (record, raw)) in self.records.iter().zip(&self.raw).enumerate() {
            if !seen.insert(record.key) || record.key.as_raw() != raw {
                return Err(BenchError::DuplicateKey {
                    key: record.key,
                    index,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    pub(crate) fn swap(&mut self, i: usize, j: usize) {
        self.records.swap(i, j);
        self.raw.swap(i, j);
    }

    pub(crate) fn rebuild_raw(&mut self) {
        self.raw.clear();
        self.raw.extend(self.records.iter().map(|r| *r.key.as_raw()));
    }
}

/// Draw `n` distinct keys uniformly from `[0, KEY_SPACE)`.
///
/// Collisions are rejected and redrawn, so the loop terminates for any `n`
/// that is small relative to the key space.
pub fn generate<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Dataset> {
    if n as u128 > KEY_SPACE as u128 {
        return Err(BenchError::KeySpaceExhausted {
            requested: n,
            space: KEY_SPACE,
        });
    }

    let mut seen: HashSet<i64> = HashSet::with_capacity(n);
    let mut records = Vec::with_capacity(n);
    let mut collisions = 0usize;
    while records.len() < n {
        let value = rng.gen_range(0..KEY_SPACE);
        if !seen.insert(value) {
            collisions += 1;
            continue;
        }
        records.push(Record::from_int(value)?);
    }

    debug!(count = n, collisions, "generated dataset");
    Ok(Dataset::from_records(records))
}
