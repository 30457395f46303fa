//! Fatal invariant violations.
//!
//! Nothing in the harness is retryable: every variant signals a defect in the
//! dataset generator, the order controller or a candidate adapter, and aborts
//! the run.

use thiserror::Error;

use crate::dataset::Key;

/// Result type alias using [`BenchError`].
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("cannot draw {requested} distinct keys from a key space of {space}")]
    KeySpaceExhausted { requested: usize, space: i64 },

    #[error("key {value} formatted to width {width}, expected {expected}")]
    MalformedKey {
        value: i64,
        width: usize,
        expected: usize,
    },

    #[error("duplicate key {key} at index {index}")]
    DuplicateKey { key: Key, index: usize },

    #[error("{candidate}: {phase}: key {key} not found after insert")]
    MissingKey {
        candidate: String,
        phase: &'static str,
        key: Key,
    },

    #[error("{candidate}: {phase}: key {key} returned {actual}, expected {expected}")]
    ValueMismatch {
        candidate: String,
        phase: &'static str,
        key: Key,
        expected: i64,
        actual: i64,
    },

    #[error("{candidate}: {phase}: delete of present key {key} reported nothing removed")]
    DeleteMismatch {
        candidate: String,
        phase: &'static str,
        key: Key,
    },

    #[error("{candidate}: {phase}: key {key} still present after drain")]
    UnexpectedPresence {
        candidate: String,
        phase: &'static str,
        key: Key,
    },

    #[error("{candidate}: {phase}: {remaining} records left after drain")]
    DrainIncomplete {
        candidate: String,
        phase: &'static str,
        remaining: usize,
    },

    #[error("{candidate}: {phase}: cursor at {pivot} started at {found}")]
    PivotMismatch {
        candidate: String,
        phase: &'static str,
        pivot: Key,
        found: String,
    },

    #[error("{candidate}: {phase}: scan visited {visited} records, expected {expected}")]
    ScanMismatch {
        candidate: String,
        phase: &'static str,
        visited: usize,
        expected: usize,
    },

    #[error("none of the requested candidates {requested:?} is registered")]
    NoCandidates { requested: Vec<String> },
}
