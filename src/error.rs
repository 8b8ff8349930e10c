//! Error types and the warning sink
//!
//! Loading either succeeds completely or fails with a [`LoadError`];
//! non-fatal diagnostics (multiply-defined regions, bad magnetization
//! expressions) go through the warning sink instead. Air-gap queries have
//! their own small error enum because scripted callers dispatch on the
//! exact failure.

use thiserror::Error;

/// Failure modes of [`crate::PostProcessor::open`]
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("couldn't read from specified .ans file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is from a different solver version (format {found}); re-analyze with the current version")]
    UnsupportedFormat { found: f64 },

    #[error("no solution found in file")]
    NoSolution,

    #[error("error reading {section} section: wrong number of inputs ({found}) for entry {index} (expected {expected})")]
    WrongArity {
        section: &'static str,
        index: usize,
        found: usize,
        expected: usize,
    },

    #[error("error reading {section} section: {detail}")]
    Malformed { section: &'static str, detail: String },

    #[error("air gap element pad {pad} has negative node number ({n0}, {n1}, {n2}, {n3})")]
    NegativeQuadNode { pad: usize, n0: i64, n1: i64, n2: i64, n3: i64 },

    #[error("truncated file while reading {0} section")]
    Truncated(&'static str),
}

/// Failure modes of the air-gap query family
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapError {
    #[error("no air gap boundary with the requested name")]
    NameNotFound,

    #[error("air gap element has no harmonics")]
    NoHarmonics,

    #[error("negative harmonic requested")]
    NegativeHarmonic,

    #[error("requested harmonic too large")]
    HarmonicTooLarge,
}

/// Receiver for non-fatal diagnostics emitted during load and queries
pub type WarningSink = Box<dyn Fn(&str) + Send + Sync>;

/// Default sink: forward to the `log` facade
pub fn log_sink() -> WarningSink {
    Box::new(|msg| log::warn!("{msg}"))
}
