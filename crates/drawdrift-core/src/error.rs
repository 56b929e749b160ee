//! Crate-wide error type.
//!
//! Every operation validates its arguments eagerly and returns before any
//! state is touched, so a failed call never leaves an estimator or series
//! half-updated.

use thiserror::Error;

/// Errors surfaced by drawdrift operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed static parameters: outcome count below 2, non-positive
    /// step/trial counts, hyperparameters outside their valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),

    /// Malformed per-call data: non-distribution vectors, empty sequences,
    /// windows larger than the data they scan.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// A vector argument does not match the expected outcome count.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// An observed draw lies outside `[0, n_outcomes)`.
    #[error("draw {draw} out of range for {n_outcomes} outcomes")]
    DrawOutOfRange { draw: usize, n_outcomes: usize },

    /// Bias coefficients collapse the total probability mass to zero or below.
    #[error("bias coefficients collapse the probability mass")]
    DegenerateMass,
}

/// Convenience alias used across the crate.
pub type Result<T> = core::result::Result<T, Error>;
