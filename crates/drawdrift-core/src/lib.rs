//! # drawdrift-core
//!
//! **Model and monitor bias in categorical draw streams.**
//!
//! `drawdrift-core` implements a multiplicative bias law for categorical
//! outcome distributions, simulators that generate synthetic draw streams
//! under static or drifting bias, streaming estimators that recover the
//! bias from observed draws, and rolling anomaly diagnostics that flag
//! drift away from a baseline.
//!
//! ## Quick Start
//!
//! ```
//! use drawdrift_core::{
//!     BiasEstimator, DriftConfig, EwmaEstimator, drift_series, rolling_anomaly_scores,
//!     sample_streaming,
//! };
//!
//! // Simulate 200 steps of drifting bias over 4 outcomes, then draw from it.
//! let config = DriftConfig {
//!     n_steps: 200,
//!     n_outcomes: 4,
//!     seed: Some(7),
//!     ..DriftConfig::default()
//! };
//! let series = drift_series(&config).unwrap();
//! let draws = sample_streaming(&series, Some(11)).unwrap();
//!
//! // Recover the bias online and scan for anomalies against uniform.
//! let mut estimator = EwmaEstimator::new(4, 0.1).unwrap();
//! let history = estimator.estimate_series(&draws).unwrap();
//! assert_eq!(history.len(), draws.len());
//!
//! let records = rolling_anomaly_scores(&draws, &[0.25; 4], 50).unwrap();
//! assert_eq!(records.len(), draws.len() - 50 + 1);
//! ```
//!
//! ## Architecture
//!
//! Drift simulator → bias series → bias law → draw simulator → draw stream
//! → {streaming estimators, anomaly diagnostics}
//!
//! The estimators and the diagnostics consume the draw stream
//! independently, producing parallel estimate/diagnostic series that can be
//! compared against the ground-truth bias series.
//!
//! Everything is single-threaded, synchronous, and allocation-light: value
//! types throughout, with estimator state the only mutable entity, owned
//! exclusively by its caller. Randomness always flows through an explicit
//! seedable generator built per call (never a process-global one), so
//! simulations with distinct seeds are independent and reproducible.

pub mod anomaly;
pub mod drift;
pub mod error;
pub mod estimator;
pub mod law;
pub mod sampling;

pub use anomaly::{
    AnomalyRecord, ChiSquare, chi_square_test, entropy_gap, outcome_correlation_matrix,
    rolling_anomaly_scores, shannon_entropy,
};
pub use drift::{DriftConfig, drift_series};
pub use error::{Error, Result};
pub use estimator::{BiasEstimator, EwmaEstimator, KalmanEstimator};
pub use law::{
    inverse_mass_probabilities, probabilities, probabilities_to_beta, weight_profile,
};
pub use sampling::{sample_fixed, sample_streaming};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
