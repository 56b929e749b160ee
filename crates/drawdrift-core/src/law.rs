//! The multiplicative bias law and baseline distribution helpers.
//!
//! The law maps a bias vector β over N outcomes to a probability vector:
//! each outcome starts from the uniform mass `1/N`, is scaled by `1 + β_i`,
//! and the result is renormalized. β_i is therefore the fractional deviation
//! of outcome i from uniform; β = 0 recovers the uniform distribution.
//!
//! This module is the single place the β ↔ p transform lives. Simulators and
//! estimators go through [`probabilities`] rather than carrying their own
//! copy of the algebra.

use crate::error::{Error, Result};

/// Tolerance for "sums to 1" checks on probability vectors.
pub(crate) const DISTRIBUTION_TOLERANCE: f64 = 1e-9;

/// Map bias coefficients to a normalized probability vector.
///
/// `adjusted_i = (1 + beta_i) / n_outcomes`, renormalized to sum to 1.
/// The output always sums to 1 within `1e-9` and every entry is `>= 0`.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] if `n_outcomes < 2`.
/// - [`Error::LengthMismatch`] if `beta.len() != n_outcomes`.
/// - [`Error::DegenerateMass`] if any adjusted mass is negative or the
///   total adjusted mass is not positive.
pub fn probabilities(n_outcomes: usize, beta: &[f64]) -> Result<Vec<f64>> {
    if n_outcomes < 2 {
        return Err(Error::InvalidConfig("n_outcomes must be at least 2"));
    }
    if beta.len() != n_outcomes {
        return Err(Error::LengthMismatch {
            expected: n_outcomes,
            got: beta.len(),
        });
    }

    let base = 1.0 / n_outcomes as f64;
    let adjusted: Vec<f64> = beta.iter().map(|b| base * (1.0 + b)).collect();

    if adjusted.iter().any(|&a| a < 0.0) {
        return Err(Error::DegenerateMass);
    }
    let total: f64 = adjusted.iter().sum();
    if total <= 0.0 {
        return Err(Error::DegenerateMass);
    }

    // Skip the division when the mass is already unit; the adjusted values
    // are exact in that case and renormalizing only adds rounding.
    if (total - 1.0).abs() <= DISTRIBUTION_TOLERANCE {
        return Ok(adjusted);
    }
    Ok(adjusted.iter().map(|a| a / total).collect())
}

/// Map a probability vector back to bias coefficients under the same law:
/// `beta_i = p_i / (1/N) - 1`.
///
/// # Errors
///
/// [`Error::InvalidInput`] if the vector is empty, contains negative
/// entries, or does not sum to 1 within tolerance.
pub fn probabilities_to_beta(probabilities: &[f64]) -> Result<Vec<f64>> {
    if probabilities.is_empty() {
        return Err(Error::InvalidInput("probabilities cannot be empty"));
    }
    if probabilities.iter().any(|&p| p < 0.0) {
        return Err(Error::InvalidInput("probabilities must be non-negative"));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(Error::InvalidInput("probabilities must sum to 1"));
    }

    let baseline = 1.0 / probabilities.len() as f64;
    Ok(probabilities.iter().map(|p| p / baseline - 1.0).collect())
}

/// Convert outcome weights into a baseline probability distribution where
/// heavier outcomes are selected less often: `p_i ∝ w_i^(-softness)`.
///
/// `softness` controls how quickly probability mass decreases with weight;
/// 1.0 is plain inverse proportionality.
///
/// # Errors
///
/// [`Error::InvalidInput`] for an empty or non-positive weight vector;
/// [`Error::InvalidConfig`] for non-positive `softness`.
pub fn inverse_mass_probabilities(weights: &[f64], softness: f64) -> Result<Vec<f64>> {
    if weights.is_empty() {
        return Err(Error::InvalidInput("weights cannot be empty"));
    }
    if weights.iter().any(|&w| w <= 0.0) {
        return Err(Error::InvalidInput("weights must be strictly positive"));
    }
    if softness <= 0.0 || !softness.is_finite() {
        return Err(Error::InvalidConfig("softness must be positive"));
    }

    let inverse_mass: Vec<f64> = weights.iter().map(|w| w.powf(-softness)).collect();
    let total: f64 = inverse_mass.iter().sum();
    Ok(inverse_mass.iter().map(|m| m / total).collect())
}

/// Default weight profile: a linear ramp from `1.0` up to `heaviness`.
///
/// # Errors
///
/// [`Error::InvalidConfig`] if `n_outcomes < 2` or `heaviness` is not
/// positive.
pub fn weight_profile(n_outcomes: usize, heaviness: f64) -> Result<Vec<f64>> {
    if n_outcomes < 2 {
        return Err(Error::InvalidConfig("n_outcomes must be at least 2"));
    }
    if heaviness <= 0.0 || !heaviness.is_finite() {
        return Err(Error::InvalidConfig("heaviness must be positive"));
    }

    let step = (heaviness - 1.0) / (n_outcomes - 1) as f64;
    Ok((0..n_outcomes).map(|i| 1.0 + step * i as f64).collect())
}
