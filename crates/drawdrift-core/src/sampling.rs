//! Categorical draw simulators.
//!
//! Both entry points build their own generator from an explicit optional
//! seed. There is no process-global generator, so concurrent simulations
//! with distinct seeds are mutually independent and reproducible.

use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;

use crate::error::{Error, Result};
use crate::law::{DISTRIBUTION_TOLERANCE, probabilities};

/// Build a generator from an optional seed. `None` pulls OS entropy and is
/// non-reproducible by design.
pub(crate) fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draw `n_trials` i.i.d. samples from a fixed probability vector.
///
/// A positive non-unit sum is silently renormalized; negative entries and a
/// non-positive total are rejected.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `n_trials == 0`, the vector is empty,
/// any entry is negative, or the total mass is not positive.
pub fn sample_fixed(
    probabilities: &[f64],
    n_trials: usize,
    seed: Option<u64>,
) -> Result<Vec<usize>> {
    if n_trials == 0 {
        return Err(Error::InvalidInput("n_trials must be positive"));
    }
    if probabilities.is_empty() {
        return Err(Error::InvalidInput("probabilities cannot be empty"));
    }
    if probabilities.iter().any(|&p| p < 0.0 || !p.is_finite()) {
        return Err(Error::InvalidInput("probabilities must be non-negative"));
    }
    let total: f64 = probabilities.iter().sum();
    if total <= 0.0 {
        return Err(Error::InvalidInput("probabilities must have positive mass"));
    }

    let normalized: Vec<f64> = if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        probabilities.iter().map(|p| p / total).collect()
    } else {
        probabilities.to_vec()
    };

    let dist = WeightedIndex::new(&normalized)
        .map_err(|_| Error::InvalidInput("probabilities must have positive mass"))?;
    let mut rng = rng_from_seed(seed);
    Ok((0..n_trials).map(|_| dist.sample(&mut rng)).collect())
}

/// Draw one sample per time step from a series of bias vectors.
///
/// Step `t` samples from `probabilities(n_outcomes, bias_series[t])`. A
/// single generator advances across the whole series, so given a seed the
/// output is a deterministic function of the full history.
///
/// # Errors
///
/// [`Error::InvalidInput`] on an empty series; [`Error::LengthMismatch`]
/// on ragged rows; [`Error::DegenerateMass`] if any row collapses the
/// probability mass.
pub fn sample_streaming(bias_series: &[Vec<f64>], seed: Option<u64>) -> Result<Vec<usize>> {
    let n_outcomes = match bias_series.first() {
        Some(row) => row.len(),
        None => return Err(Error::InvalidInput("bias series cannot be empty")),
    };

    let mut rng = rng_from_seed(seed);
    let mut draws = Vec::with_capacity(bias_series.len());
    for beta in bias_series {
        let probs = probabilities(n_outcomes, beta)?;
        let dist = WeightedIndex::new(&probs).map_err(|_| Error::DegenerateMass)?;
        draws.push(dist.sample(&mut rng));
    }
    Ok(draws)
}
