//! Streaming bias estimators.
//!
//! Both estimators consume one draw at a time and emit the current β
//! estimate after each observation: strictly sequential, no look-ahead.
//! State is owned by the caller and mutated only after the observation has
//! been validated, so a failed call leaves the estimator untouched.
//!
//! Two recursions are provided:
//!
//! - [`EwmaEstimator`]: exponentially weighted average of one-hot indicator
//!   vectors in probability space.
//! - [`KalmanEstimator`]: independent per-outcome scalar Kalman filters in
//!   bias-coefficient space (not a joint filter; outcomes are filtered
//!   separately and re-centered afterwards).

use crate::error::{Error, Result};

/// Emitted β estimates are clipped to this magnitude.
const BIAS_CLIP: f64 = 0.99;

/// Floor applied to EWMA probability components before renormalization,
/// so accumulated floating error cannot drive a component to zero or below.
const PROBABILITY_FLOOR: f64 = 1e-12;

/// Default prior variance for a bias coefficient confined to (-1, 1).
const DEFAULT_PRIOR_VARIANCE: f64 = 0.25;

/// Capability shared by streaming estimators: consume one observation,
/// produce the current bias estimate.
pub trait BiasEstimator {
    /// Number of outcomes this estimator tracks.
    fn n_outcomes(&self) -> usize;

    /// Consume one observed draw and return the updated β estimate.
    ///
    /// # Errors
    ///
    /// [`Error::DrawOutOfRange`] if `draw >= n_outcomes()`; the state is
    /// not modified in that case.
    fn observe(&mut self, draw: usize) -> Result<Vec<f64>>;

    /// Current β estimate without consuming an observation.
    fn bias(&self) -> &[f64];

    /// Drive the estimator over a whole draw sequence, returning one β
    /// vector per observation, in input order.
    fn estimate_series(&mut self, draws: &[usize]) -> Result<Vec<Vec<f64>>> {
        let mut history = Vec::with_capacity(draws.len());
        for &draw in draws {
            history.push(self.observe(draw)?);
        }
        Ok(history)
    }
}

/// Re-center a β vector to zero mean and clip to `[-BIAS_CLIP, BIAS_CLIP]`.
fn canonicalize(beta: &mut [f64]) {
    let mean = beta.iter().sum::<f64>() / beta.len() as f64;
    for b in beta.iter_mut() {
        *b = (*b - mean).clamp(-BIAS_CLIP, BIAS_CLIP);
    }
}

/// Exponentially weighted moving-average estimator.
///
/// The canonical state is the probability vector; β is derived on demand
/// as `p·N − 1`, re-centered and clipped for emission. On each draw the
/// probability estimate moves toward the one-hot indicator:
/// `p ← (1−α)·p + α·one_hot`.
#[derive(Debug, Clone)]
pub struct EwmaEstimator {
    alpha: f64,
    probabilities: Vec<f64>,
    bias: Vec<f64>,
}

impl EwmaEstimator {
    /// Create an estimator starting from the uniform distribution.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `n_outcomes < 2` or `alpha` lies
    /// outside `(0, 1]`.
    pub fn new(n_outcomes: usize, alpha: f64) -> Result<Self> {
        if n_outcomes < 2 {
            return Err(Error::InvalidConfig("n_outcomes must be at least 2"));
        }
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::InvalidConfig("alpha must be in (0, 1]"));
        }
        Ok(Self {
            alpha,
            probabilities: vec![1.0 / n_outcomes as f64; n_outcomes],
            bias: vec![0.0; n_outcomes],
        })
    }

    /// Create an estimator starting from a caller-supplied distribution,
    /// renormalized to sum to 1.
    ///
    /// # Errors
    ///
    /// As [`EwmaEstimator::new`], plus [`Error::InvalidInput`] when the
    /// initial vector has negative entries or non-positive total mass.
    pub fn with_initial(initial: &[f64], alpha: f64) -> Result<Self> {
        let mut estimator = Self::new(initial.len(), alpha)?;
        if initial.iter().any(|&p| p < 0.0 || !p.is_finite()) {
            return Err(Error::InvalidInput("initial probabilities must be non-negative"));
        }
        let total: f64 = initial.iter().sum();
        if total <= 0.0 {
            return Err(Error::InvalidInput("initial probabilities must have positive mass"));
        }
        for (slot, p) in estimator.probabilities.iter_mut().zip(initial) {
            *slot = p / total;
        }
        estimator.refresh_bias();
        Ok(estimator)
    }

    /// Current probability-vector estimate.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    fn refresh_bias(&mut self) {
        let n = self.probabilities.len() as f64;
        for (b, p) in self.bias.iter_mut().zip(&self.probabilities) {
            *b = p * n - 1.0;
        }
        canonicalize(&mut self.bias);
    }
}

impl BiasEstimator for EwmaEstimator {
    fn n_outcomes(&self) -> usize {
        self.probabilities.len()
    }

    fn observe(&mut self, draw: usize) -> Result<Vec<f64>> {
        let n = self.probabilities.len();
        if draw >= n {
            return Err(Error::DrawOutOfRange {
                draw,
                n_outcomes: n,
            });
        }

        for (i, p) in self.probabilities.iter_mut().enumerate() {
            let indicator = if i == draw { 1.0 } else { 0.0 };
            *p = (1.0 - self.alpha) * *p + self.alpha * indicator;
        }
        for p in self.probabilities.iter_mut() {
            *p = p.max(PROBABILITY_FLOOR);
        }
        let total: f64 = self.probabilities.iter().sum();
        for p in self.probabilities.iter_mut() {
            *p /= total;
        }

        self.refresh_bias();
        Ok(self.bias.clone())
    }

    fn bias(&self) -> &[f64] {
        &self.bias
    }
}

/// Independent per-outcome scalar Kalman filter over bias coefficients.
///
/// Each observed draw becomes a measurement vector in β units: the observed
/// outcome reads `1 − 1/N`, every other outcome reads `−1/N` (the one-hot
/// deviation from uniform). Per outcome:
///
/// ```text
/// predict:  v ← v + process_var
/// gain:     k = v / (v + observation_var)
/// update:   x ← x + k·(z − x),  v ← (1 − k)·v
/// ```
#[derive(Debug, Clone)]
pub struct KalmanEstimator {
    process_var: f64,
    observation_var: f64,
    estimate: Vec<f64>,
    variance: Vec<f64>,
}

impl KalmanEstimator {
    /// Create a filter with zero initial estimate and prior variance 0.25.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `n_outcomes < 2` or either variance is
    /// not strictly positive.
    pub fn new(n_outcomes: usize, process_var: f64, observation_var: f64) -> Result<Self> {
        if n_outcomes < 2 {
            return Err(Error::InvalidConfig("n_outcomes must be at least 2"));
        }
        if process_var <= 0.0 || !process_var.is_finite() {
            return Err(Error::InvalidConfig("process_var must be positive"));
        }
        if observation_var <= 0.0 || !observation_var.is_finite() {
            return Err(Error::InvalidConfig("observation_var must be positive"));
        }
        Ok(Self {
            process_var,
            observation_var,
            estimate: vec![0.0; n_outcomes],
            variance: vec![DEFAULT_PRIOR_VARIANCE; n_outcomes],
        })
    }

    /// Create a filter with a caller-supplied initial β estimate.
    ///
    /// # Errors
    ///
    /// As [`KalmanEstimator::new`], plus [`Error::LengthMismatch`] when
    /// `initial.len() != n_outcomes`.
    pub fn with_state(
        n_outcomes: usize,
        initial: &[f64],
        process_var: f64,
        observation_var: f64,
    ) -> Result<Self> {
        let mut filter = Self::new(n_outcomes, process_var, observation_var)?;
        if initial.len() != n_outcomes {
            return Err(Error::LengthMismatch {
                expected: n_outcomes,
                got: initial.len(),
            });
        }
        filter.estimate.copy_from_slice(initial);
        Ok(filter)
    }

    /// Current per-outcome variance estimates.
    pub fn variance(&self) -> &[f64] {
        &self.variance
    }
}

impl BiasEstimator for KalmanEstimator {
    fn n_outcomes(&self) -> usize {
        self.estimate.len()
    }

    fn observe(&mut self, draw: usize) -> Result<Vec<f64>> {
        let n = self.estimate.len();
        if draw >= n {
            return Err(Error::DrawOutOfRange {
                draw,
                n_outcomes: n,
            });
        }

        let baseline = 1.0 / n as f64;
        for i in 0..n {
            let measurement = if i == draw { 1.0 - baseline } else { -baseline };

            self.variance[i] += self.process_var;
            let gain = self.variance[i] / (self.variance[i] + self.observation_var);
            self.estimate[i] += gain * (measurement - self.estimate[i]);
            self.variance[i] *= 1.0 - gain;
        }

        canonicalize(&mut self.estimate);
        Ok(self.estimate.clone())
    }

    fn bias(&self) -> &[f64] {
        &self.estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ewma_rejects_bad_hyperparameters() {
        assert!(EwmaEstimator::new(1, 0.1).is_err());
        assert!(EwmaEstimator::new(4, 0.0).is_err());
        assert!(EwmaEstimator::new(4, 1.5).is_err());
        assert!(EwmaEstimator::new(4, 1.0).is_ok());
    }

    #[test]
    fn ewma_history_matches_input_length_and_is_finite() {
        let draws = [0, 1, 1, 2, 2, 2];
        let mut estimator = EwmaEstimator::new(3, 0.2).unwrap();
        let history = estimator.estimate_series(&draws).unwrap();
        assert_eq!(history.len(), draws.len());
        assert!(history.iter().flatten().all(|b| b.is_finite()));
    }

    #[test]
    fn ewma_converges_under_constant_observation() {
        let mut estimator = EwmaEstimator::new(4, 0.1).unwrap();
        let mut last = f64::NEG_INFINITY;
        for _ in 0..400 {
            estimator.observe(2).unwrap();
            let p = estimator.probabilities()[2];
            assert!(p >= last - 1e-12, "probability should rise monotonically");
            last = p;
        }
        assert!(estimator.probabilities()[2] > 0.999);
        assert!(estimator.bias()[2] > 0.9);
    }

    #[test]
    fn ewma_rejects_out_of_range_draw_without_mutation() {
        let mut estimator = EwmaEstimator::new(3, 0.2).unwrap();
        estimator.observe(1).unwrap();
        let before = estimator.probabilities().to_vec();
        assert_eq!(
            estimator.observe(3),
            Err(Error::DrawOutOfRange {
                draw: 3,
                n_outcomes: 3
            })
        );
        assert_eq!(estimator.probabilities(), before.as_slice());
    }

    #[test]
    fn ewma_with_initial_renormalizes() {
        let estimator = EwmaEstimator::with_initial(&[2.0, 1.0, 1.0], 0.1).unwrap();
        let total: f64 = estimator.probabilities().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((estimator.probabilities()[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn kalman_rejects_bad_hyperparameters() {
        assert!(KalmanEstimator::new(1, 0.01, 0.1).is_err());
        assert!(KalmanEstimator::new(4, 0.0, 0.1).is_err());
        assert!(KalmanEstimator::new(4, 0.01, 0.0).is_err());
        assert_eq!(
            KalmanEstimator::with_state(4, &[0.0; 3], 0.01, 0.1).err(),
            Some(Error::LengthMismatch {
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn kalman_converges_under_constant_observation() {
        let mut filter = KalmanEstimator::new(4, 1e-4, 0.05).unwrap();
        for _ in 0..500 {
            filter.observe(0).unwrap();
        }
        let bias = filter.bias();
        assert!(bias[0] > 0.5, "observed outcome bias: {}", bias[0]);
        assert!(bias[1] < 0.0 && bias[2] < 0.0 && bias[3] < 0.0);
        assert!(bias.iter().all(|b| b.is_finite()));
    }

    #[test]
    fn kalman_variance_contracts_between_injections() {
        let mut filter = KalmanEstimator::new(3, 1e-6, 0.1).unwrap();
        let mut previous = filter.variance().to_vec();
        for step in 0..200 {
            filter.observe(step % 3).unwrap();
            let current = filter.variance().to_vec();
            for (p, c) in previous.iter().zip(&current) {
                // Post-update variance never exceeds the predicted variance,
                // and with tiny process noise it shrinks run over run.
                assert!(c <= &(p + 1e-6), "variance grew: {p} -> {c}");
            }
            previous = current;
        }
        assert!(filter.variance().iter().all(|&v| v < 0.01));
    }

    #[test]
    fn estimators_share_the_trait_seam() {
        let draws = [0, 0, 1, 0, 2, 0];
        let mut estimators: Vec<Box<dyn BiasEstimator>> = vec![
            Box::new(EwmaEstimator::new(3, 0.2).unwrap()),
            Box::new(KalmanEstimator::new(3, 1e-3, 0.1).unwrap()),
        ];
        for estimator in estimators.iter_mut() {
            let history = estimator.estimate_series(&draws).unwrap();
            assert_eq!(history.len(), draws.len());
            // Outcome 0 dominates the stream; both recursions should lean
            // its bias positive.
            assert!(history.last().unwrap()[0] > 0.0);
        }
    }
}
