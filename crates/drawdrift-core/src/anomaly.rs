//! Anomaly diagnostics for observed draw streams.
//!
//! Chi-square goodness-of-fit, Shannon entropy gap, stride-1 rolling window
//! diagnostics, and the outcome correlation matrix. All inputs are
//! validated before any statistic is computed.

use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{Error, Result};
use crate::law::DISTRIBUTION_TOLERANCE;

/// Correlations with a denominator below this are treated as zero-variance.
const VARIANCE_GUARD: f64 = 1e-10;

/// Chi-square goodness-of-fit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquare {
    /// The statistic `Σ (o_i - e_i)² / e_i`.
    pub statistic: f64,
    /// Upper-tail p-value at `len(observed) - 1` degrees of freedom.
    pub p_value: f64,
}

/// One rolling-window diagnostic row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Absolute index of the window's last draw.
    pub step: usize,
    /// Chi-square statistic for the window counts against the baseline.
    pub chi2_stat: f64,
    /// Upper-tail p-value for the statistic.
    pub chi2_pvalue: f64,
    /// Shannon entropy of the window minus the baseline entropy, in bits.
    pub entropy_gap: f64,
}

/// Chi-square goodness-of-fit test of observed against expected counts.
///
/// Degrees of freedom are `observed.len() - 1`.
///
/// # Errors
///
/// [`Error::LengthMismatch`] on shape mismatch; [`Error::InvalidInput`]
/// with fewer than two bins or any non-positive expected count.
pub fn chi_square_test(observed: &[f64], expected: &[f64]) -> Result<ChiSquare> {
    if observed.len() != expected.len() {
        return Err(Error::LengthMismatch {
            expected: expected.len(),
            got: observed.len(),
        });
    }
    if observed.len() < 2 {
        return Err(Error::InvalidInput("need at least two bins"));
    }
    if expected.iter().any(|&e| e <= 0.0) {
        return Err(Error::InvalidInput("expected counts must be positive"));
    }

    let statistic: f64 = observed
        .iter()
        .zip(expected)
        .map(|(o, e)| {
            let diff = o - e;
            diff * diff / e
        })
        .sum();

    let dof = (observed.len() - 1) as f64;
    let dist = ChiSquared::new(dof)
        .map_err(|_| Error::InvalidInput("degrees of freedom must be positive"))?;
    Ok(ChiSquare {
        statistic,
        p_value: dist.sf(statistic),
    })
}

/// Shannon entropy of a probability vector, in bits.
///
/// Zero components contribute zero rather than NaN.
///
/// # Errors
///
/// [`Error::InvalidInput`] unless every entry is non-negative and the
/// vector sums to 1 within `1e-9`.
pub fn shannon_entropy(probabilities: &[f64]) -> Result<f64> {
    validate_distribution(probabilities)?;
    Ok(probabilities
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum())
}

/// Entropy gap between an empirical distribution and a baseline:
/// `entropy(empirical) - entropy(baseline)` in bits. Negative means the
/// empirical distribution is more concentrated than the baseline.
///
/// # Errors
///
/// [`Error::LengthMismatch`] on shape mismatch; [`Error::InvalidInput`]
/// if either vector is not a distribution.
pub fn entropy_gap(empirical: &[f64], baseline: &[f64]) -> Result<f64> {
    if empirical.len() != baseline.len() {
        return Err(Error::LengthMismatch {
            expected: baseline.len(),
            got: empirical.len(),
        });
    }
    Ok(shannon_entropy(empirical)? - shannon_entropy(baseline)?)
}

/// Slide a fixed-size window across a draw sequence and score each window
/// against a baseline distribution.
///
/// Windows are `[0, w), [1, w+1), …`: one [`AnomalyRecord`] per window,
/// indexed by the window's last absolute step, giving
/// `draws.len() - window_size + 1` records. Counts are maintained
/// incrementally across the slide.
///
/// # Errors
///
/// [`Error::InvalidInput`] when `window_size <= 1`, the baseline is not a
/// strictly positive distribution, or the draw sequence is shorter than
/// one window; [`Error::DrawOutOfRange`] if any draw falls outside the
/// baseline's outcome range. All checks run before the scan starts.
pub fn rolling_anomaly_scores(
    draws: &[usize],
    baseline: &[f64],
    window_size: usize,
) -> Result<Vec<AnomalyRecord>> {
    if window_size <= 1 {
        return Err(Error::InvalidInput("window_size must be greater than 1"));
    }
    validate_distribution(baseline)?;
    if draws.len() < window_size {
        return Err(Error::InvalidInput(
            "draws must contain at least one full window",
        ));
    }

    let n_outcomes = baseline.len();
    if let Some(&bad) = draws.iter().find(|&&d| d >= n_outcomes) {
        return Err(Error::DrawOutOfRange {
            draw: bad,
            n_outcomes,
        });
    }

    let expected: Vec<f64> = baseline.iter().map(|p| p * window_size as f64).collect();
    // The chi-square contract needs strictly positive expected counts;
    // checking here keeps the scan all-or-nothing.
    if expected.iter().any(|&e| e <= 0.0) {
        return Err(Error::InvalidInput("expected counts must be positive"));
    }
    let baseline_entropy = shannon_entropy(baseline)?;

    let mut counts = vec![0.0f64; n_outcomes];
    for &draw in &draws[..window_size] {
        counts[draw] += 1.0;
    }

    let mut records = Vec::with_capacity(draws.len() - window_size + 1);
    let mut empirical = vec![0.0f64; n_outcomes];
    for start in 0..=draws.len() - window_size {
        if start > 0 {
            counts[draws[start - 1]] -= 1.0;
            counts[draws[start + window_size - 1]] += 1.0;
        }

        let chi = chi_square_test(&counts, &expected)?;
        for (slot, count) in empirical.iter_mut().zip(&counts) {
            *slot = count / window_size as f64;
        }
        let gap = shannon_entropy(&empirical)? - baseline_entropy;

        records.push(AnomalyRecord {
            step: start + window_size - 1,
            chi2_stat: chi.statistic,
            chi2_pvalue: chi.p_value,
            entropy_gap: gap,
        });
    }

    debug!(
        "rolling scan: {} windows of {}, {} below p=0.01",
        records.len(),
        window_size,
        records.iter().filter(|r| r.chi2_pvalue < 0.01).count()
    );
    Ok(records)
}

/// Pearson correlation matrix of the one-hot indicator columns of a draw
/// sequence.
///
/// Indicator columns are mutually exclusive, so the joint moment
/// `E[x_i·x_j]` is zero off the diagonal and the whole matrix follows from
/// the per-outcome frequencies. Zero-variance columns (an outcome drawn
/// never, or every time) get 0 in place of the undefined correlation,
/// including on the diagonal.
///
/// # Errors
///
/// [`Error::InvalidConfig`] if `n_outcomes < 2`; [`Error::InvalidInput`]
/// on an empty draw sequence; [`Error::DrawOutOfRange`] for draws outside
/// `[0, n_outcomes)`.
pub fn outcome_correlation_matrix(draws: &[usize], n_outcomes: usize) -> Result<Vec<Vec<f64>>> {
    if n_outcomes < 2 {
        return Err(Error::InvalidConfig("n_outcomes must be at least 2"));
    }
    if draws.is_empty() {
        return Err(Error::InvalidInput("draws cannot be empty"));
    }
    if let Some(&bad) = draws.iter().find(|&&d| d >= n_outcomes) {
        return Err(Error::DrawOutOfRange {
            draw: bad,
            n_outcomes,
        });
    }

    let total = draws.len() as f64;
    let mut frequency = vec![0.0f64; n_outcomes];
    for &draw in draws {
        frequency[draw] += 1.0 / total;
    }
    let variance: Vec<f64> = frequency.iter().map(|f| f * (1.0 - f)).collect();

    let mut matrix = vec![vec![0.0f64; n_outcomes]; n_outcomes];
    for i in 0..n_outcomes {
        for j in 0..n_outcomes {
            matrix[i][j] = if i == j {
                if variance[i] > VARIANCE_GUARD { 1.0 } else { 0.0 }
            } else {
                let denominator = (variance[i] * variance[j]).sqrt();
                if denominator > VARIANCE_GUARD {
                    -frequency[i] * frequency[j] / denominator
                } else {
                    0.0
                }
            };
        }
    }
    Ok(matrix)
}

/// Shared distribution check: non-negative entries summing to 1.
fn validate_distribution(probabilities: &[f64]) -> Result<()> {
    if probabilities.is_empty() {
        return Err(Error::InvalidInput("probabilities cannot be empty"));
    }
    if probabilities.iter().any(|&p| p < 0.0 || !p.is_finite()) {
        return Err(Error::InvalidInput("probabilities must be non-negative"));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(Error::InvalidInput("probabilities must sum to 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_square_detects_skew() {
        let observed = [60.0, 25.0, 15.0];
        let expected = [100.0 / 3.0; 3];
        let chi = chi_square_test(&observed, &expected).unwrap();
        assert!(chi.statistic > 0.0);
        assert!(chi.p_value < 0.05);
    }

    #[test]
    fn chi_square_near_one_for_perfect_fit() {
        let counts = [25.0, 25.0, 25.0, 25.0];
        let chi = chi_square_test(&counts, &counts).unwrap();
        assert!(chi.statistic.abs() < 1e-12);
        assert!((chi.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn chi_square_validates_input() {
        assert!(chi_square_test(&[1.0, 2.0], &[1.0]).is_err());
        assert!(chi_square_test(&[1.0], &[1.0]).is_err());
        assert!(chi_square_test(&[1.0, 2.0], &[0.0, 3.0]).is_err());
    }

    #[test]
    fn entropy_of_uniform_is_log2_n() {
        let h = shannon_entropy(&[0.25; 4]).unwrap();
        assert!((h - 2.0).abs() < 1e-12);
    }

    #[test]
    fn entropy_ignores_zero_components() {
        let h = shannon_entropy(&[0.5, 0.5, 0.0]).unwrap();
        assert!((h - 1.0).abs() < 1e-12);
        assert!(h.is_finite());
    }

    #[test]
    fn entropy_gap_signals_concentration() {
        let gap = entropy_gap(&[0.6, 0.3, 0.1], &[1.0 / 3.0; 3]).unwrap();
        assert!(gap < 0.0);
    }

    #[test]
    fn entropy_gap_validates_inputs() {
        assert!(entropy_gap(&[0.5, 0.5], &[0.4, 0.4]).is_err());
        assert!(entropy_gap(&[0.5, 0.5], &[0.5, 0.3, 0.2]).is_err());
    }

    #[test]
    fn rolling_scores_have_one_record_per_window() {
        let draws: Vec<usize> = (0..60).map(|i| i % 3).collect();
        let records = rolling_anomaly_scores(&draws, &[1.0 / 3.0; 3], 12).unwrap();
        assert_eq!(records.len(), 60 - 12 + 1);
        assert_eq!(records[0].step, 11);
        assert_eq!(records.last().unwrap().step, 59);
    }

    #[test]
    fn rolling_scores_flag_a_concentrated_window() {
        // First half round-robin, second half constant.
        let mut draws: Vec<usize> = (0..30).map(|i| i % 3).collect();
        draws.extend(std::iter::repeat_n(0usize, 30));
        let records = rolling_anomaly_scores(&draws, &[1.0 / 3.0; 3], 15).unwrap();
        let first = &records[0];
        let last = records.last().unwrap();
        assert!(first.chi2_pvalue > 0.5);
        assert!(last.chi2_pvalue < 0.01);
        assert!(last.entropy_gap < first.entropy_gap);
    }

    #[test]
    fn rolling_scores_match_a_fresh_count_of_the_last_window() {
        let draws = [0usize, 1, 2, 1, 0, 2, 2, 1, 0, 0, 1, 2];
        let window = 5;
        let baseline = [1.0 / 3.0; 3];
        let records = rolling_anomaly_scores(&draws, &baseline, window).unwrap();

        let tail = &draws[draws.len() - window..];
        let mut counts = [0.0f64; 3];
        for &d in tail {
            counts[d] += 1.0;
        }
        let expected: Vec<f64> = baseline.iter().map(|p| p * window as f64).collect();
        let chi = chi_square_test(&counts, &expected).unwrap();
        let last = records.last().unwrap();
        assert!((last.chi2_stat - chi.statistic).abs() < 1e-9);
    }

    #[test]
    fn rolling_scores_validate_input() {
        let draws = [0usize, 1, 2];
        let uniform = [1.0 / 3.0; 3];
        assert!(rolling_anomaly_scores(&draws, &uniform, 1).is_err());
        assert!(rolling_anomaly_scores(&draws, &uniform, 4).is_err());
        assert!(rolling_anomaly_scores(&draws, &[0.4, 0.4], 2).is_err());
        assert_eq!(
            rolling_anomaly_scores(&[0, 5, 1], &uniform, 2),
            Err(Error::DrawOutOfRange {
                draw: 5,
                n_outcomes: 3
            })
        );
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let draws = [0usize, 1, 2, 0, 1, 2, 0, 0, 1, 2];
        let matrix = outcome_correlation_matrix(&draws, 3).unwrap();
        for i in 0..3 {
            assert!((matrix[i][i] - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert!((matrix[i][j] - matrix[j][i]).abs() < 1e-12);
                assert!(matrix[i][j].abs() <= 1.0 + 1e-12);
            }
        }
        // Mutually exclusive indicators are negatively correlated.
        assert!(matrix[0][1] < 0.0);
    }

    #[test]
    fn correlation_matrix_zeroes_degenerate_columns() {
        // Outcome 2 never appears: its column has zero variance.
        let draws = [0usize, 1, 0, 1];
        let matrix = outcome_correlation_matrix(&draws, 3).unwrap();
        assert_eq!(matrix[2][2], 0.0);
        assert_eq!(matrix[0][2], 0.0);
        assert_eq!(matrix[2][0], 0.0);
        assert!((matrix[0][1] + 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_matrix_validates_input() {
        assert!(outcome_correlation_matrix(&[], 3).is_err());
        assert!(outcome_correlation_matrix(&[0, 1], 1).is_err());
        assert!(outcome_correlation_matrix(&[0, 7], 3).is_err());
    }

    #[test]
    fn anomaly_records_round_trip_through_json() {
        let record = AnomalyRecord {
            step: 49,
            chi2_stat: 3.5,
            chi2_pvalue: 0.17,
            entropy_gap: -0.04,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: AnomalyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
