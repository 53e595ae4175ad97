//! Cross-sectional regression: basis functions and least squares.
//!
//! Forward values and continuation values are estimated by regressing a
//! path-wise target onto functions of the underlying factors observed at a
//! single date. The basis is a pluggable strategy:
//!
//! - [`RegressionBasis::Intrinsic`]: per factor, strikes at the empirical
//!   quantiles `i/k` (`i = 1..k-1`) of the factor's cross-section, a put
//!   `(K_1 - x)+` and calls `(x - K_i)+`, plus one intercept column
//! - [`RegressionBasis::Polynomial`]: per factor `x, x^2, ..., x^order`, plus
//!   one intercept column
//!
//! The default solver is SVD least squares with singular values below
//! `max(n, m) * eps * sigma_max` discarded, so collinear columns (for
//! instance a constant factor next to the intercept) are handled.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, RegressionError};

/// Basis functions applied to the factor cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegressionBasis {
    /// Piecewise-linear option payoffs at `buckets` equal-probability strikes.
    Intrinsic {
        /// Number of equal-probability buckets (at least 2)
        buckets: usize,
    },
    /// Monomials up to `order`.
    Polynomial {
        /// Highest power (at least 1)
        order: usize,
    },
}

impl Default for RegressionBasis {
    fn default() -> Self {
        RegressionBasis::Intrinsic { buckets: 10 }
    }
}

impl RegressionBasis {
    /// Checks the basis parameters.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            RegressionBasis::Intrinsic { buckets } if buckets < 2 => Err(
                ConfigurationError::InvalidBasis(format!("intrinsic basis needs at least 2 buckets, got {buckets}")),
            ),
            RegressionBasis::Polynomial { order } if order < 1 => Err(
                ConfigurationError::InvalidBasis("polynomial basis needs order of at least 1".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Number of design matrix columns for `n_factors` factors.
    pub fn n_columns(&self, n_factors: usize) -> usize {
        let per_factor = match *self {
            RegressionBasis::Intrinsic { buckets } => buckets,
            RegressionBasis::Polynomial { order } => order,
        };
        1 + n_factors * per_factor
    }

    /// Builds the design matrix.
    ///
    /// `factors[j]` holds factor `j` on every path; all columns must have
    /// `n_rows` entries.
    pub fn design_matrix(&self, factors: &[Vec<f64>], n_rows: usize) -> DMatrix<f64> {
        let mut design = DMatrix::zeros(n_rows, self.n_columns(factors.len()));
        design.column_mut(0).fill(1.0);

        match *self {
            RegressionBasis::Intrinsic { buckets } => {
                for (j, x) in factors.iter().enumerate() {
                    let strikes = quantile_strikes(x, buckets);
                    let first = 1 + j * buckets;
                    for (row, &xi) in x.iter().enumerate().take(n_rows) {
                        design[(row, first)] = (strikes[0] - xi).max(0.0);
                        for (i, &strike) in strikes.iter().enumerate() {
                            design[(row, first + 1 + i)] = (xi - strike).max(0.0);
                        }
                    }
                }
            }
            RegressionBasis::Polynomial { order } => {
                for (j, x) in factors.iter().enumerate() {
                    let first = 1 + j * order;
                    for (row, &xi) in x.iter().enumerate().take(n_rows) {
                        let mut power = 1.0;
                        for p in 0..order {
                            power *= xi;
                            design[(row, first + p)] = power;
                        }
                    }
                }
            }
        }
        design
    }
}

/// Least-squares solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionMethod {
    /// Truncated SVD of the design matrix; tolerant of collinear columns.
    #[default]
    Svd,
    /// Cholesky factorisation of the normal equations; fails on rank deficiency.
    NormalEquations,
}

/// Fits `target ~ design` and returns the fitted values.
///
/// # Errors
///
/// - `RegressionError::DimensionMismatch` if the lengths disagree
/// - `RegressionError::NonFiniteTarget` / `NonFiniteDesign` for NaN or infinity
/// - `RegressionError::SvdFailed` / `SingularDesign` if the solve fails
pub fn fit(
    design: &DMatrix<f64>,
    target: &[f64],
    method: RegressionMethod,
) -> Result<Vec<f64>, RegressionError> {
    let (n, m) = design.shape();
    if n != target.len() {
        return Err(RegressionError::DimensionMismatch {
            rows: n,
            targets: target.len(),
        });
    }
    if let Some(path) = target.iter().position(|v| !v.is_finite()) {
        return Err(RegressionError::NonFiniteTarget { path });
    }
    if design.iter().any(|v| !v.is_finite()) {
        return Err(RegressionError::NonFiniteDesign);
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let y = DVector::from_column_slice(target);
    let beta = match method {
        RegressionMethod::Svd => {
            let svd = design.clone().svd(true, true);
            let sv_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
            let threshold = n.max(m) as f64 * f64::EPSILON * sv_max;
            svd.solve(&y, threshold)
                .map_err(|e| RegressionError::SvdFailed(e.to_string()))?
        }
        RegressionMethod::NormalEquations => {
            let normal = design.tr_mul(design);
            let rhs = design.tr_mul(&y);
            let cholesky = normal
                .cholesky()
                .ok_or(RegressionError::SingularDesign { columns: m })?;
            cholesky.solve(&rhs)
        }
    };

    let fitted = design * beta;
    Ok(fitted.iter().copied().collect())
}

/// Empirical quantile: the smallest sample `x` with `F(x) >= p`.
///
/// Returns `None` for an empty sample. `p` is clamped to `[0, 1]`.
///
/// ```
/// use pricer_valuation::regression::empirical_quantile;
///
/// let sample = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(empirical_quantile(&sample, 0.5), Some(2.0));
/// assert_eq!(empirical_quantile(&sample, 0.51), Some(3.0));
/// assert_eq!(empirical_quantile(&sample, 1.0), Some(4.0));
/// ```
pub fn empirical_quantile(sample: &[f64], p: f64) -> Option<f64> {
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile_of_sorted(&sorted, p)
}

/// [`empirical_quantile`] on an already sorted sample.
pub fn quantile_of_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    let p = p.clamp(0.0, 1.0);
    // Absorb rounding in p * n so that 0.3 * 10 maps to rank 3, not 4.
    let rank = (p * n as f64 - 1e-9).ceil().max(1.0) as usize;
    Some(sorted[rank.min(n) - 1])
}

fn quantile_strikes(x: &[f64], buckets: usize) -> Vec<f64> {
    let mut sorted = x.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    (1..buckets)
        .map(|i| quantile_of_sorted(&sorted, i as f64 / buckets as f64).unwrap_or(0.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_polynomial_recovers_exact_quadratic() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 - 2.0 * v + 0.25 * v * v).collect();
        let basis = RegressionBasis::Polynomial { order: 2 };
        let design = basis.design_matrix(&[x.clone()], x.len());
        let fitted = fit(&design, &y, RegressionMethod::Svd).unwrap();
        for (f, t) in fitted.iter().zip(&y) {
            assert_relative_eq!(*f, *t, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_normal_equations_agree_with_svd_on_full_rank() {
        let x: Vec<f64> = (0..40).map(|i| (i as f64).sin() + i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 1.3).cos()).collect();
        let basis = RegressionBasis::Polynomial { order: 3 };
        let design = basis.design_matrix(&[x.clone()], x.len());
        let svd = fit(&design, &y, RegressionMethod::Svd).unwrap();
        let normal = fit(&design, &y, RegressionMethod::NormalEquations).unwrap();
        for (a, b) in svd.iter().zip(&normal) {
            assert_relative_eq!(*a, *b, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_constant_factor_handled_by_svd() {
        let x = vec![1.0; 25];
        let y: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let basis = RegressionBasis::default();
        let design = basis.design_matrix(&[x], 25);
        let fitted = fit(&design, &y, RegressionMethod::Svd).unwrap();
        for f in fitted {
            assert_relative_eq!(f, 12.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_constant_factor_singular_for_normal_equations() {
        let x = vec![1.0; 25];
        let y: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let basis = RegressionBasis::Polynomial { order: 1 };
        let design = basis.design_matrix(&[x], 25);
        assert!(matches!(
            fit(&design, &y, RegressionMethod::NormalEquations),
            Err(RegressionError::SingularDesign { columns: 2 })
        ));
    }

    #[test]
    fn test_non_finite_target_rejected() {
        let basis = RegressionBasis::Polynomial { order: 1 };
        let design = basis.design_matrix(&[vec![1.0, 2.0, 3.0]], 3);
        assert_eq!(
            fit(&design, &[1.0, f64::NAN, 2.0], RegressionMethod::Svd),
            Err(RegressionError::NonFiniteTarget { path: 1 })
        );
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let basis = RegressionBasis::Polynomial { order: 1 };
        let design = basis.design_matrix(&[vec![1.0, 2.0, 3.0]], 3);
        assert!(matches!(
            fit(&design, &[1.0, 2.0], RegressionMethod::Svd),
            Err(RegressionError::DimensionMismatch { rows: 3, targets: 2 })
        ));
    }

    #[test]
    fn test_intrinsic_design_layout() {
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let basis = RegressionBasis::Intrinsic { buckets: 2 };
        let design = basis.design_matrix(&[x], 10);
        assert_eq!(design.ncols(), 3);
        // One strike at the median (5.0).
        assert_relative_eq!(design[(0, 1)], 4.0);
        assert_relative_eq!(design[(0, 2)], 0.0);
        assert_relative_eq!(design[(9, 1)], 0.0);
        assert_relative_eq!(design[(9, 2)], 5.0);
    }

    #[test]
    fn test_no_factors_fits_mean() {
        let basis = RegressionBasis::default();
        let design = basis.design_matrix(&[], 4);
        let fitted = fit(&design, &[1.0, 2.0, 3.0, 6.0], RegressionMethod::Svd).unwrap();
        for f in fitted {
            assert_relative_eq!(f, 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_invalid_basis() {
        assert!(RegressionBasis::Intrinsic { buckets: 1 }.validate().is_err());
        assert!(RegressionBasis::Polynomial { order: 0 }.validate().is_err());
        assert!(RegressionBasis::Polynomial { order: 3 }.validate().is_ok());
    }

    #[test]
    fn test_quantile_rounding() {
        let sample: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(empirical_quantile(&sample, 0.3), Some(3.0));
        assert_eq!(empirical_quantile(&sample, 0.0), Some(1.0));
        assert_eq!(empirical_quantile(&[], 0.5), None);
    }

    proptest! {
        #[test]
        fn test_quantile_is_sample_member_and_monotone(
            sample in proptest::collection::vec(-1e6f64..1e6, 1..200),
            p in 0.0f64..1.0,
            q in 0.0f64..1.0,
        ) {
            let a = empirical_quantile(&sample, p.min(q)).unwrap();
            let b = empirical_quantile(&sample, p.max(q)).unwrap();
            prop_assert!(sample.contains(&a));
            prop_assert!(a <= b);
        }

        #[test]
        fn test_fitted_mean_equals_target_mean(
            pairs in proptest::collection::vec((-10.0f64..10.0, -100.0f64..100.0), 12..80),
        ) {
            let (x, y): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let basis = RegressionBasis::Polynomial { order: 2 };
            let design = basis.design_matrix(&[x], y.len());
            let fitted = fit(&design, &y, RegressionMethod::Svd).unwrap();
            let n = y.len() as f64;
            let mean_fit: f64 = fitted.iter().sum::<f64>() / n;
            let mean_y: f64 = y.iter().sum::<f64>() / n;
            prop_assert!((mean_fit - mean_y).abs() < 1e-6 * (1.0 + mean_y.abs()));
        }
    }
}
