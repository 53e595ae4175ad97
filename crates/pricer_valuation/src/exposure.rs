//! Exposure profiles from regressed forward values.
//!
//! Inputs are columns: `values[t][path]` holds the regressed portfolio value
//! at forward date `t` on each path.

use rayon::prelude::*;

use crate::regression::quantile_of_sorted;

/// Exposure calculation utilities.
pub struct ExposureCalculator;

impl ExposureCalculator {
    /// Expected positive exposure per forward date.
    ///
    /// EPE(t) = mean over paths of max(V(t), 0)
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_valuation::ExposureCalculator;
    ///
    /// let columns = vec![vec![10.0, 5.0, -5.0], vec![20.0, -10.0, 15.0]];
    /// let epe = ExposureCalculator::expected_positive_exposure(&columns);
    /// assert_eq!(epe, vec![5.0, 35.0 / 3.0]);
    /// ```
    pub fn expected_positive_exposure(columns: &[Vec<f64>]) -> Vec<f64> {
        columns
            .par_iter()
            .map(|column| {
                if column.is_empty() {
                    return 0.0;
                }
                column.iter().map(|v| v.max(0.0)).sum::<f64>() / column.len() as f64
            })
            .collect()
    }

    /// Potential future exposure: the empirical quantile of the regressed
    /// value at each percentile, as `[date][percentile]`.
    ///
    /// The quantile is taken of the signed value, so low percentiles
    /// describe exposure to the counterparty.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_valuation::ExposureCalculator;
    ///
    /// let columns = vec![vec![3.0, -1.0, 2.0, 0.0]];
    /// let pfe = ExposureCalculator::potential_future_exposure(&columns, &[0.25, 1.0]);
    /// assert_eq!(pfe, vec![vec![-1.0, 3.0]]);
    /// ```
    pub fn potential_future_exposure(columns: &[Vec<f64>], percentiles: &[f64]) -> Vec<Vec<f64>> {
        columns
            .par_iter()
            .map(|column| {
                let mut sorted = column.clone();
                sorted.sort_by(|a, b| a.total_cmp(b));
                percentiles
                    .iter()
                    .map(|&p| quantile_of_sorted(&sorted, p).unwrap_or(0.0))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_epe_ignores_negative_values() {
        let epe = ExposureCalculator::expected_positive_exposure(&[vec![-1.0, -2.0], vec![4.0, -4.0]]);
        assert_eq!(epe, vec![0.0, 2.0]);
    }

    #[test]
    fn test_pfe_is_monotone_in_percentile() {
        let column: Vec<f64> = (0..100).map(|i| ((i * 37) % 100) as f64 - 50.0).collect();
        let pfe = ExposureCalculator::potential_future_exposure(&[column], &[0.05, 0.5, 0.95]);
        assert!(pfe[0][0] <= pfe[0][1] && pfe[0][1] <= pfe[0][2]);
        assert_relative_eq!(pfe[0][2], 44.0);
    }
}
