//! Path-wise store of underlying factors and the regressions that use them.

use std::ops::Range;

use pricer_core::types::Date;

use crate::error::{ValuationError, ValuationResult};
use crate::parallel::split_ranges_mut;
use crate::regression::{fit, RegressionBasis, RegressionMethod};

/// Underlying factor realisations indexed by path, date and factor.
#[derive(Clone, Debug)]
pub struct SimulatedRegressors {
    dates: Vec<Date>,
    n_factors: usize,
    n_paths: usize,
    // (path * n_dates + date) * n_factors + factor
    values: Vec<f64>,
}

/// Exclusive view of a contiguous block of paths.
#[derive(Debug)]
pub struct RegressorBlock<'a> {
    paths: Range<usize>,
    n_dates: usize,
    n_factors: usize,
    values: &'a mut [f64],
}

impl RegressorBlock<'_> {
    /// Factor row of absolute path `path` at date index `date`.
    ///
    /// # Panics
    ///
    /// If `path` lies outside the block.
    pub fn row_mut(&mut self, path: usize, date: usize) -> &mut [f64] {
        let start = ((path - self.paths.start) * self.n_dates + date) * self.n_factors;
        &mut self.values[start..start + self.n_factors]
    }
}

impl SimulatedRegressors {
    /// Zeroed store. `dates` must be sorted and free of duplicates.
    pub fn new(dates: Vec<Date>, n_factors: usize, n_paths: usize) -> Self {
        let values = vec![0.0; dates.len() * n_factors * n_paths];
        Self {
            dates,
            n_factors,
            n_paths,
            values,
        }
    }

    /// Dates at which factors are stored.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Position of `date` in [`dates`](Self::dates).
    pub fn date_index(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Total factor count across all simulators.
    pub fn n_factors(&self) -> usize {
        self.n_factors
    }

    /// Number of paths.
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Stores one factor value.
    pub fn add(&mut self, path: usize, date: usize, factor: usize, value: f64) {
        let n_dates = self.dates.len();
        self.values[(path * n_dates + date) * self.n_factors + factor] = value;
    }

    /// Factor value on `path` at date index `date`.
    pub fn get(&self, path: usize, date: usize, factor: usize) -> f64 {
        self.values[(path * self.dates.len() + date) * self.n_factors + factor]
    }

    /// Disjoint mutable blocks, one per range. Ranges must tile `0..n_paths`
    /// from 0 upward.
    pub fn blocks_mut(&mut self, ranges: &[Range<usize>]) -> Vec<RegressorBlock<'_>> {
        let n_dates = self.dates.len();
        let n_factors = self.n_factors;
        split_ranges_mut(&mut self.values, n_dates * n_factors, ranges)
            .into_iter()
            .zip(ranges)
            .map(|(values, range)| RegressorBlock {
                paths: range.clone(),
                n_dates,
                n_factors,
                values,
            })
            .collect()
    }

    /// Cross-section of every factor at date index `date`, as `[factor][path]`.
    pub fn cross_section(&self, date: usize) -> Vec<Vec<f64>> {
        (0..self.n_factors)
            .map(|f| (0..self.n_paths).map(|p| self.get(p, date, f)).collect())
            .collect()
    }

    /// Regresses `target` (one value per path) on the factors at date index
    /// `date` and returns the fitted values.
    pub fn fit_at(
        &self,
        date: usize,
        target: &[f64],
        basis: RegressionBasis,
        method: RegressionMethod,
    ) -> ValuationResult<Vec<f64>> {
        let design = basis.design_matrix(&self.cross_section(date), self.n_paths);
        fit(&design, target, method).map_err(|source| ValuationError::Regression {
            date: self.dates[date],
            source,
        })
    }

    /// Realisations of factor `factor` at `dates`, as `[path][date]`.
    ///
    /// Dates not held by the store yield `NaN`.
    pub fn factor_paths(&self, factor: usize, dates: &[Date]) -> Vec<Vec<f64>> {
        let columns: Vec<Option<usize>> = dates.iter().map(|&d| self.date_index(d)).collect();
        (0..self.n_paths)
            .map(|path| {
                columns
                    .iter()
                    .map(|col| col.map_or(f64::NAN, |c| self.get(path, c, factor)))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegressionError;
    use crate::parallel::partition;
    use approx::assert_relative_eq;

    fn dates() -> Vec<Date> {
        vec![
            Date::from_ymd(2025, 6, 1).unwrap(),
            Date::from_ymd(2026, 1, 1).unwrap(),
        ]
    }

    #[test]
    fn test_blocks_and_lookup_agree() {
        let mut store = SimulatedRegressors::new(dates(), 2, 5);
        let ranges = partition(5, 2);
        for (range, mut block) in ranges.iter().zip(store.blocks_mut(&ranges)) {
            for path in range.clone() {
                for d in 0..2 {
                    let row = block.row_mut(path, d);
                    row[0] = path as f64;
                    row[1] = d as f64 + 10.0;
                }
            }
        }
        assert_relative_eq!(store.get(3, 1, 0), 3.0);
        assert_relative_eq!(store.get(4, 0, 1), 10.0);
        assert_eq!(store.cross_section(1)[1], vec![11.0; 5]);
    }

    #[test]
    fn test_factor_paths_layout() {
        let mut store = SimulatedRegressors::new(dates(), 1, 3);
        for path in 0..3 {
            store.add(path, 0, 0, path as f64);
            store.add(path, 1, 0, 2.0 * path as f64);
        }
        let d = dates();
        let paths = store.factor_paths(0, &[d[1], d[0]]);
        assert_eq!(paths, vec![vec![0.0, 0.0], vec![2.0, 1.0], vec![4.0, 2.0]]);
    }

    #[test]
    fn test_fit_at_recovers_linear_target() {
        let mut store = SimulatedRegressors::new(dates(), 1, 30);
        let mut target = Vec::new();
        for path in 0..30 {
            let x = path as f64 * 0.5;
            store.add(path, 1, 0, x);
            target.push(3.0 + 2.0 * x);
        }
        let fitted = store
            .fit_at(1, &target, RegressionBasis::Polynomial { order: 1 }, RegressionMethod::Svd)
            .unwrap();
        for (f, t) in fitted.iter().zip(&target) {
            assert_relative_eq!(*f, *t, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fit_at_reports_date() {
        let store = SimulatedRegressors::new(dates(), 1, 3);
        let err = store
            .fit_at(0, &[1.0, f64::INFINITY, 0.0], RegressionBasis::default(), RegressionMethod::Svd)
            .unwrap_err();
        match err {
            ValuationError::Regression { date, source } => {
                assert_eq!(date, dates()[0]);
                assert_eq!(source, RegressionError::NonFiniteTarget { path: 1 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
