//! Path-wise store of deflated cashflows.

use std::ops::Range;

use pricer_core::types::{Cashflow, Date};

use crate::parallel::split_ranges_mut;

/// Deflated cashflows per product slot and path.
///
/// Amounts are already in valuation units (converted to the numeraire
/// currency and divided by the numeraire ratio), so path-wise present values
/// are plain sums.
#[derive(Clone, Debug)]
pub struct SimulatedCashflows {
    n_products: usize,
    n_paths: usize,
    // path-major: path * n_products + product
    cells: Vec<Vec<Cashflow>>,
}

/// Exclusive view of a contiguous block of paths.
#[derive(Debug)]
pub struct CashflowBlock<'a> {
    paths: Range<usize>,
    n_products: usize,
    cells: &'a mut [Vec<Cashflow>],
}

impl CashflowBlock<'_> {
    /// Paths covered by this block.
    pub fn paths(&self) -> Range<usize> {
        self.paths.clone()
    }

    /// Replaces the cashflows of `product` on absolute path `path`.
    ///
    /// # Panics
    ///
    /// If `path` lies outside the block.
    pub fn set(&mut self, product: usize, path: usize, cashflows: Vec<Cashflow>) {
        let local = path - self.paths.start;
        self.cells[local * self.n_products + product] = cashflows;
    }
}

impl SimulatedCashflows {
    /// Empty store for `n_products` slots and `n_paths` paths.
    pub fn new(n_products: usize, n_paths: usize) -> Self {
        Self {
            n_products,
            n_paths,
            cells: vec![Vec::new(); n_products * n_paths],
        }
    }

    /// Number of product slots.
    pub fn n_products(&self) -> usize {
        self.n_products
    }

    /// Number of paths.
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Appends a cashflow for `product` on `path`.
    pub fn add(&mut self, product: usize, path: usize, cashflow: Cashflow) {
        self.cells[path * self.n_products + product].push(cashflow);
    }

    /// Cashflows of `product` on `path`.
    pub fn cashflows(&self, product: usize, path: usize) -> &[Cashflow] {
        &self.cells[path * self.n_products + product]
    }

    /// Disjoint mutable blocks, one per range. Ranges must tile `0..n_paths`
    /// from 0 upward.
    pub fn blocks_mut(&mut self, ranges: &[Range<usize>]) -> Vec<CashflowBlock<'_>> {
        let n_products = self.n_products;
        split_ranges_mut(&mut self.cells, n_products, ranges)
            .into_iter()
            .zip(ranges)
            .map(|(cells, range)| CashflowBlock {
                paths: range.clone(),
                n_products,
                cells,
            })
            .collect()
    }

    /// Sum over `products` of the cashflows strictly after `after` on `path`.
    pub fn path_pv(&self, path: usize, after: Date, products: &[usize]) -> f64 {
        products
            .iter()
            .flat_map(|&p| self.cashflows(p, path))
            .filter(|cf| cf.date > after)
            .map(|cf| cf.amount)
            .sum()
    }

    /// [`path_pv`](Self::path_pv) on every path.
    pub fn pathwise_pv(&self, after: Date, products: &[usize]) -> Vec<f64> {
        (0..self.n_paths)
            .map(|path| self.path_pv(path, after, products))
            .collect()
    }

    /// Replaces every path's cashflows for `product`.
    ///
    /// # Panics
    ///
    /// If `per_path` does not have one entry per path.
    pub fn update(&mut self, product: usize, per_path: Vec<Vec<Cashflow>>) {
        assert_eq!(
            per_path.len(),
            self.n_paths,
            "cashflow update must cover every path"
        );
        for (path, cashflows) in per_path.into_iter().enumerate() {
            self.cells[path * self.n_products + product] = cashflows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::partition;
    use approx::assert_relative_eq;
    use pricer_core::types::Currency;
    use proptest::prelude::*;

    fn date(day: u32) -> Date {
        Date::from_ymd(2025, 1, day).unwrap()
    }

    fn cf(day: u32, amount: f64) -> Cashflow {
        Cashflow::new(date(day), amount, Currency::ZAR)
    }

    #[test]
    fn test_pv_is_strictly_after() {
        let mut store = SimulatedCashflows::new(2, 1);
        store.add(0, 0, cf(5, 1.0));
        store.add(0, 0, cf(10, 2.0));
        store.add(1, 0, cf(10, 4.0));
        assert_relative_eq!(store.path_pv(0, date(5), &[0, 1]), 6.0);
        assert_relative_eq!(store.path_pv(0, date(4), &[0]), 3.0);
        assert_relative_eq!(store.path_pv(0, date(10), &[0, 1]), 0.0);
    }

    #[test]
    fn test_update_replaces_one_product() {
        let mut store = SimulatedCashflows::new(2, 2);
        store.add(0, 0, cf(3, 1.0));
        store.add(1, 1, cf(3, 7.0));
        store.update(0, vec![vec![cf(4, 5.0)], Vec::new()]);
        assert_eq!(store.cashflows(0, 0), &[cf(4, 5.0)]);
        assert!(store.cashflows(0, 1).is_empty());
        assert_eq!(store.cashflows(1, 1), &[cf(3, 7.0)]);
    }

    #[test]
    fn test_blocks_write_absolute_paths() {
        let mut store = SimulatedCashflows::new(3, 7);
        let ranges = partition(7, 3);
        for mut block in store.blocks_mut(&ranges) {
            for path in block.paths() {
                block.set(2, path, vec![cf(9, path as f64)]);
            }
        }
        for path in 0..7 {
            assert_eq!(store.cashflows(2, path), &[cf(9, path as f64)]);
            assert!(store.cashflows(0, path).is_empty());
        }
    }

    proptest! {
        #[test]
        fn test_portfolio_pv_is_sum_of_product_pvs(
            amounts in proptest::collection::vec((0usize..3, 1u32..28, -100.0f64..100.0), 0..40),
            cutoff in 1u32..28,
        ) {
            let mut store = SimulatedCashflows::new(3, 1);
            for (product, day, amount) in amounts {
                store.add(product, 0, cf(day, amount));
            }
            let whole = store.path_pv(0, date(cutoff), &[0, 1, 2]);
            let parts: f64 = (0..3).map(|p| store.path_pv(0, date(cutoff), &[p])).sum();
            prop_assert!((whole - parts).abs() < 1e-9);
        }
    }
}
