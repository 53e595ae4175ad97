//! Dates registered with a simulator before preparation.

use std::collections::{BTreeMap, BTreeSet};

use pricer_core::types::{Date, MarketObservable};

/// Registered query dates, per observable plus numeraire and factor dates.
///
/// Registrations accumulate until [`Calendar::clear`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Calendar {
    indices: BTreeMap<MarketObservable, BTreeSet<Date>>,
    numeraire: BTreeSet<Date>,
    factors: BTreeSet<Date>,
}

impl Calendar {
    pub(crate) fn clear(&mut self) {
        self.indices.clear();
        self.numeraire.clear();
        self.factors.clear();
    }

    pub(crate) fn add_index_dates(&mut self, index: &MarketObservable, dates: &[Date]) {
        self.indices
            .entry(index.clone())
            .or_default()
            .extend(dates.iter().copied());
    }

    pub(crate) fn add_numeraire_dates(&mut self, dates: &[Date]) {
        self.numeraire.extend(dates.iter().copied());
    }

    pub(crate) fn add_factor_dates(&mut self, dates: &[Date]) {
        self.factors.extend(dates.iter().copied());
    }

    pub(crate) fn indices(&self) -> impl Iterator<Item = (&MarketObservable, &BTreeSet<Date>)> {
        self.indices.iter()
    }

    pub(crate) fn index_dates(&self, index: &MarketObservable) -> Option<&BTreeSet<Date>> {
        self.indices.get(index)
    }

    pub(crate) fn numeraire_dates(&self) -> &BTreeSet<Date> {
        &self.numeraire
    }

    /// Every registered date on or after `from`, ascending, with `from` first.
    pub(crate) fn grid(&self, from: Date) -> Vec<Date> {
        let mut dates: BTreeSet<Date> = self
            .indices
            .values()
            .flatten()
            .chain(&self.numeraire)
            .chain(&self.factors)
            .copied()
            .filter(|&d| d >= from)
            .collect();
        dates.insert(from);
        dates.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::Currency;

    fn date(m: u32) -> Date {
        Date::from_ymd(2025, m, 1).unwrap()
    }

    #[test]
    fn test_grid_merges_and_filters() {
        let share = MarketObservable::share(Currency::ZAR, "AAA");
        let mut calendar = Calendar::default();
        calendar.add_index_dates(&share, &[date(6), date(3)]);
        calendar.add_numeraire_dates(&[date(3), date(9), date(1)]);
        calendar.add_factor_dates(&[date(12)]);

        assert_eq!(
            calendar.grid(date(2)),
            vec![date(2), date(3), date(6), date(9), date(12)]
        );
        assert_eq!(calendar.index_dates(&share).map(|d| d.len()), Some(2));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut calendar = Calendar::default();
        calendar.add_numeraire_dates(&[date(3)]);
        calendar.clear();
        assert!(calendar.numeraire_dates().is_empty());
        assert_eq!(calendar.grid(date(1)), vec![date(1)]);
    }
}
