//! Portfolio expansion into product slots.
//!
//! Each portfolio entry keeps its position as a slot. Post-exercise products
//! of early-exercise entries are appended after all entries, and the map from
//! an early-exercise slot to its post-exercise slots is kept in an
//! [`ExerciseTask`].

use std::collections::{BTreeMap, BTreeSet};

use pricer_core::traits::{ExerciseEvent, PortfolioEntry, Product};
use pricer_core::types::{normalise_dates, Currency, CurrencyPair, Date, MarketObservable};

use crate::error::ConfigurationError;

/// Early-exercise resolution work for one portfolio entry.
#[derive(Clone, Debug)]
pub(crate) struct ExerciseTask {
    /// Slot holding the cashflows received until exercise
    pub(crate) slot: usize,
    /// Exercise events in ascending date order
    pub(crate) events: Vec<ExerciseEvent>,
    /// Slot of each post-exercise product, by schedule index
    pub(crate) post_exercise_slots: Vec<usize>,
}

impl ExerciseTask {
    /// Slot of the product entered by exercising at `event`.
    pub(crate) fn post_exercise_slot(&self, event: usize) -> usize {
        self.post_exercise_slots[self.events[event].post_exercise_index]
    }
}

/// Index requirements of one product slot.
pub(crate) type Requirements = Vec<(MarketObservable, Vec<Date>)>;

/// The expanded, value-dated portfolio of one valuation call.
#[derive(Clone, Debug)]
pub(crate) struct PreparedPortfolio {
    pub(crate) value_date: Date,
    pub(crate) products: Vec<Box<dyn Product>>,
    pub(crate) original_slots: Vec<usize>,
    pub(crate) exercise_tasks: Vec<ExerciseTask>,
    pub(crate) requirements: Vec<Requirements>,
    pub(crate) cashflow_dates: BTreeMap<Currency, Vec<Date>>,
    pub(crate) forward_dates: Vec<Date>,
    pub(crate) regression_dates: Vec<Date>,
    pub(crate) all_dates: Vec<Date>,
}

impl PreparedPortfolio {
    /// Clones and value-dates every product and collects the date sets.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::ForwardDateBeforeValueDate` for a forward date
    /// earlier than `value_date`.
    pub(crate) fn new(
        entries: &[PortfolioEntry],
        value_date: Date,
        forward_dates: &[Date],
    ) -> Result<Self, ConfigurationError> {
        if let Some(&forward_date) = forward_dates.iter().find(|&&d| d < value_date) {
            return Err(ConfigurationError::ForwardDateBeforeValueDate {
                forward_date,
                value_date,
            });
        }

        let mut products: Vec<Box<dyn Product>> =
            entries.iter().map(|e| e.product().clone_box()).collect();
        let original_slots: Vec<usize> = (0..entries.len()).collect();
        let mut exercise_tasks = Vec::new();
        let mut exercise_dates = Vec::new();

        for (slot, entry) in entries.iter().enumerate() {
            let PortfolioEntry::EarlyExercise { schedule, .. } = entry else {
                continue;
            };
            let mut post_exercise_slots = Vec::with_capacity(schedule.post_exercise_products().len());
            for post in schedule.post_exercise_products() {
                post_exercise_slots.push(products.len());
                products.push(post.clone());
            }
            let events: Vec<ExerciseEvent> = schedule
                .events()
                .iter()
                .filter(|e| e.date > value_date)
                .copied()
                .collect();
            if events.is_empty() {
                continue;
            }
            exercise_dates.extend(events.iter().map(|e| e.date));
            exercise_tasks.push(ExerciseTask {
                slot,
                events,
                post_exercise_slots,
            });
        }

        for product in &mut products {
            product.set_value_date(value_date);
        }

        let requirements = products
            .iter()
            .map(|p| {
                p.required_indices()
                    .into_iter()
                    .map(|index| {
                        let dates = p.required_index_dates(&index);
                        (index, dates)
                    })
                    .collect()
            })
            .collect();

        let mut cashflow_dates: BTreeMap<Currency, Vec<Date>> = BTreeMap::new();
        for product in &products {
            for currency in product.cashflow_currencies() {
                cashflow_dates
                    .entry(currency)
                    .or_default()
                    .extend(product.cashflow_dates(currency));
            }
        }
        for dates in cashflow_dates.values_mut() {
            normalise_dates(dates);
        }

        let mut regression_dates: Vec<Date> =
            forward_dates.iter().chain(&exercise_dates).copied().collect();
        normalise_dates(&mut regression_dates);

        let mut all_dates = vec![value_date];
        all_dates.extend(regression_dates.iter().copied());
        all_dates.extend(cashflow_dates.values().flatten().copied());
        normalise_dates(&mut all_dates);
        all_dates.retain(|&d| d >= value_date);

        Ok(Self {
            value_date,
            products,
            original_slots,
            exercise_tasks,
            requirements,
            cashflow_dates,
            forward_dates: forward_dates.to_vec(),
            regression_dates,
            all_dates,
        })
    }

    /// Currencies in which any slot may pay.
    pub(crate) fn cashflow_currencies(&self) -> Vec<Currency> {
        self.cashflow_dates.keys().copied().collect()
    }

    /// The currency cashflows are converted into.
    ///
    /// The numeraire's currency if it has one; otherwise the portfolio's
    /// single payment currency (or `None` if nothing pays).
    ///
    /// # Errors
    ///
    /// `ConfigurationError::UnresolvedNumeraireCurrency` if the numeraire has
    /// no currency and the portfolio pays in more than one.
    pub(crate) fn valuation_currency(
        &self,
        numeraire_currency: Option<Currency>,
    ) -> Result<Option<Currency>, ConfigurationError> {
        if numeraire_currency.is_some() {
            return Ok(numeraire_currency);
        }
        let currencies = self.cashflow_currencies();
        match currencies.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(ConfigurationError::UnresolvedNumeraireCurrency { currencies }),
        }
    }

    /// FX pairs needed to convert foreign cashflows, keyed by foreign currency.
    pub(crate) fn fx_pairs(&self, valuation_currency: Option<Currency>) -> BTreeMap<Currency, CurrencyPair> {
        let Some(domestic) = valuation_currency else {
            return BTreeMap::new();
        };
        self.cashflow_dates
            .keys()
            .filter_map(|&c| CurrencyPair::new(c, domestic).ok().map(|pair| (c, pair)))
            .collect()
    }

    /// Every observable that needs a provider: product requirements plus
    /// the FX pairs of foreign cashflows.
    pub(crate) fn required_observables(
        &self,
        fx_pairs: &BTreeMap<Currency, CurrencyPair>,
    ) -> BTreeSet<MarketObservable> {
        self.requirements
            .iter()
            .flatten()
            .map(|(index, _)| index.clone())
            .chain(fx_pairs.values().map(|&pair| MarketObservable::CurrencyPair(pair)))
            .collect()
    }

    /// Number of product slots, including appended post-exercise products.
    pub(crate) fn n_slots(&self) -> usize {
        self.products.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::traits::ExerciseSchedule;
    use pricer_core::types::{Cashflow, SimulationError};

    #[derive(Debug, Clone)]
    struct Payer {
        currency: Currency,
        date: Date,
        index: Option<MarketObservable>,
    }

    impl Product for Payer {
        fn set_value_date(&mut self, _value_date: Date) {}
        fn reset(&mut self) {}
        fn required_indices(&self) -> Vec<MarketObservable> {
            self.index.iter().cloned().collect()
        }
        fn required_index_dates(&self, _index: &MarketObservable) -> Vec<Date> {
            vec![self.date]
        }
        fn set_index_values(&mut self, _index: &MarketObservable, _values: &[f64]) {}
        fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
            Ok(vec![Cashflow::new(self.date, 1.0, self.currency)])
        }
        fn cashflow_currencies(&self) -> Vec<Currency> {
            vec![self.currency]
        }
        fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
            if currency == self.currency {
                vec![self.date]
            } else {
                Vec::new()
            }
        }
        fn clone_box(&self) -> Box<dyn Product> {
            Box::new(self.clone())
        }
    }

    fn d(y: i32, m: u32) -> Date {
        Date::from_ymd(y, m, 1).unwrap()
    }

    fn payer(currency: Currency, date: Date) -> Payer {
        Payer {
            currency,
            date,
            index: None,
        }
    }

    #[test]
    fn test_post_exercise_products_are_appended() {
        let schedule = ExerciseSchedule::uniform(
            &[d(2026, 1), d(2026, 6)],
            Box::new(payer(Currency::ZAR, d(2027, 1))),
            true,
        )
        .unwrap();
        let entries = vec![
            PortfolioEntry::early_exercise(payer(Currency::ZAR, d(2026, 3)), schedule),
            PortfolioEntry::plain(payer(Currency::ZAR, d(2025, 9))),
        ];
        let prepared = PreparedPortfolio::new(&entries, d(2025, 1), &[d(2025, 7)]).unwrap();
        assert_eq!(prepared.n_slots(), 3);
        assert_eq!(prepared.original_slots, vec![0, 1]);
        assert_eq!(prepared.exercise_tasks.len(), 1);
        assert_eq!(prepared.exercise_tasks[0].post_exercise_slots, vec![2]);
        assert_eq!(prepared.exercise_tasks[0].post_exercise_slot(1), 2);
        assert_eq!(
            prepared.regression_dates,
            vec![d(2025, 7), d(2026, 1), d(2026, 6)]
        );
        assert_eq!(prepared.all_dates.first(), Some(&d(2025, 1)));
        assert_eq!(prepared.all_dates.last(), Some(&d(2027, 1)));
    }

    #[test]
    fn test_expired_exercise_dates_are_ignored() {
        let schedule = ExerciseSchedule::uniform(
            &[d(2024, 6), d(2025, 1), d(2025, 6)],
            Box::new(payer(Currency::ZAR, d(2027, 1))),
            true,
        )
        .unwrap();
        let entries = vec![PortfolioEntry::early_exercise(
            payer(Currency::ZAR, d(2026, 3)),
            schedule,
        )];
        let prepared = PreparedPortfolio::new(&entries, d(2025, 1), &[]).unwrap();
        assert_eq!(prepared.exercise_tasks[0].events.len(), 1);
        assert_eq!(prepared.regression_dates, vec![d(2025, 6)]);

        let prepared = PreparedPortfolio::new(&entries, d(2025, 7), &[]).unwrap();
        assert!(prepared.exercise_tasks.is_empty());
        assert!(prepared.regression_dates.is_empty());
    }

    #[test]
    fn test_forward_date_before_value_date_rejected() {
        let entries = vec![PortfolioEntry::plain(payer(Currency::ZAR, d(2026, 1)))];
        let err = PreparedPortfolio::new(&entries, d(2025, 6), &[d(2025, 1)]).unwrap_err();
        assert!(matches!(err, ConfigurationError::ForwardDateBeforeValueDate { .. }));
    }

    #[test]
    fn test_valuation_currency_resolution() {
        let single = vec![PortfolioEntry::plain(payer(Currency::USD, d(2026, 1)))];
        let prepared = PreparedPortfolio::new(&single, d(2025, 1), &[]).unwrap();
        assert_eq!(prepared.valuation_currency(None), Ok(Some(Currency::USD)));
        assert_eq!(
            prepared.valuation_currency(Some(Currency::ZAR)),
            Ok(Some(Currency::ZAR))
        );

        let mixed = vec![
            PortfolioEntry::plain(payer(Currency::USD, d(2026, 1))),
            PortfolioEntry::plain(payer(Currency::ZAR, d(2026, 1))),
        ];
        let prepared = PreparedPortfolio::new(&mixed, d(2025, 1), &[]).unwrap();
        assert!(matches!(
            prepared.valuation_currency(None),
            Err(ConfigurationError::UnresolvedNumeraireCurrency { .. })
        ));
    }

    #[test]
    fn test_required_observables_include_fx_pairs() {
        let share = MarketObservable::share(Currency::USD, "AAA");
        let entries = vec![
            PortfolioEntry::plain(Payer {
                currency: Currency::USD,
                date: d(2026, 1),
                index: Some(share.clone()),
            }),
            PortfolioEntry::plain(payer(Currency::ZAR, d(2026, 1))),
        ];
        let prepared = PreparedPortfolio::new(&entries, d(2025, 1), &[]).unwrap();
        let pairs = prepared.fx_pairs(Some(Currency::ZAR));
        assert_eq!(pairs.len(), 1);
        let required = prepared.required_observables(&pairs);
        let usdzar = MarketObservable::CurrencyPair(CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap());
        assert!(required.contains(&share));
        assert!(required.contains(&usdzar));
        assert_eq!(required.len(), 2);
    }
}
