//! Bermudan options on a share.
//!
//! A [`BermudanOption`] has no cashflows of its own. Exercising on date
//! `t_i` enters the [`ExercisePayoff`] of that date, which pays the signed
//! exercise value `±(S(t_i) - K)` one day later. The choice itself is made
//! by the valuation engine through the exercise schedule.

use pricer_core::traits::{ExerciseEvent, ExerciseSchedule, PortfolioEntry, Product};
use pricer_core::types::{Cashflow, Currency, Date, MarketObservable, SimulationError};

use super::error::ProductError;
use super::european::OptionType;

/// Days between an exercise decision and its settlement.
const SETTLEMENT_LAG_DAYS: i64 = 1;

/// Cash settlement of an exercise on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct ExercisePayoff {
    share: MarketObservable,
    currency: Currency,
    option_type: OptionType,
    strike: f64,
    exercise_date: Date,
    settlement_date: Date,
    value_date: Option<Date>,
    spot: Option<f64>,
}

impl ExercisePayoff {
    /// Settlement of an exercise of `option_type` on `exercise_date`.
    ///
    /// # Errors
    ///
    /// - `ProductError::NotAShare` if `share` is not a share
    /// - `ProductError::Date` if the settlement date is out of range
    pub fn new(
        share: MarketObservable,
        option_type: OptionType,
        strike: f64,
        exercise_date: Date,
    ) -> Result<Self, ProductError> {
        let currency = match &share {
            MarketObservable::Share { currency, .. } => *currency,
            _ => return Err(ProductError::NotAShare(share)),
        };
        Ok(Self {
            share,
            currency,
            option_type,
            strike,
            exercise_date,
            settlement_date: exercise_date.add_days(SETTLEMENT_LAG_DAYS)?,
            value_date: None,
            spot: None,
        })
    }

    /// Date on which the exercise value is fixed.
    pub fn exercise_date(&self) -> Date {
        self.exercise_date
    }

    /// Payment date.
    pub fn settlement_date(&self) -> Date {
        self.settlement_date
    }

    fn is_live(&self) -> bool {
        self.value_date.map_or(true, |vd| self.exercise_date > vd)
    }
}

impl Product for ExercisePayoff {
    fn set_value_date(&mut self, value_date: Date) {
        self.value_date = Some(value_date);
    }

    fn reset(&mut self) {
        self.spot = None;
    }

    fn required_indices(&self) -> Vec<MarketObservable> {
        if self.is_live() {
            vec![self.share.clone()]
        } else {
            Vec::new()
        }
    }

    fn required_index_dates(&self, index: &MarketObservable) -> Vec<Date> {
        if self.is_live() && index == &self.share {
            vec![self.exercise_date]
        } else {
            Vec::new()
        }
    }

    fn set_index_values(&mut self, index: &MarketObservable, values: &[f64]) {
        if index == &self.share {
            self.spot = values.first().copied();
        }
    }

    fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
        if !self.is_live() {
            return Ok(Vec::new());
        }
        let spot = self
            .spot
            .ok_or_else(|| SimulationError::MissingIndexValues(self.share.clone()))?;
        Ok(vec![Cashflow::new(
            self.settlement_date,
            self.option_type.exercise_value(spot, self.strike),
            self.currency,
        )])
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        if self.is_live() {
            vec![self.currency]
        } else {
            Vec::new()
        }
    }

    fn cashflow_dates(&self, currency: Currency) -> Vec<Date> {
        if self.is_live() && currency == self.currency {
            vec![self.settlement_date]
        } else {
            Vec::new()
        }
    }

    fn clone_box(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}

/// Bermudan call or put.
///
/// # Examples
///
/// ```
/// use pricer_core::types::{Currency, Date, MarketObservable};
/// use pricer_models::products::{BermudanOption, OptionType};
///
/// let share = MarketObservable::share(Currency::ZAR, "AAA");
/// let dates = vec![
///     Date::from_ymd(2025, 7, 1).unwrap(),
///     Date::from_ymd(2026, 1, 1).unwrap(),
/// ];
/// let entry = BermudanOption::new(share, OptionType::Put, 100.0, dates)
///     .unwrap()
///     .into_entry()
///     .unwrap();
///
/// let schedule = entry.schedule().unwrap();
/// assert_eq!(schedule.post_exercise_products().len(), 2);
/// assert!(schedule.is_long_optionality(Date::from_ymd(2025, 7, 1).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BermudanOption {
    share: MarketObservable,
    option_type: OptionType,
    strike: f64,
    exercise_dates: Vec<Date>,
    long_optionality: bool,
}

impl BermudanOption {
    /// A held option exercisable on `exercise_dates`.
    ///
    /// # Errors
    ///
    /// - `ProductError::NotAShare` if `share` is not a share
    /// - `ProductError::InvalidStrike` for a negative or non-finite strike
    pub fn new(
        share: MarketObservable,
        option_type: OptionType,
        strike: f64,
        exercise_dates: Vec<Date>,
    ) -> Result<Self, ProductError> {
        if !matches!(share, MarketObservable::Share { .. }) {
            return Err(ProductError::NotAShare(share));
        }
        if !(strike.is_finite() && strike >= 0.0) {
            return Err(ProductError::InvalidStrike { strike });
        }
        Ok(Self {
            share,
            option_type,
            strike,
            exercise_dates,
            long_optionality: true,
        })
    }

    /// Sets who owns the exercise decision: `true` for the holder, `false`
    /// when the option has been sold.
    pub fn with_long_optionality(mut self, long_optionality: bool) -> Self {
        self.long_optionality = long_optionality;
        self
    }

    /// Exercise dates as given.
    pub fn exercise_dates(&self) -> &[Date] {
        &self.exercise_dates
    }

    /// The exercise schedule: one settlement product per exercise date.
    ///
    /// # Errors
    ///
    /// `ProductError::Schedule` for an empty or repeated date list.
    pub fn schedule(&self) -> Result<ExerciseSchedule, ProductError> {
        let mut events = Vec::with_capacity(self.exercise_dates.len());
        let mut payoffs: Vec<Box<dyn Product>> = Vec::with_capacity(self.exercise_dates.len());
        for (i, &date) in self.exercise_dates.iter().enumerate() {
            events.push(ExerciseEvent {
                date,
                post_exercise_index: i,
                long_optionality: self.long_optionality,
            });
            payoffs.push(Box::new(ExercisePayoff::new(
                self.share.clone(),
                self.option_type,
                self.strike,
                date,
            )?));
        }
        Ok(ExerciseSchedule::new(events, payoffs)?)
    }

    /// The option as a portfolio entry.
    pub fn into_entry(self) -> Result<PortfolioEntry, ProductError> {
        let schedule = self.schedule()?;
        Ok(PortfolioEntry::early_exercise(self, schedule))
    }
}

impl Product for BermudanOption {
    fn set_value_date(&mut self, _value_date: Date) {}

    fn reset(&mut self) {}

    fn required_indices(&self) -> Vec<MarketObservable> {
        Vec::new()
    }

    fn required_index_dates(&self, _index: &MarketObservable) -> Vec<Date> {
        Vec::new()
    }

    fn set_index_values(&mut self, _index: &MarketObservable, _values: &[f64]) {}

    fn cashflows(&self) -> Result<Vec<Cashflow>, SimulationError> {
        Ok(Vec::new())
    }

    fn cashflow_currencies(&self) -> Vec<Currency> {
        Vec::new()
    }

    fn cashflow_dates(&self, _currency: Currency) -> Vec<Date> {
        Vec::new()
    }

    fn clone_box(&self) -> Box<dyn Product> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::ScheduleError;

    fn share() -> MarketObservable {
        MarketObservable::share(Currency::ZAR, "AAA")
    }

    fn date(m: u32) -> Date {
        Date::from_ymd(2025, m, 1).unwrap()
    }

    #[test]
    fn test_payoff_settles_one_day_later_with_sign() {
        let mut payoff = ExercisePayoff::new(share(), OptionType::Call, 100.0, date(6)).unwrap();
        payoff.set_value_date(date(1));
        assert_eq!(payoff.required_index_dates(&share()), vec![date(6)]);
        assert_eq!(payoff.cashflow_dates(Currency::ZAR), vec![Date::from_ymd(2025, 6, 2).unwrap()]);

        payoff.set_index_values(&share(), &[90.0]);
        let cashflows = payoff.cashflows().unwrap();
        assert_eq!(cashflows[0].amount, -10.0);
        assert_eq!(cashflows[0].date, Date::from_ymd(2025, 6, 2).unwrap());
    }

    #[test]
    fn test_schedule_has_one_payoff_per_date() {
        let option =
            BermudanOption::new(share(), OptionType::Put, 100.0, vec![date(9), date(3), date(6)])
                .unwrap()
                .with_long_optionality(false);
        let schedule = option.schedule().unwrap();
        assert_eq!(schedule.exercise_dates(), vec![date(3), date(6), date(9)]);
        assert_eq!(schedule.post_exercise_product_at(date(9)), Some(0));
        assert_eq!(schedule.post_exercise_product_at(date(3)), Some(1));
        assert!(!schedule.is_long_optionality(date(6)));
    }

    #[test]
    fn test_invalid_terms_rejected() {
        assert!(matches!(
            BermudanOption::new(share(), OptionType::Put, -1.0, vec![date(3)]),
            Err(ProductError::InvalidStrike { .. })
        ));
        let fx = MarketObservable::Custom("USDZAR".to_string());
        assert!(matches!(
            BermudanOption::new(fx, OptionType::Put, 1.0, vec![date(3)]),
            Err(ProductError::NotAShare(_))
        ));
        let empty = BermudanOption::new(share(), OptionType::Put, 1.0, Vec::new()).unwrap();
        assert!(matches!(
            empty.schedule(),
            Err(ProductError::Schedule(ScheduleError::NoExerciseDates))
        ));
    }
}
