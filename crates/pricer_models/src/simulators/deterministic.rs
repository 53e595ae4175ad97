//! Deterministic curves as a numeraire simulator.
//!
//! Every path is identical: the numeraire is the inverse discount factor of a
//! flat curve, floating rate indices are simple forwards read off forecast
//! curves and FX rates are forwards implied by covered interest parity.

use std::collections::BTreeMap;

use pricer_core::market_data::curves::{FlatCurve, FxForwardCurve};
use pricer_core::traits::{NumeraireSimulator, Simulator};
use pricer_core::types::{Currency, CurrencyPair, Date, MarketObservable, SimulationError};

use super::calendar::Calendar;
use super::error::ModelError;

/// Deterministic discounting, forecasting and FX.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::curves::FlatCurve;
/// use pricer_core::traits::{NumeraireSimulator, Simulator};
/// use pricer_core::types::{Currency, Date};
/// use pricer_models::simulators::DeterministicCurves;
///
/// let value_date = Date::from_ymd(2025, 1, 1).unwrap();
/// let pay_date = Date::from_ymd(2026, 1, 1).unwrap();
/// let curve = FlatCurve::new(value_date, 0.05, Currency::ZAR);
///
/// let mut sim = DeterministicCurves::new(curve);
/// sim.set_numeraire_dates(&[value_date, pay_date]);
/// sim.prepare(value_date).unwrap();
/// sim.run_simulation(0).unwrap();
///
/// let df = sim.numeraire(value_date).unwrap() / sim.numeraire(pay_date).unwrap();
/// assert!((df - (-0.05_f64).exp()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct DeterministicCurves {
    discount: FlatCurve,
    forecast: BTreeMap<MarketObservable, FlatCurve>,
    fx: BTreeMap<CurrencyPair, FxForwardCurve>,
    calendar: Calendar,
    prepared: Option<Prepared>,
}

/// Values at every registered date, computed once by `prepare`.
#[derive(Debug, Clone)]
struct Prepared {
    numeraire: BTreeMap<Date, f64>,
    indices: BTreeMap<MarketObservable, BTreeMap<Date, f64>>,
}

impl DeterministicCurves {
    /// Discounts on `discount`; the numeraire currency is the curve currency.
    pub fn new(discount: FlatCurve) -> Self {
        Self {
            discount,
            forecast: BTreeMap::new(),
            fx: BTreeMap::new(),
            calendar: Calendar::default(),
            prepared: None,
        }
    }

    /// Adds a forecast curve for a floating rate index.
    ///
    /// # Errors
    ///
    /// - `ModelError::WrongObservableKind` unless `index` is a floating rate index
    /// - `ModelError::CurrencyMismatch` if the curve is in another currency
    /// - `ModelError::DuplicateObservable` if `index` already has a curve
    pub fn with_forecast_curve(
        mut self,
        index: MarketObservable,
        curve: FlatCurve,
    ) -> Result<Self, ModelError> {
        let MarketObservable::FloatRateIndex { currency, .. } = &index else {
            return Err(ModelError::WrongObservableKind(index));
        };
        if *currency != curve.currency() {
            return Err(ModelError::CurrencyMismatch {
                observable: index,
                actual: curve.currency(),
            });
        }
        if self.forecast.contains_key(&index) {
            return Err(ModelError::DuplicateObservable(index));
        }
        self.forecast.insert(index, curve);
        Ok(self)
    }

    /// Adds an FX forward curve. The inverse pair is served as well.
    ///
    /// # Errors
    ///
    /// `ModelError::DuplicateObservable` if the pair or its inverse is
    /// already modelled.
    pub fn with_fx_curve(mut self, curve: FxForwardCurve) -> Result<Self, ModelError> {
        let pair = curve.pair();
        if self.fx.contains_key(&pair) || self.fx.contains_key(&pair.inverse()) {
            return Err(ModelError::DuplicateObservable(pair.into()));
        }
        self.fx.insert(pair, curve);
        Ok(self)
    }

    /// The discount curve.
    pub fn discount_curve(&self) -> &FlatCurve {
        &self.discount
    }

    fn value_of(&self, index: &MarketObservable, date: Date) -> Result<f64, SimulationError> {
        match index {
            MarketObservable::FloatRateIndex { tenor, .. } => match self.forecast.get(index) {
                Some(curve) => Ok(curve.forward_rate(date, *tenor)?),
                None => Err(SimulationError::UnsupportedObservable(index.clone())),
            },
            MarketObservable::CurrencyPair(pair) => {
                if let Some(curve) = self.fx.get(pair) {
                    Ok(curve.forward(date)?)
                } else if let Some(curve) = self.fx.get(&pair.inverse()) {
                    Ok(1.0 / curve.forward(date)?)
                } else {
                    Err(SimulationError::UnsupportedObservable(index.clone()))
                }
            }
            _ => Err(SimulationError::UnsupportedObservable(index.clone())),
        }
    }

    fn prepared(&self) -> Result<&Prepared, SimulationError> {
        self.prepared
            .as_ref()
            .ok_or_else(|| SimulationError::NotPrepared("deterministic curves".to_string()))
    }
}

impl Simulator for DeterministicCurves {
    fn provides_index(&self, index: &MarketObservable) -> bool {
        match index {
            MarketObservable::FloatRateIndex { .. } => self.forecast.contains_key(index),
            MarketObservable::CurrencyPair(pair) => {
                self.fx.contains_key(pair) || self.fx.contains_key(&pair.inverse())
            }
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.calendar.clear();
        self.prepared = None;
    }

    fn set_required_dates(&mut self, index: &MarketObservable, dates: &[Date]) {
        self.calendar.add_index_dates(index, dates);
    }

    fn prepare(&mut self, value_date: Date) -> Result<(), SimulationError> {
        let mut numeraire_dates = self.calendar.numeraire_dates().clone();
        numeraire_dates.insert(value_date);
        let numeraire = numeraire_dates
            .into_iter()
            .map(|d| Ok((d, 1.0 / self.discount.discount_factor(d)?)))
            .collect::<Result<_, SimulationError>>()?;

        let mut indices = BTreeMap::new();
        for (index, dates) in self.calendar.indices() {
            if !self.provides_index(index) {
                return Err(SimulationError::UnsupportedObservable(index.clone()));
            }
            let values = dates
                .iter()
                .map(|&d| Ok((d, self.value_of(index, d)?)))
                .collect::<Result<_, SimulationError>>()?;
            indices.insert(index.clone(), values);
        }

        self.prepared = Some(Prepared { numeraire, indices });
        Ok(())
    }

    fn run_simulation(&mut self, _path_index: usize) -> Result<(), SimulationError> {
        self.prepared().map(|_| ())
    }

    fn indices(&self, index: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>, SimulationError> {
        let prepared = self.prepared()?;
        let Some(values) = prepared.indices.get(index) else {
            return Err(if self.provides_index(index) {
                SimulationError::NotPrepared(format!("no dates registered for {index}"))
            } else {
                SimulationError::UnsupportedObservable(index.clone())
            });
        };
        dates
            .iter()
            .map(|date| {
                values
                    .get(date)
                    .copied()
                    .ok_or_else(|| SimulationError::UnregisteredDate {
                        observable: index.to_string(),
                        date: *date,
                    })
            })
            .collect()
    }

    fn underlying_factors(&self, _date: Date) -> Result<Vec<f64>, SimulationError> {
        self.prepared().map(|_| Vec::new())
    }

    fn clone_box(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for DeterministicCurves {
    fn numeraire_currency(&self) -> Option<Currency> {
        Some(self.discount.currency())
    }

    fn numeraire(&self, date: Date) -> Result<f64, SimulationError> {
        self.prepared()?
            .numeraire
            .get(&date)
            .copied()
            .ok_or_else(|| SimulationError::UnregisteredDate {
                observable: "numeraire".to_string(),
                date,
            })
    }

    fn set_numeraire_dates(&mut self, dates: &[Date]) {
        self.calendar.add_numeraire_dates(dates);
    }

    fn clone_numeraire(&self) -> Box<dyn NumeraireSimulator> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::MarketDataError;
    use pricer_core::types::Tenor;

    fn date(y: i32, m: u32) -> Date {
        Date::from_ymd(y, m, 1).unwrap()
    }

    fn zar() -> FlatCurve {
        FlatCurve::new(date(2025, 1), 0.07, Currency::ZAR)
    }

    fn usdzar() -> FxForwardCurve {
        let usd = FlatCurve::new(date(2025, 1), 0.04, Currency::USD);
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
        FxForwardCurve::new(pair, 18.0, usd, zar()).unwrap()
    }

    fn jibar() -> MarketObservable {
        MarketObservable::float_rate_index(Currency::ZAR, "JIBAR", Tenor::months(3))
    }

    #[test]
    fn test_queries_before_prepare_fail() {
        let mut sim = DeterministicCurves::new(zar());
        assert!(matches!(
            sim.run_simulation(0),
            Err(SimulationError::NotPrepared(_))
        ));
        assert!(sim.numeraire(date(2025, 1)).is_err());
    }

    #[test]
    fn test_forecast_and_fx_values() {
        let pair = CurrencyPair::new(Currency::USD, Currency::ZAR).unwrap();
        let fx = MarketObservable::from(pair);
        let inverse = MarketObservable::from(pair.inverse());
        let mut sim = DeterministicCurves::new(zar())
            .with_forecast_curve(jibar(), FlatCurve::new(date(2025, 1), 0.08, Currency::ZAR))
            .unwrap()
            .with_fx_curve(usdzar())
            .unwrap();
        assert!(sim.provides_index(&inverse));

        let fixing = date(2025, 7);
        sim.set_required_dates(&jibar(), &[fixing]);
        sim.set_required_dates(&fx, &[fixing]);
        sim.set_required_dates(&inverse, &[fixing]);
        sim.prepare(date(2025, 1)).unwrap();
        sim.run_simulation(3).unwrap();

        let rate = sim.indices(&jibar(), &[fixing]).unwrap()[0];
        assert!(rate > 0.079 && rate < 0.082);

        let forward = sim.indices(&fx, &[fixing]).unwrap()[0];
        assert_relative_eq!(forward, usdzar().forward(fixing).unwrap(), epsilon = 1e-12);
        assert_relative_eq!(
            sim.indices(&inverse, &[fixing]).unwrap()[0],
            1.0 / forward,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unregistered_date_rejected() {
        let mut sim = DeterministicCurves::new(zar())
            .with_forecast_curve(jibar(), zar())
            .unwrap();
        sim.set_required_dates(&jibar(), &[date(2025, 7)]);
        sim.prepare(date(2025, 1)).unwrap();
        let err = sim.indices(&jibar(), &[date(2025, 8)]).unwrap_err();
        assert_eq!(
            err,
            SimulationError::UnregisteredDate {
                observable: "ZAR:JIBAR:3M".to_string(),
                date: date(2025, 8),
            }
        );
    }

    #[test]
    fn test_duplicate_curves_rejected() {
        let sim = DeterministicCurves::new(zar())
            .with_forecast_curve(jibar(), zar())
            .unwrap();
        assert!(matches!(
            sim.with_forecast_curve(jibar(), zar()),
            Err(ModelError::DuplicateObservable(_))
        ));

        let zarusd = FxForwardCurve::new(
            CurrencyPair::new(Currency::ZAR, Currency::USD).unwrap(),
            1.0 / 18.0,
            zar(),
            FlatCurve::new(date(2025, 1), 0.04, Currency::USD),
        )
        .unwrap();
        let sim = DeterministicCurves::new(zar()).with_fx_curve(usdzar()).unwrap();
        assert!(matches!(
            sim.with_fx_curve(zarusd),
            Err(ModelError::DuplicateObservable(_))
        ));
    }

    #[test]
    fn test_forecast_curve_checks() {
        let share = MarketObservable::share(Currency::ZAR, "AAA");
        assert!(matches!(
            DeterministicCurves::new(zar()).with_forecast_curve(share, zar()),
            Err(ModelError::WrongObservableKind(_))
        ));
        let usd = FlatCurve::new(date(2025, 1), 0.04, Currency::USD);
        assert!(matches!(
            DeterministicCurves::new(zar()).with_forecast_curve(jibar(), usd),
            Err(ModelError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_value_date_before_anchor_fails_preparation() {
        let mut sim = DeterministicCurves::new(zar());
        let err = sim.prepare(date(2024, 1)).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::MarketData(MarketDataError::DateBeforeAnchor { .. })
        ));
    }

    #[test]
    fn test_reset_forgets_dates() {
        let mut sim = DeterministicCurves::new(zar());
        sim.set_numeraire_dates(&[date(2026, 1)]);
        sim.prepare(date(2025, 1)).unwrap();
        assert!(sim.numeraire(date(2026, 1)).is_ok());

        sim.reset();
        sim.prepare(date(2025, 1)).unwrap();
        assert!(sim.numeraire(date(2026, 1)).is_err());
        assert!(sim.underlying_factors(date(2025, 1)).unwrap().is_empty());
    }
}
