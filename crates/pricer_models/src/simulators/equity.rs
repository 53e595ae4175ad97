//! Correlated lognormal equities under a deterministic discount curve.
//!
//! Each share follows
//!
//! ```text
//! dS / S = (r(t) - q) dt + σ dW,    d<W_i, W_j> = ρ_ij dt
//! ```
//!
//! with `r(t)` implied by the discount curve. Paths are generated exactly in
//! log space on the grid of registered dates:
//!
//! ```text
//! S(t_k) = S(t_{k-1}) · DF(t_{k-1}) / DF(t_k) · exp(-q·Δt - σ²Δt/2 + σ·√Δt·Z_k)
//! ```
//!
//! where `Z_k = L·ε_k`, `L` is the Cholesky factor of the correlation matrix
//! and `ε_k` are independent standard normals drawn from the path's own
//! generator. The numeraire is the bank account `1 / DF(t)`.

use std::collections::BTreeMap;

use nalgebra::{Cholesky, DMatrix, DVector};
use pricer_core::market_data::curves::FlatCurve;
use pricer_core::traits::{NumeraireSimulator, Simulator};
use pricer_core::types::{
    Currency, Date, DayCountConvention, MarketObservable, SimulationError,
};

use super::calendar::Calendar;
use super::error::ModelError;
use crate::rng::PathRng;

/// Lognormal dynamics of one share.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareProcess {
    share: MarketObservable,
    spot: f64,
    volatility: f64,
    dividend_yield: f64,
}

impl ShareProcess {
    /// Creates the process of `share`.
    ///
    /// # Errors
    ///
    /// - `ModelError::WrongObservableKind` unless `share` is a share
    /// - `ModelError::InvalidSpot`, `InvalidVolatility`,
    ///   `InvalidDividendYield` for out-of-range parameters
    pub fn new(
        share: MarketObservable,
        spot: f64,
        volatility: f64,
        dividend_yield: f64,
    ) -> Result<Self, ModelError> {
        if !matches!(share, MarketObservable::Share { .. }) {
            return Err(ModelError::WrongObservableKind(share));
        }
        if !(spot.is_finite() && spot > 0.0) {
            return Err(ModelError::InvalidSpot { spot });
        }
        if !(volatility.is_finite() && volatility > 0.0) {
            return Err(ModelError::InvalidVolatility { volatility });
        }
        if !dividend_yield.is_finite() {
            return Err(ModelError::InvalidDividendYield(dividend_yield));
        }
        Ok(Self {
            share,
            spot,
            volatility,
            dividend_yield,
        })
    }

    /// The modelled share.
    pub fn share(&self) -> &MarketObservable {
        &self.share
    }

    /// Spot price at the curve anchor.
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Annualised volatility.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }

    /// Continuous dividend yield.
    pub fn dividend_yield(&self) -> f64 {
        self.dividend_yield
    }
}

/// Multi-share correlated GBM numeraire simulator.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::curves::FlatCurve;
/// use pricer_core::traits::Simulator;
/// use pricer_core::types::{Currency, Date, MarketObservable};
/// use pricer_models::simulators::EquitySimulator;
///
/// let value_date = Date::from_ymd(2025, 1, 1).unwrap();
/// let expiry = Date::from_ymd(2026, 1, 1).unwrap();
/// let share = MarketObservable::share(Currency::ZAR, "AAA");
/// let curve = FlatCurve::new(value_date, 0.07, Currency::ZAR);
///
/// let mut sim = EquitySimulator::single(share.clone(), 100.0, 0.2, 0.0, curve, 42).unwrap();
/// sim.set_required_dates(&share, &[expiry]);
/// sim.prepare(value_date).unwrap();
///
/// sim.run_simulation(17).unwrap();
/// let first = sim.indices(&share, &[expiry]).unwrap();
/// sim.run_simulation(3).unwrap();
/// sim.run_simulation(17).unwrap();
/// assert_eq!(sim.indices(&share, &[expiry]).unwrap(), first);
/// ```
#[derive(Debug, Clone)]
pub struct EquitySimulator {
    shares: Vec<ShareProcess>,
    cholesky: DMatrix<f64>,
    discount: FlatCurve,
    forecast: BTreeMap<MarketObservable, FlatCurve>,
    seed: u64,
    calendar: Calendar,
    grid: Option<Grid>,
    path: Option<PathState>,
}

/// Discretisation fixed by `prepare`.
#[derive(Debug, Clone)]
struct Grid {
    dates: Vec<Date>,
    // [step - 1][share], for steps 1..dates.len()
    log_drift: Vec<Vec<f64>>,
    // [step - 1][share]
    diffusion: Vec<Vec<f64>>,
    // [step - 1]
    dt: Vec<f64>,
    numeraire: Vec<f64>,
    forecasts: BTreeMap<MarketObservable, BTreeMap<Date, f64>>,
}

impl Grid {
    fn position(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

/// Realisations of the current path, `[share][grid date]`.
#[derive(Debug, Clone)]
struct PathState {
    prices: Vec<Vec<f64>>,
    // Dividends paid from the first grid date up to each grid date.
    dividends: Vec<Vec<f64>>,
}

impl EquitySimulator {
    /// Correlated shares discounted on `discount`.
    ///
    /// # Errors
    ///
    /// - `ModelError::NoShares` for an empty share list
    /// - `ModelError::DuplicateObservable` if a share appears twice
    /// - `ModelError::CurrencyMismatch` if a share trades in another currency
    ///   than the discount curve
    /// - `ModelError::CorrelationShape`, `InvalidCorrelation`,
    ///   `NotPositiveDefinite` for an unusable correlation matrix
    pub fn new(
        shares: Vec<ShareProcess>,
        correlation: DMatrix<f64>,
        discount: FlatCurve,
        seed: u64,
    ) -> Result<Self, ModelError> {
        if shares.is_empty() {
            return Err(ModelError::NoShares);
        }
        for (i, process) in shares.iter().enumerate() {
            if shares[..i].iter().any(|p| p.share == process.share) {
                return Err(ModelError::DuplicateObservable(process.share.clone()));
            }
            if process.share.currency() != Some(discount.currency()) {
                return Err(ModelError::CurrencyMismatch {
                    observable: process.share.clone(),
                    actual: discount.currency(),
                });
            }
        }
        let cholesky = cholesky_factor(correlation, shares.len())?;
        Ok(Self {
            shares,
            cholesky,
            discount,
            forecast: BTreeMap::new(),
            seed,
            calendar: Calendar::default(),
            grid: None,
            path: None,
        })
    }

    /// A single share.
    pub fn single(
        share: MarketObservable,
        spot: f64,
        volatility: f64,
        dividend_yield: f64,
        discount: FlatCurve,
        seed: u64,
    ) -> Result<Self, ModelError> {
        let process = ShareProcess::new(share, spot, volatility, dividend_yield)?;
        Self::new(vec![process], DMatrix::identity(1, 1), discount, seed)
    }

    /// Adds a deterministic forecast curve for a floating rate index.
    ///
    /// # Errors
    ///
    /// Same as [`DeterministicCurves::with_forecast_curve`](super::DeterministicCurves::with_forecast_curve).
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

    /// The share processes, in factor order.
    pub fn shares(&self) -> &[ShareProcess] {
        &self.shares
    }

    /// Seed from which every path's generator is derived.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn share_position(&self, share: &MarketObservable) -> Option<usize> {
        self.shares.iter().position(|p| &p.share == share)
    }

    fn build_grid(&self, value_date: Date) -> Result<Grid, SimulationError> {
        let dates = self.calendar.grid(value_date);
        let discount = dates
            .iter()
            .map(|&d| self.discount.discount_factor(d))
            .collect::<Result<Vec<_>, _>>()?;

        let n_steps = dates.len() - 1;
        let mut log_drift = Vec::with_capacity(n_steps);
        let mut diffusion = Vec::with_capacity(n_steps);
        let mut dt = Vec::with_capacity(n_steps);
        for k in 1..dates.len() {
            let step = DayCountConvention::ActualActual365.year_fraction_dates(dates[k - 1], dates[k]);
            let carry = (discount[k - 1] / discount[k]).ln();
            log_drift.push(
                self.shares
                    .iter()
                    .map(|p| carry - (p.dividend_yield + 0.5 * p.volatility * p.volatility) * step)
                    .collect(),
            );
            diffusion.push(self.shares.iter().map(|p| p.volatility * step.sqrt()).collect());
            dt.push(step);
        }

        let mut forecasts = BTreeMap::new();
        for (index, index_dates) in self.calendar.indices() {
            match index {
                MarketObservable::Share { .. } | MarketObservable::Dividend { .. }
                    if self.provides_index(index) => {}
                MarketObservable::FloatRateIndex { tenor, .. } => {
                    let curve = self
                        .forecast
                        .get(index)
                        .ok_or_else(|| SimulationError::UnsupportedObservable(index.clone()))?;
                    let values = index_dates
                        .iter()
                        .map(|&d| Ok((d, curve.forward_rate(d, *tenor)?)))
                        .collect::<Result<_, SimulationError>>()?;
                    forecasts.insert(index.clone(), values);
                }
                _ => return Err(SimulationError::UnsupportedObservable(index.clone())),
            }
        }

        Ok(Grid {
            numeraire: discount.iter().map(|df| 1.0 / df).collect(),
            dates,
            log_drift,
            diffusion,
            dt,
            forecasts,
        })
    }

    fn grid(&self) -> Result<&Grid, SimulationError> {
        self.grid
            .as_ref()
            .ok_or_else(|| SimulationError::NotPrepared("equity simulator".to_string()))
    }

    fn path(&self) -> Result<(&Grid, &PathState), SimulationError> {
        let grid = self.grid()?;
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| SimulationError::NotPrepared("no path simulated".to_string()))?;
        Ok((grid, path))
    }

    fn registered_positions(
        &self,
        grid: &Grid,
        index: &MarketObservable,
        dates: &[Date],
    ) -> Result<Vec<usize>, SimulationError> {
        let registered = self.calendar.index_dates(index);
        dates
            .iter()
            .map(|&date| {
                registered
                    .filter(|set| set.contains(&date))
                    .and_then(|_| grid.position(date))
                    .ok_or_else(|| SimulationError::UnregisteredDate {
                        observable: index.to_string(),
                        date,
                    })
            })
            .collect()
    }
}

fn cholesky_factor(correlation: DMatrix<f64>, n: usize) -> Result<DMatrix<f64>, ModelError> {
    if correlation.nrows() != n || correlation.ncols() != n {
        return Err(ModelError::CorrelationShape {
            expected: n,
            rows: correlation.nrows(),
            cols: correlation.ncols(),
        });
    }
    for i in 0..n {
        for j in 0..n {
            let value = correlation[(i, j)];
            let valid = if i == j {
                (value - 1.0).abs() < 1e-12
            } else {
                value.abs() <= 1.0 && (value - correlation[(j, i)]).abs() < 1e-12
            };
            if !valid {
                return Err(ModelError::InvalidCorrelation { i, j, value });
            }
        }
    }
    Cholesky::new(correlation)
        .map(|c| c.l())
        .ok_or(ModelError::NotPositiveDefinite)
}

impl Simulator for EquitySimulator {
    fn provides_index(&self, index: &MarketObservable) -> bool {
        match index {
            MarketObservable::Share { .. } => self.share_position(index).is_some(),
            MarketObservable::Dividend { .. } => index
                .underlying_share()
                .is_some_and(|share| self.share_position(&share).is_some()),
            MarketObservable::FloatRateIndex { .. } => self.forecast.contains_key(index),
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.calendar.clear();
        self.grid = None;
        self.path = None;
    }

    fn set_required_dates(&mut self, index: &MarketObservable, dates: &[Date]) {
        self.calendar.add_index_dates(index, dates);
    }

    fn set_factor_dates(&mut self, dates: &[Date]) {
        self.calendar.add_factor_dates(dates);
    }

    fn prepare(&mut self, value_date: Date) -> Result<(), SimulationError> {
        self.path = None;
        self.grid = Some(self.build_grid(value_date)?);
        Ok(())
    }

    fn run_simulation(&mut self, path_index: usize) -> Result<(), SimulationError> {
        let grid = self.grid()?;
        let n_shares = self.shares.len();
        let n_dates = grid.dates.len();
        let mut rng = PathRng::for_path(self.seed, path_index);
        let mut draws = vec![0.0; n_shares];

        let mut prices: Vec<Vec<f64>> = self
            .shares
            .iter()
            .map(|p| {
                let mut row = vec![0.0; n_dates];
                row[0] = p.spot;
                row
            })
            .collect();
        let mut dividends = vec![vec![0.0; n_dates]; n_shares];

        for k in 1..n_dates {
            rng.fill_normal(&mut draws);
            let correlated = &self.cholesky * DVector::from_column_slice(&draws);
            for (i, process) in self.shares.iter().enumerate() {
                let previous = prices[i][k - 1];
                let next = previous
                    * (grid.log_drift[k - 1][i] + grid.diffusion[k - 1][i] * correlated[i]).exp();
                if !next.is_finite() {
                    return Err(SimulationError::NonFinite {
                        what: process.share.to_string(),
                        date: grid.dates[k],
                    });
                }
                prices[i][k] = next;
                dividends[i][k] = dividends[i][k - 1]
                    + process.dividend_yield * 0.5 * (previous + next) * grid.dt[k - 1];
            }
        }

        self.path = Some(PathState { prices, dividends });
        Ok(())
    }

    /// Share prices, dividends paid since the previous requested date (the
    /// value date for the first one), or forecast fixings.
    fn indices(&self, index: &MarketObservable, dates: &[Date]) -> Result<Vec<f64>, SimulationError> {
        match index {
            MarketObservable::FloatRateIndex { .. } => {
                let grid = self.grid()?;
                let values = grid
                    .forecasts
                    .get(index)
                    .ok_or_else(|| SimulationError::UnsupportedObservable(index.clone()))?;
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
            MarketObservable::Share { .. } => {
                let i = self
                    .share_position(index)
                    .ok_or_else(|| SimulationError::UnsupportedObservable(index.clone()))?;
                let (grid, path) = self.path()?;
                let positions = self.registered_positions(grid, index, dates)?;
                Ok(positions.into_iter().map(|k| path.prices[i][k]).collect())
            }
            MarketObservable::Dividend { .. } => {
                let i = index
                    .underlying_share()
                    .and_then(|share| self.share_position(&share))
                    .ok_or_else(|| SimulationError::UnsupportedObservable(index.clone()))?;
                let (grid, path) = self.path()?;
                let positions = self.registered_positions(grid, index, dates)?;
                let mut previous = 0;
                Ok(positions
                    .into_iter()
                    .map(|k| {
                        let paid = path.dividends[i][k] - path.dividends[i][previous];
                        previous = k;
                        paid
                    })
                    .collect())
            }
            _ => Err(SimulationError::UnsupportedObservable(index.clone())),
        }
    }

    fn underlying_factors(&self, date: Date) -> Result<Vec<f64>, SimulationError> {
        let (grid, path) = self.path()?;
        let k = grid
            .position(date)
            .ok_or_else(|| SimulationError::UnregisteredDate {
                observable: "factors".to_string(),
                date,
            })?;
        Ok(path.prices.iter().map(|row| row[k]).collect())
    }

    fn clone_box(&self) -> Box<dyn Simulator> {
        Box::new(self.clone())
    }
}

impl NumeraireSimulator for EquitySimulator {
    fn numeraire_currency(&self) -> Option<Currency> {
        Some(self.discount.currency())
    }

    fn numeraire(&self, date: Date) -> Result<f64, SimulationError> {
        let grid = self.grid()?;
        let registered = date == grid.dates[0] || self.calendar.numeraire_dates().contains(&date);
        match grid.position(date) {
            Some(k) if registered => Ok(grid.numeraire[k]),
            _ => Err(SimulationError::UnregisteredDate {
                observable: "numeraire".to_string(),
                date,
            }),
        }
    }

    fn set_numeraire_dates(&mut self, dates: &[Date]) {
        self.calendar.add_numeraire_dates(dates);
    }

    fn clone_numeraire(&self) -> Box<dyn NumeraireSimulator> {
        Box::new(self.clone())
    }
}
