//! The valuation coordinator.
//!
//! A valuation call runs the same pipeline whatever the requested output:
//!
//! 1. expand the portfolio (early-exercise entries append their
//!    post-exercise products) and collect the date sets
//! 2. map every required observable, including the FX pairs of foreign
//!    cashflows, to exactly one simulator
//! 3. register dates on a private copy of the simulators and prepare them
//! 4. simulate paths in contiguous chunks, each chunk on its own copy of the
//!    prepared simulators and products
//! 5. resolve early exercise, one task per early-exercise entry
//! 6. regress forward values on the underlying factors, one task per
//!    forward date
//!
//! Phases run one after the other; within a phase, work items write to
//! disjoint ranges of the result stores.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use pricer_core::traits::{NumeraireSimulator, PortfolioEntry, Product, Simulator};
use pricer_core::types::{Cashflow, Currency, CurrencyPair, Date, MarketObservable, SimulationError};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::cashflows::{CashflowBlock, SimulatedCashflows};
use crate::config::ValuationConfig;
use crate::early_exercise::{self, ExerciseContext};
use crate::error::{ConfigurationError, RegressionError, ValuationError, ValuationResult};
use crate::exposure::ExposureCalculator;
use crate::parallel::{partition, ParallelExecutor};
use crate::portfolio::PreparedPortfolio;
use crate::providers::SimulatorSet;
use crate::regressors::{RegressorBlock, SimulatedRegressors};

/// Path-wise diagnostics of a valuation with forward dates.
///
/// Path-indexed tables are laid out `[path][forward date]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuePaths {
    /// Forward dates, in the order requested
    pub forward_dates: Vec<Date>,
    /// Regressed portfolio value at each forward date
    pub regressed_forward_values: Vec<Vec<f64>>,
    /// Realised value of the cashflows after each forward date
    pub forward_cashflow_pvs: Vec<Vec<f64>>,
    /// Underlying factor realisations, `[factor][path][forward date]`
    pub factor_paths: Vec<Vec<Vec<f64>>>,
}

/// Values portfolios by forward Monte Carlo simulation.
///
/// The coordinator owns template simulators. Every valuation call works on
/// deep copies, so the templates are never mutated and calls are
/// independent of each other.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::curves::FlatCurve;
/// use pricer_core::traits::PortfolioEntry;
/// use pricer_core::types::{Cashflow, Currency, Date};
/// use pricer_models::products::FixedCashflows;
/// use pricer_models::simulators::DeterministicCurves;
/// use pricer_valuation::Coordinator;
///
/// let value_date = Date::from_ymd(2025, 1, 1).unwrap();
/// let pay_date = Date::from_ymd(2026, 1, 1).unwrap();
/// let curve = FlatCurve::new(value_date, 0.05, Currency::ZAR);
///
/// let coordinator = Coordinator::new(Box::new(DeterministicCurves::new(curve)), Vec::new(), 10).unwrap();
/// let bond = FixedCashflows::new(vec![Cashflow::new(pay_date, 100.0, Currency::ZAR)]);
/// let value = coordinator.value(&[PortfolioEntry::plain(bond)], value_date).unwrap();
///
/// assert!((value - 100.0 * curve.discount_factor(pay_date).unwrap()).abs() < 1e-10);
/// ```
#[derive(Clone, Debug)]
pub struct Coordinator {
    simulators: SimulatorSet,
    config: ValuationConfig,
}

impl Coordinator {
    /// Creates a coordinator with default settings and `n_paths` paths.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidPathCount` if `n_paths` is 0 or too large.
    pub fn new(
        numeraire: Box<dyn NumeraireSimulator>,
        auxiliary: Vec<Box<dyn Simulator>>,
        n_paths: usize,
    ) -> Result<Self, ConfigurationError> {
        let config = ValuationConfig::builder().n_paths(n_paths).build()?;
        Ok(Self {
            simulators: SimulatorSet::new(numeraire, auxiliary),
            config,
        })
    }

    /// Replaces all settings, path count included.
    pub fn with_config(mut self, config: ValuationConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Enables or disables threading. `max_threads` caps the worker count;
    /// `None` keeps the current cap.
    pub fn set_threadedness(
        &mut self,
        use_threads: bool,
        max_threads: Option<usize>,
    ) -> Result<(), ConfigurationError> {
        if max_threads == Some(0) {
            return Err(ConfigurationError::InvalidThreadCount(0));
        }
        self.config.set_threadedness(use_threads, max_threads);
        Ok(())
    }

    /// Number of simulated paths.
    pub fn n_paths(&self) -> usize {
        self.config.n_paths()
    }

    /// Current settings.
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value of the portfolio at `value_date`: the mean over paths of the
    /// deflated cashflows paid after `value_date`.
    pub fn value(&self, portfolio: &[PortfolioEntry], value_date: Date) -> ValuationResult<f64> {
        let run = self.calculate(portfolio, value_date, &[])?;
        let pvs = run
            .cashflows
            .pathwise_pv(value_date, &run.portfolio.original_slots);
        let value = pvs.iter().sum::<f64>() / pvs.len() as f64;
        info!(%value_date, value, "valuation complete");
        Ok(value)
    }

    /// Value of a single product.
    pub fn value_product(&self, product: &dyn Product, value_date: Date) -> ValuationResult<f64> {
        self.value(&[PortfolioEntry::Plain(product.clone_box())], value_date)
    }

    /// Expected positive exposure at each forward date.
    pub fn epe(
        &self,
        portfolio: &[PortfolioEntry],
        value_date: Date,
        forward_dates: &[Date],
    ) -> ValuationResult<Vec<f64>> {
        let run = self.calculate(portfolio, value_date, forward_dates)?;
        Ok(ExposureCalculator::expected_positive_exposure(&run.regressed))
    }

    /// Potential future exposure, `[forward date][percentile]`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidPercentile` for a percentile outside
    /// `[0, 1]`, before anything is simulated.
    pub fn pfe(
        &self,
        portfolio: &[PortfolioEntry],
        value_date: Date,
        forward_dates: &[Date],
        percentiles: &[f64],
    ) -> ValuationResult<Vec<Vec<f64>>> {
        if let Some(&p) = percentiles.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ConfigurationError::InvalidPercentile(p).into());
        }
        let run = self.calculate(portfolio, value_date, forward_dates)?;
        Ok(ExposureCalculator::potential_future_exposure(
            &run.regressed,
            percentiles,
        ))
    }

    /// Regressed forward values, realised forward cashflow values and
    /// factor realisations on every path.
    pub fn value_paths(
        &self,
        portfolio: &[PortfolioEntry],
        value_date: Date,
        forward_dates: &[Date],
    ) -> ValuationResult<ValuePaths> {
        let run = self.calculate(portfolio, value_date, forward_dates)?;
        let originals = &run.portfolio.original_slots;
        let realised: Vec<Vec<f64>> = forward_dates
            .iter()
            .map(|&d| run.cashflows.pathwise_pv(d, originals))
            .collect();
        let factor_paths = (0..run.regressors.n_factors())
            .map(|f| run.regressors.factor_paths(f, forward_dates))
            .collect();
        let n_paths = run.cashflows.n_paths();
        Ok(ValuePaths {
            forward_dates: forward_dates.to_vec(),
            regressed_forward_values: transpose(&run.regressed, n_paths),
            forward_cashflow_pvs: transpose(&realised, n_paths),
            factor_paths,
        })
    }

    fn calculate(
        &self,
        entries: &[PortfolioEntry],
        value_date: Date,
        forward_dates: &[Date],
    ) -> ValuationResult<Simulation> {
        let n_paths = self.config.n_paths();
        let span = info_span!("valuation", %value_date, n_paths, entries = entries.len());
        let _guard = span.enter();

        let portfolio = PreparedPortfolio::new(entries, value_date, forward_dates)?;
        let currency = portfolio.valuation_currency(self.simulators.numeraire().numeraire_currency())?;
        let fx_pairs = portfolio.fx_pairs(currency);
        let providers = self
            .simulators
            .associate(&portfolio.required_observables(&fx_pairs))?;
        let fx: BTreeMap<Currency, (MarketObservable, usize)> = fx_pairs
            .into_iter()
            .map(|(c, pair)| {
                let observable = MarketObservable::CurrencyPair(pair);
                match providers.get(&observable) {
                    Some(&slot) => Ok((c, (observable, slot))),
                    None => Err(ConfigurationError::MissingProvider { observable }),
                }
            })
            .collect::<Result<_, _>>()?;
        debug!(
            slots = portfolio.n_slots(),
            observables = providers.len(),
            dates = portfolio.all_dates.len(),
            "portfolio prepared"
        );

        let mut simulators = self.simulators.clone();
        prepare_simulators(&mut simulators, &portfolio, &providers, &fx)?;
        let factor_counts = probe_factor_counts(&simulators, &portfolio.regression_dates)?;

        let executor = ParallelExecutor::from_config(&self.config)?;
        let mut cashflows = SimulatedCashflows::new(portfolio.n_slots(), n_paths);
        let mut regressors = SimulatedRegressors::new(
            portfolio.regression_dates.clone(),
            factor_counts.iter().sum(),
            n_paths,
        );

        let started = Instant::now();
        let parallel = executor.should_parallelize(n_paths, self.config.simulation_threshold());
        if self.config.use_threads() && !parallel {
            warn!(
                n_paths,
                threshold = self.config.simulation_threshold(),
                "path count below threading threshold, simulating on one thread"
            );
        }
        let ranges = if parallel {
            partition(n_paths, executor.threads())
        } else {
            partition(n_paths, 1)
        };
        let context = PathContext {
            portfolio: &portfolio,
            providers: &providers,
            fx: &fx,
            currency,
            factor_counts: &factor_counts,
        };
        let blocks: Vec<_> = cashflows
            .blocks_mut(&ranges)
            .into_iter()
            .zip(regressors.blocks_mut(&ranges))
            .collect();
        executor.try_map(blocks, parallel, |(cashflow_block, regressor_block)| {
            context.simulate_block(
                simulators.clone(),
                portfolio.products.clone(),
                cashflow_block,
                regressor_block,
            )
        })?;
        debug!(
            chunks = ranges.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "simulation complete"
        );

        if !portfolio.exercise_tasks.is_empty() {
            let started = Instant::now();
            let exercise_context = ExerciseContext {
                cashflows: &cashflows,
                regressors: &regressors,
                value_date,
                basis: self.config.regression_basis(),
                method: self.config.regression_method(),
            };
            let tasks: Vec<_> = portfolio.exercise_tasks.iter().collect();
            let parallel = executor.should_parallelize(tasks.len(), 2);
            let updates = executor.try_map(tasks, parallel, |task| {
                early_exercise::resolve(task, exercise_context).map(|rewritten| (task.slot, rewritten))
            })?;
            for (slot, rewritten) in updates {
                cashflows.update(slot, rewritten);
            }
            debug!(
                tasks = portfolio.exercise_tasks.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "early exercise resolved"
            );
        }

        let regressed = if forward_dates.is_empty() {
            Vec::new()
        } else {
            let started = Instant::now();
            let parallel =
                executor.should_parallelize(forward_dates.len(), self.config.regression_threshold());
            let basis = self.config.regression_basis();
            let method = self.config.regression_method();
            let values = executor.try_map(forward_dates.to_vec(), parallel, |date| {
                let column = regressors.date_index(date).ok_or(ValuationError::Regression {
                    date,
                    source: RegressionError::NoFactorsAtDate,
                })?;
                let target = cashflows.pathwise_pv(date, &portfolio.original_slots);
                regressors.fit_at(column, &target, basis, method)
            })?;
            debug!(
                forward_dates = forward_dates.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "forward values regressed"
            );
            values
        };

        Ok(Simulation {
            portfolio,
            cashflows,
            regressors,
            regressed,
        })
    }
}

/// Everything a valuation call produces; reduced by the public methods.
struct Simulation {
    portfolio: PreparedPortfolio,
    cashflows: SimulatedCashflows,
    regressors: SimulatedRegressors,
    // [forward date][path]
    regressed: Vec<Vec<f64>>,
}

/// Registers all query dates and prepares every simulator.
fn prepare_simulators(
    simulators: &mut SimulatorSet,
    portfolio: &PreparedPortfolio,
    providers: &HashMap<MarketObservable, usize>,
    fx: &BTreeMap<Currency, (MarketObservable, usize)>,
) -> Result<(), ConfigurationError> {
    let all_dates = &portfolio.all_dates;
    for slot in 0..simulators.len() {
        simulators.get_mut(slot).reset();
    }

    for (index, dates) in portfolio.requirements.iter().flatten() {
        if let Some(&slot) = providers.get(index) {
            let simulator = simulators.get_mut(slot);
            simulator.set_required_dates(index, dates);
            simulator.set_required_dates(index, all_dates);
        }
    }

    let numeraire = simulators.numeraire_mut();
    for dates in portfolio.cashflow_dates.values() {
        numeraire.set_numeraire_dates(dates);
    }
    numeraire.set_numeraire_dates(all_dates);

    for (currency, (observable, slot)) in fx {
        let simulator = simulators.get_mut(*slot);
        if let Some(dates) = portfolio.cashflow_dates.get(currency) {
            simulator.set_required_dates(observable, dates);
        }
        simulator.set_required_dates(observable, all_dates);
    }

    for slot in 0..simulators.len() {
        let simulator = simulators.get_mut(slot);
        simulator.set_factor_dates(all_dates);
        simulator
            .prepare(portfolio.value_date)
            .map_err(|source| ConfigurationError::Preparation {
                simulator: slot,
                source,
            })?;
    }
    Ok(())
}

/// Runs path 0 on a copy to learn how many factors each simulator reports.
fn probe_factor_counts(
    simulators: &SimulatorSet,
    regression_dates: &[Date],
) -> ValuationResult<Vec<usize>> {
    let Some(&date) = regression_dates.first() else {
        return Ok(vec![0; simulators.len()]);
    };
    let mut probe = simulators.clone();
    (0..probe.len())
        .map(|slot| {
            let simulator = probe.get_mut(slot);
            simulator.run_simulation(0).map_err(|source| path_error(0, source))?;
            let factors = simulator
                .underlying_factors(date)
                .map_err(|source| path_error(0, source))?;
            Ok(factors.len())
        })
        .collect()
}

fn path_error(path: usize, source: SimulationError) -> ValuationError {
    ValuationError::Simulation { path, source }
}

fn transpose(columns: &[Vec<f64>], n_rows: usize) -> Vec<Vec<f64>> {
    (0..n_rows)
        .map(|row| columns.iter().map(|column| column[row]).collect())
        .collect()
}

/// Read-only inputs of the simulation phase.
struct PathContext<'a> {
    portfolio: &'a PreparedPortfolio,
    providers: &'a HashMap<MarketObservable, usize>,
    fx: &'a BTreeMap<Currency, (MarketObservable, usize)>,
    currency: Option<Currency>,
    factor_counts: &'a [usize],
}

impl PathContext<'_> {
    fn simulate_block(
        &self,
        mut simulators: SimulatorSet,
        mut products: Vec<Box<dyn Product>>,
        mut cashflows: CashflowBlock<'_>,
        mut regressors: RegressorBlock<'_>,
    ) -> ValuationResult<()> {
        for path in cashflows.paths() {
            for slot in 0..simulators.len() {
                simulators
                    .get_mut(slot)
                    .run_simulation(path)
                    .map_err(|source| path_error(path, source))?;
            }
            self.record_factors(&simulators, path, &mut regressors)?;

            for (slot, product) in products.iter_mut().enumerate() {
                let deflated = self.product_cashflows(&simulators, product.as_mut(), slot, path)?;
                cashflows.set(slot, path, deflated);
            }
        }
        Ok(())
    }

    fn record_factors(
        &self,
        simulators: &SimulatorSet,
        path: usize,
        regressors: &mut RegressorBlock<'_>,
    ) -> ValuationResult<()> {
        for (column, &date) in self.portfolio.regression_dates.iter().enumerate() {
            let row = regressors.row_mut(path, column);
            let mut offset = 0;
            for (slot, &expected) in self.factor_counts.iter().enumerate() {
                let factors = simulators
                    .get(slot)
                    .underlying_factors(date)
                    .map_err(|source| path_error(path, source))?;
                if factors.len() != expected {
                    return Err(ConfigurationError::FactorCountMismatch {
                        simulator: slot,
                        date,
                        expected,
                        actual: factors.len(),
                    }
                    .into());
                }
                if factors.iter().any(|f| !f.is_finite()) {
                    return Err(ValuationError::NumericalFailure {
                        path,
                        detail: format!("underlying factor of simulator {slot} at {date}"),
                    });
                }
                row[offset..offset + expected].copy_from_slice(&factors);
                offset += expected;
            }
        }
        Ok(())
    }

    fn product_cashflows(
        &self,
        simulators: &SimulatorSet,
        product: &mut dyn Product,
        slot: usize,
        path: usize,
    ) -> ValuationResult<Vec<Cashflow>> {
        product.reset();
        for (index, dates) in &self.portfolio.requirements[slot] {
            let provider = self.providers.get(index).copied().ok_or_else(|| {
                ConfigurationError::MissingProvider {
                    observable: index.clone(),
                }
            })?;
            let values = simulators
                .get(provider)
                .indices(index, dates)
                .map_err(|source| path_error(path, source))?;
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ValuationError::NumericalFailure {
                    path,
                    detail: format!("{index} from simulator {provider}"),
                });
            }
            product.set_index_values(index, &values);
        }

        let value_date = self.portfolio.value_date;
        let numeraire = simulators.numeraire();
        let numeraire_at_value = numeraire
            .numeraire(value_date)
            .map_err(|source| path_error(path, source))?;

        product
            .cashflows()
            .map_err(|source| path_error(path, source))?
            .into_iter()
            .filter(|cf| cf.date > value_date)
            .map(|cf| {
                let fx = self.fx_rate(simulators, &cf, path)?;
                let deflator = numeraire
                    .numeraire(cf.date)
                    .map_err(|source| path_error(path, source))?;
                let amount = cf.amount * fx * numeraire_at_value / deflator;
                if !amount.is_finite() {
                    return Err(ValuationError::NumericalFailure {
                        path,
                        detail: format!("cashflow of product {slot} on {}", cf.date),
                    });
                }
                Ok(Cashflow::new(cf.date, amount, self.currency.unwrap_or(cf.currency)))
            })
            .collect()
    }

    fn fx_rate(&self, simulators: &SimulatorSet, cf: &Cashflow, path: usize) -> ValuationResult<f64> {
        if self.currency == Some(cf.currency) {
            return Ok(1.0);
        }
        let Some((observable, slot)) = self.fx.get(&cf.currency) else {
            return Err(match self.currency {
                Some(domestic) => ConfigurationError::MissingProvider {
                    observable: CurrencyPair::new(cf.currency, domestic).map_or_else(
                        |_| MarketObservable::Custom(format!("{}{}", cf.currency, domestic)),
                        MarketObservable::CurrencyPair,
                    ),
                },
                None => ConfigurationError::UnresolvedNumeraireCurrency {
                    currencies: vec![cf.currency],
                },
            }
            .into());
        };
        let rates = simulators
            .get(*slot)
            .indices(observable, &[cf.date])
            .map_err(|source| path_error(path, source))?;
        Ok(rates.first().copied().unwrap_or(f64::NAN))
    }
}
