//! Builds simulators and trades from a [`CliConfig`].

use nalgebra::DMatrix;
use pricer_core::market_data::curves::{FlatCurve, FxForwardCurve};
use pricer_core::traits::{NumeraireSimulator, PortfolioEntry, Simulator};
use pricer_core::types::{Cashflow, CurrencyPair, Date, MarketObservable};
use pricer_models::products::{BermudanOption, EuropeanOption, FixedCashflows};
use pricer_models::simulators::{DeterministicCurves, EquitySimulator, ShareProcess};
use pricer_valuation::Coordinator;
use tracing::debug;

use crate::config::{CliConfig, ConfigError, MarketConfig, PortfolioConfig};
use crate::{CliError, Result};

/// Everything a command needs to run a valuation.
pub struct Session {
    pub coordinator: Coordinator,
    pub portfolio: Vec<PortfolioEntry>,
    pub value_date: Date,
    pub forward_dates: Vec<Date>,
    pub percentiles: Vec<f64>,
}

impl Session {
    pub fn from_config(config: &CliConfig) -> Result<Self> {
        let value_date = config.value_date.ok_or(ConfigError::MissingValueDate)?;
        let (numeraire, auxiliary) = simulators(&config.market, value_date)?;
        let coordinator = Coordinator::new(numeraire, auxiliary, config.valuation.n_paths())?
            .with_config(config.valuation.clone())?;
        let portfolio = portfolio(&config.portfolio, &config.market)?;
        debug!(
            trades = portfolio.len(),
            paths = coordinator.n_paths(),
            threads = coordinator.config().worker_threads(),
            "session ready"
        );
        Ok(Self {
            coordinator,
            portfolio,
            value_date,
            forward_dates: config.forward_dates.clone(),
            percentiles: config.percentiles.clone(),
        })
    }

    /// Forward dates, failing when none are configured.
    pub fn require_forward_dates(&self) -> Result<&[Date]> {
        if self.forward_dates.is_empty() {
            return Err(CliError::InvalidArgument(
                "no forward dates: set `forward_dates` in the config file".to_string(),
            ));
        }
        Ok(&self.forward_dates)
    }
}

/// The numeraire simulator and any auxiliary simulators.
///
/// Shares are simulated by a correlated [`EquitySimulator`] that also
/// carries the numeraire. FX rates come from [`DeterministicCurves`], as the
/// numeraire simulator when there are no shares and as an auxiliary
/// simulator otherwise.
pub fn simulators(
    market: &MarketConfig,
    value_date: Date,
) -> Result<(Box<dyn NumeraireSimulator>, Vec<Box<dyn Simulator>>)> {
    let discount = FlatCurve::new(value_date, market.rate, market.currency);
    let curves = fx_curves(market, value_date, discount)?;

    if market.shares.is_empty() {
        return Ok((Box::new(curves), Vec::new()));
    }

    let processes = market
        .shares
        .iter()
        .map(|s| {
            ShareProcess::new(
                MarketObservable::share(market.currency, &s.code),
                s.spot,
                s.volatility,
                s.dividend_yield,
            )
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let correlation = correlation_matrix(market)?;
    let equity = EquitySimulator::new(processes, correlation, discount, market.seed)?;

    let auxiliary: Vec<Box<dyn Simulator>> = if market.fx.is_empty() {
        Vec::new()
    } else {
        vec![Box::new(curves)]
    };
    Ok((Box::new(equity), auxiliary))
}

fn fx_curves(market: &MarketConfig, value_date: Date, discount: FlatCurve) -> Result<DeterministicCurves> {
    let mut curves = DeterministicCurves::new(discount);
    for fx in &market.fx {
        let pair = CurrencyPair::new(fx.currency, market.currency)?;
        let foreign = FlatCurve::new(value_date, fx.rate, fx.currency);
        let forward = FxForwardCurve::new(pair, fx.spot, foreign, discount)
            .map_err(|e| CliError::InvalidArgument(format!("FX {pair}: {e}")))?;
        curves = curves.with_fx_curve(forward)?;
    }
    Ok(curves)
}

fn correlation_matrix(market: &MarketConfig) -> Result<DMatrix<f64>> {
    let n = market.shares.len();
    let Some(rows) = &market.correlation else {
        return Ok(DMatrix::identity(n, n));
    };
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != cols) {
        return Err(CliError::InvalidArgument(
            "correlation rows have different lengths".to_string(),
        ));
    }
    Ok(DMatrix::from_fn(rows.len(), cols, |i, j| rows[i][j]))
}

/// Portfolio entries in config order: European options, Bermudan options,
/// then fixed cashflow strips.
pub fn portfolio(trades: &PortfolioConfig, market: &MarketConfig) -> Result<Vec<PortfolioEntry>> {
    let share = |code: &str| MarketObservable::share(market.currency, code);
    let mut entries = Vec::with_capacity(trades.len());

    for trade in &trades.european {
        let option = EuropeanOption::new(share(&trade.share), trade.option_type, trade.strike, trade.expiry);
        entries.push(PortfolioEntry::plain(option));
    }
    for trade in &trades.bermudan {
        let option = BermudanOption::new(
            share(&trade.share),
            trade.option_type,
            trade.strike,
            trade.exercise_dates.clone(),
        )?
        .with_long_optionality(trade.long_optionality);
        entries.push(option.into_entry()?);
    }
    for trade in &trades.fixed {
        let currency = trade.currency.unwrap_or(market.currency);
        let cashflows = trade
            .cashflows
            .iter()
            .map(|flow| Cashflow::new(flow.date, flow.amount, currency))
            .collect();
        entries.push(PortfolioEntry::plain(FixedCashflows::new(cashflows)));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FxConfig, ShareConfig};
    use approx::assert_relative_eq;
    use pricer_core::types::Currency;

    fn value_date() -> Date {
        Date::from_ymd(2025, 1, 1).unwrap()
    }

    fn market() -> MarketConfig {
        MarketConfig {
            shares: vec![
                ShareConfig {
                    code: "AAA".to_string(),
                    spot: 100.0,
                    volatility: 0.2,
                    dividend_yield: 0.0,
                },
                ShareConfig {
                    code: "BBB".to_string(),
                    spot: 50.0,
                    volatility: 0.3,
                    dividend_yield: 0.01,
                },
            ],
            correlation: Some(vec![vec![1.0, 0.5], vec![0.5, 1.0]]),
            ..MarketConfig::default()
        }
    }

    #[test]
    fn test_ragged_correlation_rejected() {
        let mut market = market();
        market.correlation = Some(vec![vec![1.0, 0.5], vec![0.5]]);
        assert!(matches!(
            simulators(&market, value_date()),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_wrong_size_correlation_is_a_model_error() {
        let mut market = market();
        market.correlation = Some(vec![vec![1.0]]);
        assert!(matches!(simulators(&market, value_date()), Err(CliError::Model(_))));
    }

    #[test]
    fn test_fx_curves_become_auxiliary_with_shares() {
        let mut market = market();
        market.fx = vec![FxConfig {
            currency: Currency::USD,
            spot: 18.0,
            rate: 0.04,
        }];
        let (_, auxiliary) = simulators(&market, value_date()).unwrap();
        assert_eq!(auxiliary.len(), 1);

        market.shares.clear();
        market.correlation = None;
        let (_, auxiliary) = simulators(&market, value_date()).unwrap();
        assert!(auxiliary.is_empty());
    }

    #[test]
    fn test_fixed_strip_values_at_discount_factor() {
        let config = CliConfig::from_toml(
            r#"
            value_date = "2025-01-01"
            [valuation]
            n_paths = 4
            [market]
            rate = 0.05
            [[portfolio.fixed]]
            cashflows = [{ date = "2026-01-01", amount = 100.0 }]
            "#,
        )
        .unwrap();
        let session = Session::from_config(&config).unwrap();
        let value = session
            .coordinator
            .value(&session.portfolio, session.value_date)
            .unwrap();

        let curve = FlatCurve::new(value_date(), 0.05, Currency::ZAR);
        let expected = 100.0 * curve.discount_factor(Date::from_ymd(2026, 1, 1).unwrap()).unwrap();
        assert_relative_eq!(value, expected, epsilon = 1e-10);
    }

    #[test]
    fn test_shipped_config_runs() {
        let mut config = CliConfig::from_toml(include_str!("../neutryx-valuation.toml")).unwrap();
        config.valuation.set_n_paths(200);
        config.valuation.set_threadedness(false, None);
        config.validate().unwrap();

        let session = Session::from_config(&config).unwrap();
        assert_eq!(session.portfolio.len(), 6);
        let epe = session
            .coordinator
            .epe(&session.portfolio, session.value_date, session.require_forward_dates().unwrap())
            .unwrap();
        assert_eq!(epe.len(), 5);
        assert!(epe.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_missing_forward_dates() {
        let config = CliConfig::from_toml(r#"value_date = "2025-01-01""#).unwrap();
        let session = Session::from_config(&config).unwrap();
        assert!(matches!(
            session.require_forward_dates(),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
