//! Longstaff-Schwartz resolution of early-exercise products.
//!
//! For one early-exercise slot:
//!
//! 1. At each exercise date, the path-wise value of the post-exercise product
//!    (cashflows after the date) is regressed on the factors at that date,
//!    giving the exercise value.
//! 2. Walking backwards from the last exercise date, the value of following
//!    the current stopping rule (underlying cashflows after the value date up
//!    to and including the stop, then the post-exercise cashflows after it)
//!    is regressed the same way to get the continuation value. A path stops
//!    at the date if the holder gains by exercising (long optionality) or the
//!    counterparty does (short).
//! 3. The slot's cashflows are rewritten to follow the final stopping rule:
//!    underlying cashflows in `(value date, stop]`, then post-exercise
//!    cashflows after the stop.

use pricer_core::types::{Cashflow, Date};
use tracing::debug;

use crate::cashflows::SimulatedCashflows;
use crate::error::{RegressionError, ValuationError, ValuationResult};
use crate::portfolio::ExerciseTask;
use crate::regression::{RegressionBasis, RegressionMethod};
use crate::regressors::SimulatedRegressors;

/// Read-only inputs shared by every resolution task.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ExerciseContext<'a> {
    pub(crate) cashflows: &'a SimulatedCashflows,
    pub(crate) regressors: &'a SimulatedRegressors,
    pub(crate) value_date: Date,
    pub(crate) basis: RegressionBasis,
    pub(crate) method: RegressionMethod,
}

/// Resolves one task and returns the replacement cashflows of its slot, one
/// list per path. The stores are not modified.
pub(crate) fn resolve(task: &ExerciseTask, ctx: ExerciseContext<'_>) -> ValuationResult<Vec<Vec<Cashflow>>> {
    let n_paths = ctx.cashflows.n_paths();
    let events = &task.events;

    let date_columns = events
        .iter()
        .map(|e| {
            ctx.regressors
                .date_index(e.date)
                .ok_or(ValuationError::Regression {
                    date: e.date,
                    source: RegressionError::NoFactorsAtDate,
                })
        })
        .collect::<ValuationResult<Vec<usize>>>()?;

    let exercise_values = events
        .iter()
        .enumerate()
        .map(|(j, event)| {
            let target = ctx
                .cashflows
                .pathwise_pv(event.date, &[task.post_exercise_slot(j)]);
            ctx.regressors
                .fit_at(date_columns[j], &target, ctx.basis, ctx.method)
        })
        .collect::<ValuationResult<Vec<Vec<f64>>>>()?;

    let mut stop: Vec<Option<usize>> = vec![None; n_paths];
    for j in (0..events.len()).rev() {
        let event = events[j];
        let target: Vec<f64> = (0..n_paths)
            .map(|path| continuation_pv(task, ctx.cashflows, path, ctx.value_date, stop[path]))
            .collect();
        let continuation = ctx
            .regressors
            .fit_at(date_columns[j], &target, ctx.basis, ctx.method)?;

        let mut exercised = 0usize;
        for (path, stop_at) in stop.iter_mut().enumerate() {
            let cv = continuation[path];
            let ev = exercise_values[j][path];
            let exercise = if event.long_optionality { cv < ev } else { cv > ev };
            if exercise {
                *stop_at = Some(j);
                exercised += 1;
            }
        }
        debug!(slot = task.slot, date = %event.date, exercised, "exercise boundary");
    }

    Ok((0..n_paths)
        .map(|path| stopped_cashflows(task, ctx.cashflows, path, ctx.value_date, stop[path]))
        .collect())
}

/// Value of following the stopping rule: underlying cashflows in
/// `(value_date, stop]` plus post-exercise cashflows after the stop.
fn continuation_pv(
    task: &ExerciseTask,
    cashflows: &SimulatedCashflows,
    path: usize,
    value_date: Date,
    stop: Option<usize>,
) -> f64 {
    let stop_date = stop.map(|k| task.events[k].date);
    let underlying: f64 = cashflows
        .cashflows(task.slot, path)
        .iter()
        .filter(|cf| cf.date > value_date && stop_date.map_or(true, |s| cf.date <= s))
        .map(|cf| cf.amount)
        .sum();
    let post_exercise = match (stop, stop_date) {
        (Some(k), Some(s)) => cashflows.path_pv(path, s, &[task.post_exercise_slot(k)]),
        _ => 0.0,
    };
    underlying + post_exercise
}

/// Underlying cashflows in `(value_date, stop]` followed by post-exercise
/// cashflows after the stop.
fn stopped_cashflows(
    task: &ExerciseTask,
    cashflows: &SimulatedCashflows,
    path: usize,
    value_date: Date,
    stop: Option<usize>,
) -> Vec<Cashflow> {
    let underlying = cashflows.cashflows(task.slot, path).iter().copied();
    match stop {
        None => underlying.filter(|cf| cf.date > value_date).collect(),
        Some(k) => {
            let stop_date = task.events[k].date;
            underlying
                .filter(|cf| cf.date > value_date && cf.date <= stop_date)
                .chain(
                    cashflows
                        .cashflows(task.post_exercise_slot(k), path)
                        .iter()
                        .copied()
                        .filter(|cf| cf.date > stop_date),
                )
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::traits::ExerciseEvent;
    use pricer_core::types::Currency;

    fn d(m: u32) -> Date {
        Date::from_ymd(2026, m, 1).unwrap()
    }

    fn cf(m: u32, amount: f64) -> Cashflow {
        Cashflow::new(d(m), amount, Currency::ZAR)
    }

    fn task(long: bool) -> ExerciseTask {
        ExerciseTask {
            slot: 0,
            events: vec![ExerciseEvent {
                date: d(3),
                post_exercise_index: 0,
                long_optionality: long,
            }],
            post_exercise_slots: vec![1],
        }
    }

    // Path factor equals the payoff of exercising, so the regression is exact.
    fn stores(payoffs: &[f64]) -> (SimulatedCashflows, SimulatedRegressors) {
        let n = payoffs.len();
        let mut cashflows = SimulatedCashflows::new(2, n);
        let mut regressors = SimulatedRegressors::new(vec![d(3)], 1, n);
        for (path, &payoff) in payoffs.iter().enumerate() {
            cashflows.add(0, path, cf(2, 10.0));
            cashflows.add(0, path, cf(6, 1.0));
            cashflows.add(1, path, cf(4, payoff));
            regressors.add(path, 0, 0, payoff);
        }
        (cashflows, regressors)
    }

    fn context<'a>(
        cashflows: &'a SimulatedCashflows,
        regressors: &'a SimulatedRegressors,
    ) -> ExerciseContext<'a> {
        ExerciseContext {
            cashflows,
            regressors,
            value_date: d(1),
            basis: RegressionBasis::Polynomial { order: 1 },
            method: RegressionMethod::Svd,
        }
    }

    // Continuation counts the 10 paid before the exercise date as well, so
    // it is 11 on every path against an exercise value of at most 3.8.
    #[test]
    fn test_long_holder_keeps_underlying_when_continuation_dominates() {
        let payoffs: Vec<f64> = (0..20).map(|i| i as f64 * 0.2).collect();
        let (cashflows, regressors) = stores(&payoffs);
        let rewritten = resolve(&task(true), context(&cashflows, &regressors)).unwrap();
        for path in rewritten {
            let pv: f64 = path.iter().map(|c| c.amount).sum();
            assert_relative_eq!(pv, 11.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_long_holder_exercises_when_payoff_beats_continuation() {
        let payoffs: Vec<f64> = (0..20).map(|i| 8.25 + i as f64 * 0.5).collect();
        let (cashflows, regressors) = stores(&payoffs);
        let rewritten = resolve(&task(true), context(&cashflows, &regressors)).unwrap();
        for (path, &payoff) in payoffs.iter().enumerate() {
            let pv: f64 = rewritten[path].iter().map(|c| c.amount).sum();
            let expected = if payoff > 11.0 { 10.0 + payoff } else { 11.0 };
            assert_relative_eq!(pv, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_short_optionality_minimises() {
        let payoffs: Vec<f64> = (0..20).map(|i| i as f64 * 0.2).collect();
        let (cashflows, regressors) = stores(&payoffs);
        let rewritten = resolve(&task(false), context(&cashflows, &regressors)).unwrap();
        for (path, &payoff) in payoffs.iter().enumerate() {
            let pv: f64 = rewritten[path].iter().map(|c| c.amount).sum();
            // Stopping keeps the 10 paid before the exercise date.
            assert_relative_eq!(pv, 10.0 + payoff, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_coupon_on_exercise_date_stays_with_underlying() {
        let mut cashflows = SimulatedCashflows::new(2, 1);
        cashflows.add(0, 0, cf(2, 10.0));
        cashflows.add(0, 0, cf(3, 2.0));
        cashflows.add(0, 0, cf(6, 1.0));
        cashflows.add(1, 0, cf(3, 7.0));
        cashflows.add(1, 0, cf(4, 5.0));

        let stopped = stopped_cashflows(&task(true), &cashflows, 0, d(1), Some(0));
        assert_eq!(stopped, vec![cf(2, 10.0), cf(3, 2.0), cf(4, 5.0)]);
        assert_relative_eq!(continuation_pv(&task(true), &cashflows, 0, d(1), Some(0)), 17.0);
    }

    #[test]
    fn test_unknown_exercise_date_is_regression_error() {
        let (cashflows, _) = stores(&[1.0, 2.0]);
        let regressors = SimulatedRegressors::new(vec![d(5)], 1, 2);
        let err = resolve(&task(true), context(&cashflows, &regressors)).unwrap_err();
        assert!(err.is_regression());
    }
}
