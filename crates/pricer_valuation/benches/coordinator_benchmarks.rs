//! Criterion benchmarks for pricer_valuation.
//!
//! Benchmarks cover:
//! - Forward simulation of a European option, sequential and threaded
//! - Longstaff-Schwartz resolution of a Bermudan option
//! - Cross-sectional regression with both bases

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pricer_core::market_data::curves::FlatCurve;
use pricer_core::traits::PortfolioEntry;
use pricer_core::types::{Currency, Date, MarketObservable};
use pricer_models::products::{BermudanOption, EuropeanOption, OptionType};
use pricer_models::rng::PathRng;
use pricer_models::simulators::EquitySimulator;
use pricer_valuation::regression::fit;
use pricer_valuation::{Coordinator, RegressionBasis, RegressionMethod, ValuationConfig};

fn value_date() -> Date {
    Date::from_ymd(2025, 1, 1).unwrap()
}

fn share() -> MarketObservable {
    MarketObservable::share(Currency::ZAR, "AAA")
}

fn coordinator(n_paths: usize, use_threads: bool) -> Coordinator {
    let curve = FlatCurve::new(value_date(), 0.07, Currency::ZAR);
    let simulator = EquitySimulator::single(share(), 100.0, 0.2, 0.0, curve, 42).unwrap();
    let config = ValuationConfig::builder()
        .n_paths(n_paths)
        .use_threads(use_threads)
        .build()
        .unwrap();
    Coordinator::new(Box::new(simulator), Vec::new(), n_paths)
        .unwrap()
        .with_config(config)
        .unwrap()
}

/// Benchmark forward simulation of a single European option.
fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.sample_size(20);
    let expiry = Date::from_ymd(2026, 1, 1).unwrap();
    let portfolio = [PortfolioEntry::plain(EuropeanOption::new(
        share(),
        OptionType::Call,
        100.0,
        expiry,
    ))];

    for n_paths in [1_000, 10_000] {
        for (label, threaded) in [("sequential", false), ("threaded", true)] {
            let coordinator = coordinator(n_paths, threaded);
            group.bench_with_input(BenchmarkId::new(label, n_paths), &portfolio, |b, portfolio| {
                b.iter(|| coordinator.value(black_box(portfolio), value_date()).unwrap());
            });
        }
    }

    group.finish();
}

/// Benchmark early-exercise resolution with a growing number of exercise dates.
fn bench_early_exercise(c: &mut Criterion) {
    let mut group = c.benchmark_group("early_exercise");
    group.sample_size(10);
    let coordinator = coordinator(5_000, true);

    for n_dates in [4, 12] {
        let dates: Vec<Date> = (1..=n_dates)
            .map(|m| value_date().add_months(m).unwrap())
            .collect();
        let entry = BermudanOption::new(share(), OptionType::Put, 100.0, dates)
            .unwrap()
            .into_entry()
            .unwrap();
        let portfolio = [entry];
        group.bench_with_input(BenchmarkId::new("bermudan_put", n_dates), &portfolio, |b, portfolio| {
            b.iter(|| coordinator.value(black_box(portfolio), value_date()).unwrap());
        });
    }

    group.finish();
}

/// Benchmark a single cross-sectional regression.
fn bench_regression(c: &mut Criterion) {
    let mut group = c.benchmark_group("regression");
    let n_paths = 10_000;
    let mut rng = PathRng::from_seed(1);
    let mut draws = vec![0.0; n_paths];
    rng.fill_normal(&mut draws);
    let factor: Vec<f64> = draws.iter().map(|z| 100.0 * (0.2 * z).exp()).collect();
    let target: Vec<f64> = factor.iter().map(|s| (100.0 - s).max(0.0)).collect();
    let factors = vec![factor];

    for (label, basis) in [
        ("intrinsic_10", RegressionBasis::Intrinsic { buckets: 10 }),
        ("polynomial_3", RegressionBasis::Polynomial { order: 3 }),
    ] {
        let design = basis.design_matrix(&factors, n_paths);
        for method in [RegressionMethod::Svd, RegressionMethod::NormalEquations] {
            let id = BenchmarkId::new(label, format!("{method:?}"));
            group.bench_with_input(id, &design, |b, design| {
                b.iter(|| fit(black_box(design), black_box(&target), method).ok());
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_simulation, bench_early_exercise, bench_regression);
criterion_main!(benches);
