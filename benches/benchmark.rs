use option_pricer::{ bs, mc, mc_par, MarketParams, PathRng };
use criterion::{ criterion_group, criterion_main, Criterion };

const START_SPOT: i32 = 50;
const END_SPOT: i32 = 162;
const STRIKE: f64 = 110.0;
const YEARS_TO_EXPIRY: f64 = 0.5;
const RISK_FREE_RATE: f64 = 0.05;
const VOLATILITY: f64 = 0.25;

fn market(spot: i32) -> MarketParams {
    MarketParams::call(spot as f64, STRIKE, RISK_FREE_RATE, VOLATILITY, YEARS_TO_EXPIRY)
}

fn criterion_benchmark_analytic(c: &mut Criterion) {
    c.bench_function("black scholes price and greeks", |b| b.iter(|| {
        for spot in START_SPOT..END_SPOT {
            _ = bs::price(&market(spot));
        }
    }));
}

fn criterion_benchmark_10000(c: &mut Criterion) {
    let mut rng = PathRng::from_entropy();

    c.bench_function("monte carlo 10000", |b| b.iter(|| {
        for spot in START_SPOT..END_SPOT {
            _ = mc::price_monte_carlo(&market(spot), 10_000, &mut rng);
        }
    }));

    c.bench_function("monte carlo par 10000", |b| b.iter(|| {
        for spot in START_SPOT..END_SPOT {
            _ = mc_par::price_monte_carlo_par(&market(spot), 10_000, &mut rng);
        }
    }));
}

fn criterion_benchmark_1000000(c: &mut Criterion) {
    let mut rng = PathRng::from_entropy();
    let atm = market(110);

    let mut group = c.benchmark_group("one million paths");
    group.sample_size(10);
    group.bench_function("monte carlo", |b| b.iter(|| mc::price_monte_carlo(&atm, 1_000_000, &mut rng)));
    group.bench_function("monte carlo par", |b| b.iter(|| mc_par::price_monte_carlo_par(&atm, 1_000_000, &mut rng)));
    group.finish();
}

criterion_group!(benches, criterion_benchmark_analytic, criterion_benchmark_10000, criterion_benchmark_1000000);
criterion_main!(benches);
