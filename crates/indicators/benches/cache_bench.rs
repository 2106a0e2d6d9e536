//! Benchmarks for the value cache and the cached indicators.
//!
//! Run with: `cargo bench -p ridgeline_indicators`

use std::sync::Arc;

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ridgeline_indicators::{
    Indicator, PivotWindow, PriceIndicator, SharedIndicator, SwingIndicator, ValueCache, EMA, SMA,
};
use ridgeline_types::{BaseBarSeries, Candle, SharedSeries};

const MINUTE_NS: i64 = 60_000_000_000;

fn generate_series(n: usize) -> SharedSeries {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let series = BaseBarSeries::new("bench");
    let mut price = 100.0;
    let mut ts = 1_704_067_200_000_000_000i64;
    for _ in 0..n {
        // -1% .. +1%
        price *= 1.0 + rng.gen_range(-0.01..0.01);
        let high = price * 1.001;
        let low = price * 0.999;
        series
            .add_candle(Candle::from_ohlcv(ts, MINUTE_NS, price, high, low, price, 1.0))
            .unwrap();
        ts += MINUTE_NS;
    }
    series.into_shared()
}

fn bench_value_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("ValueCache");

    let warm = ValueCache::unbounded();
    for index in 0..10_000 {
        warm.put(index, index as f64).unwrap();
    }
    group.bench_function("hit", |b| {
        b.iter(|| warm.get_or_compute(black_box(5_000), |i| i as f64).unwrap());
    });

    for capacity in [64_usize, 1_024] {
        group.throughput(Throughput::Elements(10_000));
        group.bench_with_input(
            BenchmarkId::new("bounded_append", capacity),
            &capacity,
            |b, &capacity| {
                b.iter_batched(
                    || ValueCache::bounded(capacity).unwrap(),
                    |cache| {
                        for index in 0..10_000 {
                            cache.get_or_compute(index, |i| i as f64).unwrap();
                        }
                        cache
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_recursive_ema(c: &mut Criterion) {
    let mut group = c.benchmark_group("RecursiveEMA");

    for size in [1_000_usize, 10_000, 100_000] {
        let series = generate_series(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("cold_deep_read", size), &series, |b, series| {
            b.iter_batched(
                || {
                    let close: SharedIndicator = Arc::new(PriceIndicator::close(Arc::clone(series)));
                    EMA::indicator(close, 20).unwrap()
                },
                |ema| black_box(ema.value(size - 2)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_sma_scan(c: &mut Criterion) {
    let series = generate_series(10_000);
    let close: SharedIndicator = Arc::new(PriceIndicator::close(series));
    let sma = SMA::indicator(close, 50).unwrap();
    for index in 0..10_000 {
        sma.value(index);
    }

    c.bench_function("SMA/warm_scan_10000", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for index in 0..10_000 {
                sum += sma.value(black_box(index));
            }
            sum
        });
    });
}

fn bench_fractal_swing(c: &mut Criterion) {
    let series = generate_series(10_000);
    let window = PivotWindow::new(5, 5, 1).unwrap();

    c.bench_function("FractalSwingHigh/cold_scan_10000", |b| {
        b.iter_batched(
            || {
                let high: SharedIndicator = Arc::new(PriceIndicator::high(Arc::clone(&series)));
                SwingIndicator::recent_fractal_swing_high(high, window).unwrap()
            },
            |swings| black_box(swings.value(9_998)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_value_cache,
    bench_recursive_ema,
    bench_sma_scan,
    bench_fractal_swing
);
criterion_main!(benches);
