use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sympto_core::{RawObservation, analyze, chart_data};

/// A biphasic window of `len` days with bleeding on the first four.
fn window(len: usize) -> Vec<RawObservation> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..len)
        .map(|i| {
            let date = start + Days::new(i as u64);
            let temp = if i % 28 < 14 { 36.2 } else { 36.7 } + (i % 3) as f64 * 0.02;
            let obs = RawObservation::new(date.to_string()).with_temperature(temp);
            if i % 28 < 4 {
                obs.with_menstruation("medium")
            } else {
                obs
            }
        })
        .collect()
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for len in [30usize, 90, 365] {
        let obs = window(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &obs, |b, obs| {
            b.iter(|| analyze(black_box(obs), None));
        });
    }

    group.finish();
}

fn bench_chart(c: &mut Criterion) {
    let days = match analyze(&window(90), None) {
        Ok(analysis) => analysis.days,
        Err(_) => return,
    };
    c.bench_function("chart_data_90", |b| b.iter(|| chart_data(black_box(&days))));
}

criterion_group!(benches, bench_analyze, bench_chart);
criterion_main!(benches);
