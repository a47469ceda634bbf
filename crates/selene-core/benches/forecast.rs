use criterion::{Criterion, black_box, criterion_group, criterion_main};
use selene_core::{Forecaster, SequenceModel};

fn history(n: usize) -> Vec<String> {
    let mut date = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let s = date.format("%Y-%m-%d").to_string();
            date = date
                .checked_add_days(chrono::Days::new(26 + (i % 5) as u64))
                .unwrap();
            s
        })
        .collect()
}

fn bench_predict(c: &mut Criterion) {
    let forecaster = Forecaster::with_model(SequenceModel::untrained(42));
    let sparse = history(4);
    let rich = history(48);

    c.bench_function("predict_sparse_4", |b| {
        b.iter(|| forecaster.predict(black_box(&sparse)))
    });
    c.bench_function("predict_rich_48", |b| {
        b.iter(|| forecaster.predict(black_box(&rich)))
    });
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
