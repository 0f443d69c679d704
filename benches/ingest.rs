use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tickstore::conf::{AggMethod, RollupRule, WritePathConfig};
use tickstore::mdata::{MemoryStore, MetricStore, SeriesSink};

fn bench_series_add(c: &mut Criterion) {
    let store = MemoryStore::new(WritePathConfig::default());
    let series = store.get_or_create("1.raw", "bench.raw", 0, 0);
    let mut ts = 0u32;
    c.bench_function("raw_add", |b| {
        b.iter(|| {
            ts += 10;
            series.add(black_box(ts), black_box(1.5));
        })
    });
}

fn bench_aggregated_add(c: &mut Criterion) {
    let config = WritePathConfig {
        chunk_span: 600,
        rollups: vec![RollupRule {
            name: "default".to_string(),
            pattern: "*".to_string(),
            spans: vec![60, 600],
            methods: vec![AggMethod::Avg, AggMethod::Min, AggMethod::Max],
        }],
    };
    let store = MemoryStore::new(config);
    let series = store.get_or_create("1.agg", "bench.aggregated", 0, 0);
    let mut ts = 0u32;
    c.bench_function("aggregated_add", |b| {
        b.iter(|| {
            ts += 10;
            series.add(black_box(ts), black_box(1.5));
        })
    });
}

criterion_group!(benches, bench_series_add, bench_aggregated_add);
criterion_main!(benches);
