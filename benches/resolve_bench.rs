//! Benchmarks for label resolution and tagging
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use friendly_tagger::index::{MappingRow, TemporalLabelIndex};
use friendly_tagger::record::Metric;
use friendly_tagger::source::StaticLabelSource;
use friendly_tagger::tagger::{AttributeSpec, TaggingEngine};

/// `codes` ASNs, each renamed `versions` times, ascending by time
fn create_rows(codes: usize, versions: usize) -> Vec<MappingRow> {
    let mut rows = Vec::with_capacity(codes * versions);
    for v in 0..versions {
        for c in 0..codes {
            rows.push(MappingRow::new(
                c.to_string(),
                format!("AS{} v{}", c, v),
                v as i64 * 1_000_000,
            ));
        }
    }
    rows
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for codes in [1_000, 10_000, 100_000] {
        let rows = create_rows(codes, 3);
        group.throughput(Throughput::Elements(rows.len() as u64));

        group.bench_function(format!("build_{}", codes), |b| {
            b.iter(|| TemporalLabelIndex::build("asn", "asn_label", black_box(rows.clone())))
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let index = TemporalLabelIndex::build("asn", "asn_label", create_rows(10_000, 5));

    group.bench_function("latest", |b| {
        b.iter(|| index.resolve(black_box("4242"), black_box(10_000_000)))
    });

    group.bench_function("oldest", |b| {
        b.iter(|| index.resolve(black_box("4242"), black_box(0)))
    });

    group.bench_function("miss", |b| {
        b.iter(|| index.resolve(black_box("not-an-asn"), black_box(10_000_000)))
    });

    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    let mut engine = TaggingEngine::new(u64::MAX);
    engine
        .configure(vec![AttributeSpec::new(
            "asn",
            "asn_label",
            StaticLabelSource::new(create_rows(10_000, 3)),
        )])
        .unwrap();
    engine.reload(1).unwrap();

    let batch: Vec<Metric> = (0..1000)
        .map(|i| {
            Metric::new("traffic", 5_000_000)
                .tag("asn", (i % 10_000).to_string())
                .tag("continent_code", "OC")
        })
        .collect();

    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("batch_1000", |b| {
        b.iter(|| {
            let mut records = batch.clone();
            engine.apply(black_box(&mut records))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_resolve, bench_apply);
criterion_main!(benches);
