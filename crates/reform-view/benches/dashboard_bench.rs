use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reform_core::{FixMode, RawInputs, RawNumber};
use reform_view::{build_dashboard, SnapshotCache};

fn bench_dashboard(c: &mut Criterion) {
    let inputs = RawInputs {
        mode: FixMode::TotalFixed,
        k_max: RawNumber::Number(0.95),
        k_step: RawNumber::Number(0.01),
        ..RawInputs::default()
    };
    c.bench_function("build_dashboard 96 samples", |b| {
        b.iter(|| black_box(build_dashboard(black_box(&inputs))))
    });

    let mut cache = SnapshotCache::new();
    c.bench_function("snapshot cache hit", |b| {
        b.iter(|| black_box(cache.get_or_build(black_box(&inputs))))
    });
}

criterion_group!(benches, bench_dashboard);
criterion_main!(benches);
