use corridorweave::generate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_small_masked(c: &mut Criterion) {
    let _ = env_logger::try_init();
    c.bench_function("generate 32x32x1 mask mode", |b| {
        b.iter(|| generate(black_box(32), black_box(32), black_box(1), black_box(7), black_box(60)))
    });
}

fn bench_medium_ocean(c: &mut Criterion) {
    c.bench_function("generate 64x64x1 ocean mode", |b| {
        b.iter(|| generate(black_box(64), black_box(64), black_box(1), black_box(7), black_box(100)))
    });
}

fn bench_multilayer(c: &mut Criterion) {
    c.bench_function("generate 40x40x4 mask mode", |b| {
        b.iter(|| generate(black_box(40), black_box(40), black_box(4), black_box(7), black_box(70)))
    });
}

criterion_group!(benches, bench_small_masked, bench_medium_ocean, bench_multilayer);
criterion_main!(benches);
