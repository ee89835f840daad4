use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mfbox_doe::{Lhs, LhsKind, SamplingMethod};
use ndarray::Array2;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn bench_lhs(c: &mut Criterion) {
    let mut group = c.benchmark_group("doe");
    let dim = 10;
    let mut xlimits = Array2::zeros((dim, 2));
    xlimits.column_mut(1).fill(1.);
    group.bench_function("lhs-classic-500pts-10dim", |b| {
        b.iter(|| {
            let rng = Xoshiro256Plus::seed_from_u64(42);
            black_box(
                Lhs::new(&xlimits)
                    .kind(LhsKind::Classic)
                    .with_rng(rng)
                    .sample(500),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_lhs);
criterion_main!(benches);
