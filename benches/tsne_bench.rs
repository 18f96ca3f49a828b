//! t-SNE projection benchmarks at vocabulary-sized inputs.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kinbag::Tsne;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn make_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = ChaCha8Rng::seed_from_u64(12345);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-0.05..0.05)).collect())
        .collect()
}

fn bench_tsne(c: &mut Criterion) {
    let mut group = c.benchmark_group("tsne");
    group.sample_size(10);

    for n in [50, 200] {
        let vectors = make_vectors(n, 200);
        let tsne = Tsne::new(30.0, 250, 23);

        group.bench_with_input(BenchmarkId::new("250_iters", n), &vectors, |b, v| {
            b.iter(|| tsne.embed(v));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tsne);
criterion_main!(benches);
