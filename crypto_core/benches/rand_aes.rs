use criterion::{criterion_group, criterion_main, Criterion};
use crypto_core::{AesRng, Block};
use rand::Rng;

fn bench_rand(c: &mut Criterion) {
    c.bench_function("AesRng::rand", |b| {
        let mut rng = AesRng::new();
        b.iter(|| {
            let block = rng.gen::<Block>();
            criterion::black_box(block)
        });
    });
}

fn bench_gen_blocks(c: &mut Criterion) {
    c.bench_function("AesRng::gen_blocks_1024", |b| {
        let mut rng = AesRng::new();
        b.iter(|| {
            let blocks = rng.gen_blocks(1024);
            criterion::black_box(blocks)
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_rand, bench_gen_blocks
}
criterion_main!(benches);
