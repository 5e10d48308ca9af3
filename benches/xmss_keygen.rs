use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qrl_xmss::{HashFunction, TraversalStrategy, Xmss, XmssSeed};

static ALG_NAME: &str = "keygen";

fn keygen_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("XMSS_{}", ALG_NAME));
    group.sample_size(10);

    for height in [4u8, 8, 10] {
        for hash_function in [
            HashFunction::Sha2_256,
            HashFunction::Shake128,
            HashFunction::Shake256,
        ] {
            group.bench_function(
                BenchmarkId::new(format!("{}_{:?}", ALG_NAME, hash_function), height),
                |b| {
                    let seed = XmssSeed::random();
                    b.iter(|| {
                        black_box(
                            Xmss::new(&seed, height, hash_function, TraversalStrategy::default())
                                .unwrap(),
                        )
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, keygen_benchmarks);
criterion_main!(benches);
