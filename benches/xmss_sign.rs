use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qrl_xmss::{HashFunction, TraversalStrategy, Xmss, XmssSeed};
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{Duration, Instant};

static ALG_NAME: &str = "sign";

const HEIGHT: u8 = 10;

fn sign_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("XMSS_{}", ALG_NAME));
    group.sample_size(10);

    for (label, strategy) in [
        ("basic", TraversalStrategy::Basic),
        ("fast", TraversalStrategy::Fast { k: 2 }),
        ("fast_k4", TraversalStrategy::Fast { k: 4 }),
    ] {
        group.bench_function(BenchmarkId::new(format!("{}_{}", ALG_NAME, label), HEIGHT), |b| {
            b.iter_custom(|num_iters| {
                let mut total = Duration::ZERO;
                let mut message = [0u8; 32];

                // 1-time precomputation
                let seed = XmssSeed::random();
                let mut xmss = Xmss::new(&seed, HEIGHT, HashFunction::Shake128, strategy).unwrap();

                for _ in 0..num_iters {
                    // A fresh key once the current one is used up
                    if xmss.remaining_signatures() == 0 {
                        xmss = Xmss::new(&seed, HEIGHT, HashFunction::Shake128, strategy).unwrap();
                    }
                    OsRng.fill_bytes(&mut message);

                    // Start timer
                    let start = Instant::now();

                    // Benchmark
                    black_box(xmss.sign(&message).unwrap());

                    // Stop timer
                    total += start.elapsed();
                }
                total
            });
        });
    }

    group.finish();
}

criterion_group!(benches, sign_benchmarks);
criterion_main!(benches);
