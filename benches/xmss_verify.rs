use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qrl_xmss::{HashFunction, Xmss, XmssSeed};
use rand::rngs::OsRng;
use rand::RngCore;

static ALG_NAME: &str = "verify";

const HEIGHT: u8 = 10;
const BATCH: usize = 64;

fn verify_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("XMSS_{}", ALG_NAME));
    group.sample_size(10);

    let mut xmss = Xmss::fast(&XmssSeed::random(), HEIGHT, HashFunction::Shake128).unwrap();
    let pk = xmss.extended_pk();

    let messages: Vec<[u8; 32]> = (0..BATCH)
        .map(|_| {
            let mut message = [0u8; 32];
            OsRng.fill_bytes(&mut message);
            message
        })
        .collect();
    let signatures: Vec<Vec<u8>> = messages
        .iter()
        .map(|m| xmss.sign(m).unwrap().to_bytes())
        .collect();

    group.bench_function(BenchmarkId::new(ALG_NAME, HEIGHT), |b| {
        b.iter(|| black_box(Xmss::verify(&messages[0], &signatures[0], pk.as_ref())));
    });

    let items: Vec<(&[u8], &[u8], &[u8])> = messages
        .iter()
        .zip(signatures.iter())
        .map(|(m, s)| (&m[..], &s[..], pk.as_ref()))
        .collect();
    group.bench_function(
        BenchmarkId::new(format!("{}_batch_{}", ALG_NAME, BATCH), HEIGHT),
        |b| {
            b.iter(|| black_box(Xmss::verify_batch(&items)));
        },
    );

    group.finish();
}

criterion_group!(benches, verify_benchmarks);
criterion_main!(benches);
