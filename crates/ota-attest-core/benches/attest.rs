use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ota_attest_core::{attest, Build, BuildId, Release, SigningKey, VersionLedger};

const KEY_PEM: &str = include_str!("../testdata/signing_key.pem");

fn bench_attest(c: &mut Criterion) {
    let key = SigningKey::from_pem(KEY_PEM).unwrap();
    let mut group = c.benchmark_group("attest");
    for size in [1 << 10, 1 << 20, 16 << 20] {
        let artifact = vec![0x5au8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &artifact, |b, artifact| {
            b.iter(|| attest(black_box(artifact), &key).unwrap())
        });
    }
    group.finish();
}

fn bench_next_build(c: &mut Criterion) {
    let releases: Vec<Release> = (0..10_000u64)
        .map(|i| Release {
            seq: i + 1,
            build: Build::new(BuildId::new(format!("build-{}", i)).unwrap(), "1.0.0", (i / 3) as i64),
            package: None,
        })
        .collect();
    let ledger = VersionLedger::from_releases(releases);

    c.bench_function("ledger/next_build", |b| {
        b.iter(|| ledger.next_build(black_box("build-5000")))
    });
}

criterion_group!(benches, bench_attest, bench_next_build);
criterion_main!(benches);
