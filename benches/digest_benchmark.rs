//! Content digest benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use r2_uploadr::upload::ContentDigest;

fn benchmark_digest_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_digest");

    for size in [1024, 64 * 1024, 1024 * 1024, 16 * 1024 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(format!("{}_bytes", size), size, |b, &size| {
            let data = vec![0xA5u8; size];
            b.iter(|| ContentDigest::compute(black_box(&data)));
        });
    }

    group.finish();
}

fn benchmark_etag_formatting(c: &mut Criterion) {
    let digest = ContentDigest::compute(b"hello world");
    c.bench_function("etag_quote", |b| b.iter(|| black_box(&digest).etag()));
}

criterion_group!(benches, benchmark_digest_sizes, benchmark_etag_formatting);
criterion_main!(benches);
