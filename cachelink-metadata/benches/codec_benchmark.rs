use bytes::BytesMut;
use cachelink_metadata::{codec, EntryVersion, Metadata};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn samples() -> Vec<(&'static str, Metadata)> {
    vec![
        ("empty", Metadata::new()),
        (
            "numeric",
            Metadata::builder().version(EntryVersion::numeric(42)).build(),
        ),
        (
            "clustered_lifespan",
            Metadata::builder()
                .version(EntryVersion::clustered(7, 42))
                .lifespan_millis(5_000)
                .build(),
        ),
        (
            "full_width",
            Metadata::builder()
                .version(EntryVersion::clustered(i32::MIN, i64::MIN))
                .lifespan_millis(i64::MAX)
                .max_idle_millis(i64::MAX)
                .build(),
        ),
    ]
}

/// A reproducible mix of metadata shapes, as a replication stream would carry.
fn random_mix(len: usize) -> Vec<Metadata> {
    fn millis(rng: &mut fastrand::Rng) -> i64 {
        match rng.u8(0..3) {
            0 => -1,
            1 => rng.i64(0..60_000),
            _ => rng.i64(0..=i64::MAX),
        }
    }

    let mut rng = fastrand::Rng::with_seed(0x5eed);
    (0..len)
        .map(|_| {
            let version = match rng.u8(0..3) {
                0 => None,
                1 => Some(EntryVersion::numeric(rng.i64(..))),
                _ => Some(EntryVersion::clustered(rng.i32(0..1_000), rng.i64(0..1 << 40))),
            };
            Metadata::builder()
                .maybe_version(version)
                .lifespan_millis(millis(&mut rng))
                .max_idle_millis(millis(&mut rng))
                .build()
        })
        .collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for (name, metadata) in samples() {
        group.bench_with_input(BenchmarkId::new("bytes", name), &metadata, |b, metadata| {
            b.iter(|| codec::encode(black_box(metadata)));
        });

        group.bench_with_input(BenchmarkId::new("reused_buffer", name), &metadata, |b, metadata| {
            let mut buf = BytesMut::with_capacity(64);
            b.iter(|| {
                buf.clear();
                codec::encode_into(black_box(metadata), &mut buf);
            });
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (name, metadata) in samples() {
        let bytes = codec::encode(&metadata);
        group.bench_with_input(BenchmarkId::new("decode", name), &bytes, |b, bytes| {
            b.iter(|| codec::decode(black_box(bytes)).unwrap());
        });
    }

    // Unknown fields from a newer writer must be skipped.
    let mut extended = codec::encode(&samples()[2].1).to_vec();
    extended.extend_from_slice(&[0x2a, 0x03, b'n', b'e', b'w', 0x30, 0x01]);
    group.bench_function("decode/with_unknown_fields", |b| {
        b.iter(|| codec::decode(black_box(&extended)).unwrap());
    });

    group.finish();
}

fn bench_random_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_mix");

    for len in [100usize, 1_000].iter() {
        let batch = random_mix(*len);
        let encoded: Vec<_> = batch.iter().map(codec::encode).collect();

        group.bench_with_input(BenchmarkId::new("encode", len), &batch, |b, batch| {
            let mut buf = BytesMut::with_capacity(32 * batch.len());
            b.iter(|| {
                buf.clear();
                for metadata in batch {
                    codec::encode_into(black_box(metadata), &mut buf);
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("decode", len), &encoded, |b, encoded| {
            b.iter(|| {
                for bytes in encoded {
                    black_box(codec::decode(black_box(bytes)).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_random_mix);
criterion_main!(benches);
