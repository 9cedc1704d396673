use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};
use std::hint::black_box;
use std::sync::Arc;
use table_sync::codec::{decode, encode};
use table_sync::{sanitize_name, validate_key, DefaultMap, MemoryServer, Provider};

fn sample_value(width: usize) -> Value {
    json!({
        "name": "bench",
        "tags": (0..width).map(|i| format!("tag{i}")).collect::<Vec<_>>(),
        "nested": { "scores": (0..width).collect::<Vec<_>>(), "active": true },
    })
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for width in [4, 64, 1024] {
        let value = sample_value(width);
        let stored = encode(&value);
        group.bench_with_input(BenchmarkId::new("encode", width), &value, |b, v| {
            b.iter(|| black_box(encode(v)));
        });
        group.bench_with_input(BenchmarkId::new("decode", width), &stored, |b, s| {
            b.iter(|| black_box(decode(s.clone()).unwrap()));
        });
    }
}

fn bench_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("keys");
    let raw = json!("guild:1234567890");
    group.bench_function("validate", |b| b.iter(|| black_box(validate_key(&raw).unwrap())));
    group.bench_function("sanitize", |b| {
        b.iter(|| black_box(sanitize_name("My Guild Settings (v2)!!")))
    });
}

fn bench_write_through(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("write_through");
    for size in [10, 100, 1000] {
        let provider = Provider::builder(format!("bench_{size}"))
            .connector(MemoryServer::new())
            .build()
            .unwrap();
        rt.block_on(provider.init(Arc::new(DefaultMap::default())))
            .unwrap();

        group.bench_with_input(BenchmarkId::new("set", size), &size, |b, &size| {
            b.iter(|| {
                for i in 0..size {
                    provider.set(format!("k{i}"), json!({ "i": i })).unwrap();
                }
                rt.block_on(provider.flush()).unwrap();
            });
        });
        group.bench_with_input(BenchmarkId::new("set_async", size), &size, |b, &size| {
            b.iter(|| {
                rt.block_on(async {
                    for i in 0..size {
                        provider.set_async(format!("k{i}"), json!({ "i": i })).await.unwrap();
                    }
                })
            });
        });
        group.bench_with_input(BenchmarkId::new("fetch_everything", size), &size, |b, _| {
            b.iter(|| black_box(rt.block_on(provider.fetch_everything()).unwrap()));
        });
        rt.block_on(provider.close()).unwrap();
    }
}

criterion_group!(benches, bench_codec, bench_keys, bench_write_through);
criterion_main!(benches);
