use arena_strmap::{Arena, Payload, StrMap, StrMultiMap, StrSet};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_map_insert_transient_100k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(1).take(100_000).map(key).collect();
    c.bench_function("str_map::insert_transient_100k", |b| {
        b.iter_batched(
            Arena::new,
            |arena| {
                let mut m = StrMap::new(&arena, 1).unwrap();
                for k in &keys {
                    m.insert(Payload::Transient(k.as_bytes()), Payload::Transient(b"v"))
                        .unwrap();
                }
                black_box(m.len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_map_insert_static_100k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(2).take(100_000).map(key).collect();
    c.bench_function("str_map::insert_static_100k", |b| {
        b.iter_batched(
            Arena::new,
            |arena| {
                let mut m = StrMap::new(&arena, 1).unwrap();
                for k in &keys {
                    m.insert(Payload::Static(k.as_bytes()), Payload::Static(b"v"))
                        .unwrap();
                }
                black_box(m.len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_map_get_hit_miss(c: &mut Criterion) {
    let keys: Vec<String> = lcg(3).take(100_000).map(key).collect();
    let misses: Vec<String> = lcg(0xdead_beef).take(10_000).map(key).collect();
    let arena = Arena::new();
    let mut m = StrMap::new(&arena, 1).unwrap();
    for k in &keys {
        m.insert(Payload::Static(k.as_bytes()), Payload::Static(b"v"))
            .unwrap();
    }
    c.bench_function("str_map::get_hit_10k", |b| {
        b.iter(|| {
            for k in keys.iter().take(10_000) {
                black_box(m.get(k.as_bytes()));
            }
        })
    });
    c.bench_function("str_map::get_miss_10k", |b| {
        b.iter(|| {
            for k in &misses {
                black_box(m.get(k.as_bytes()));
            }
        })
    });
}

// Delete/insert churn exercises tombstone purges and free-list reuse.
fn bench_map_churn(c: &mut Criterion) {
    let keys: Vec<String> = lcg(4).take(20_000).map(key).collect();
    c.bench_function("str_map::churn_20k", |b| {
        b.iter_batched(
            Arena::new,
            |arena| {
                let mut m = StrMap::new(&arena, 1).unwrap();
                for pair in keys.chunks(2) {
                    for k in pair {
                        m.insert(Payload::Static(k.as_bytes()), Payload::Static(b"v"))
                            .unwrap();
                    }
                    m.delete(pair[0].as_bytes());
                }
                black_box(m.len());
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_set_iterate_100k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(5).take(100_000).map(key).collect();
    let arena = Arena::new();
    let mut s = StrSet::new(&arena, 1).unwrap();
    for k in &keys {
        s.insert(Payload::Static(k.as_bytes())).unwrap();
    }
    c.bench_function("str_set::iterate_100k", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for v in s.iter() {
                n += v.len();
            }
            black_box(n)
        })
    });
}

fn bench_multimap_insert_100k(c: &mut Criterion) {
    let keys: Vec<String> = lcg(6).take(1_000).map(key).collect();
    c.bench_function("str_multimap::insert_100x1k", |b| {
        b.iter_batched(
            Arena::new,
            |arena| {
                let mut m = StrMultiMap::new(&arena, 1).unwrap();
                for i in 0..100u32 {
                    for k in &keys {
                        m.insert(
                            Payload::Static(k.as_bytes()),
                            Payload::Transient(&i.to_le_bytes()),
                        )
                        .unwrap();
                    }
                }
                black_box(m.value_count());
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .sample_size(20)
        .measurement_time(Duration::from_secs(5))
}

criterion_group!(
    name = benches;
    config = config();
    targets =
        bench_map_insert_transient_100k,
        bench_map_insert_static_100k,
        bench_map_get_hit_miss,
        bench_map_churn,
        bench_set_iterate_100k,
        bench_multimap_insert_100k
);
criterion_main!(benches);
