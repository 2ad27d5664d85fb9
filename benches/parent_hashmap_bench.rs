use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use parent_hashmap::{Handle, PairHashMap, QuadHashMap};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u32> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some((s >> 40) as u32)
    })
}

fn pairs(seed: u64, n: usize) -> Vec<[u32; 2]> {
    let mut it = lcg(seed);
    (0..n)
        .map(|_| [it.next().unwrap(), it.next().unwrap()])
        .collect()
}

fn bench_get_fresh_100k(c: &mut Criterion) {
    let keys = pairs(1, 100_000);
    c.bench_function("pair::get_fresh_100k", |b| {
        b.iter_batched(
            PairHashMap::<u64>::new,
            |mut m| {
                for k in &keys {
                    black_box(m.get(*k));
                }
                m
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit_100k(c: &mut Criterion) {
    let keys = pairs(2, 100_000);
    let mut m = PairHashMap::<u64>::new();
    for k in &keys {
        m.get(*k);
    }
    c.bench_function("pair::get_hit_reversed_100k", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(m.get([k[1], k[0]]));
            }
        })
    });
}

fn bench_peek_miss_100k(c: &mut Criterion) {
    let present = pairs(3, 100_000);
    let absent = pairs(4, 100_000);
    let mut m = PairHashMap::<u64>::new();
    for k in &present {
        m.get(*k);
    }
    c.bench_function("pair::peek_miss_100k", |b| {
        b.iter(|| {
            for k in &absent {
                black_box(m.peek(*k));
            }
        })
    });
}

fn bench_remove_recreate_10k(c: &mut Criterion) {
    let keys = pairs(5, 110_000);
    c.bench_function("pair::remove_recreate_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = PairHashMap::<u64>::new();
                let hs: Vec<Handle> = keys.iter().map(|k| m.get(*k)).collect();
                (m, hs)
            },
            |(mut m, hs)| {
                for (h, k) in hs.iter().zip(&keys).step_by(11) {
                    let _ = m.remove(*h);
                    black_box(m.get(*k));
                }
                m
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iterate_after_removals(c: &mut Criterion) {
    let keys = pairs(6, 100_000);
    let mut m = PairHashMap::<u64>::new();
    let hs: Vec<Handle> = keys.iter().map(|k| m.get(*k)).collect();
    for h in hs.iter().step_by(2) {
        let _ = m.remove(*h);
    }
    c.bench_function("pair::iterate_50k_half_removed", |b| {
        b.iter(|| black_box(m.iter().count()))
    });
}

fn bench_quad_get_fresh_50k(c: &mut Criterion) {
    let mut it = lcg(7);
    let keys: Vec<[u32; 4]> = (0..50_000)
        .map(|_| std::array::from_fn(|_| it.next().unwrap()))
        .collect();
    c.bench_function("quad::get_fresh_50k", |b| {
        b.iter_batched(
            QuadHashMap::<u64>::new,
            |mut m| {
                for k in &keys {
                    black_box(m.get(*k));
                }
                m
            },
            BatchSize::SmallInput,
        )
    });
}

fn config() -> Criterion {
    Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3))
}

criterion_group! {
    name = benches;
    config = config();
    targets = bench_get_fresh_100k,
        bench_get_hit_100k,
        bench_peek_miss_100k,
        bench_remove_recreate_10k,
        bench_iterate_after_removals,
        bench_quad_get_fresh_50k
}
criterion_main!(benches);
