//! Insert and lookup throughput for the persistent B-tree.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use persistree::{BTree, NaturalOrder};
use tempfile::tempdir;

const KEYS: u32 = 10_000;

/// Same multiplicative scramble for every run, so runs are comparable.
fn scrambled(n: u32) -> Vec<u32> {
    (0..n).map(|i| i.wrapping_mul(2_654_435_761)).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for (name, keys) in [
        ("sequential", (0..KEYS).collect::<Vec<_>>()),
        ("scrambled", scrambled(KEYS)),
    ] {
        group.bench_with_input(BenchmarkId::new(name, KEYS), &keys, |b, keys| {
            b.iter_batched(
                || {
                    let dir = tempdir().unwrap();
                    let tree: BTree<u32, u64> =
                        BTree::open(dir.path().join("bench.db"), NaturalOrder).unwrap();
                    (dir, tree)
                },
                |(dir, mut tree)| {
                    for &key in keys {
                        tree.insert(key, u64::from(key)).unwrap();
                    }
                    (dir, tree)
                },
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut tree: BTree<u32, u64> =
        BTree::open(dir.path().join("bench.db"), NaturalOrder).unwrap();
    let keys = scrambled(KEYS);
    for &key in &keys {
        tree.insert(key, u64::from(key)).unwrap();
    }

    c.bench_function("find/hit", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(tree.find(&keys[i]).unwrap())
        });
    });

    c.bench_function("find/miss", |b| {
        let mut key = 0u32;
        b.iter(|| {
            key = key.wrapping_add(2);
            black_box(tree.contains(&(key | 1)).unwrap())
        });
    });
}

criterion_group!(benches, bench_insert, bench_find);
criterion_main!(benches);
