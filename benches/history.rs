//! Benchmarks for the fat-node primitive and the containers built on it: floor-query reads
//! against long histories, and the append paths of the array and map.

use std::hint;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use versioned_collections::{VersionHistory, VersionedArray, VersionedMap};

const HISTORY_LENGTHS: [u64; 3] = [100, 1_000, 10_000];

fn history_floor(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_floor");
    for length in HISTORY_LENGTHS {
        let mut history = VersionHistory::new();
        for version in 1..=length {
            history.record(version, version);
        }

        group.bench_function(format!("entries_{length}"), |b| {
            let mut version = 0;
            b.iter(|| {
                version = (version + 7) % (length + 1);
                hint::black_box(history.value_at(hint::black_box(version)))
            });
        });
    }
    group.finish();
}

fn array_push(c: &mut Criterion) {
    c.bench_function("array_push_1000", |b| {
        b.iter_batched(
            || VersionedArray::with_len(0),
            |mut array| {
                for i in 0..1_000u32 {
                    hint::black_box(array.push(i));
                }
                array
            },
            BatchSize::SmallInput,
        );
    });
}

fn map_insert_and_versioned_get(c: &mut Criterion) {
    c.bench_function("map_insert_1000", |b| {
        b.iter_batched(
            || VersionedMap::new(),
            |mut map| {
                for i in 0..1_000u32 {
                    hint::black_box(map.insert(i % 64, i));
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    let mut map = VersionedMap::new();
    for i in 0..1_000u32 {
        map.insert(i % 64, i);
    }
    c.bench_function("map_get_at", |b| {
        let mut version = 0;
        b.iter(|| {
            version = (version + 7) % (map.current_version() + 1);
            hint::black_box(map.get_at(&((version as u32) % 64), version))
        });
    });
}

criterion_group!(benches, history_floor, array_push, map_insert_and_versioned_get);
criterion_main!(benches);
