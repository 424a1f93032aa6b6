#![allow(clippy::expect_used)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use socialgraph_store::{MemoryStore, SortedSetStore};
use tokio::runtime::Runtime;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rt() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime")
}

fn make_member(idx: usize) -> Vec<u8> {
    format!("{idx:08}").into_bytes()
}

/// Creates a store whose set at `key` holds `count` members scored by index.
fn populated_store(rt: &Runtime, key: &[u8], count: usize) -> MemoryStore {
    let store = MemoryStore::new();
    rt.block_on(async {
        for i in 0..count {
            store.add(key, make_member(i), i as f64).await.expect("populate add failed");
        }
    });
    store
}

// ---------------------------------------------------------------------------
// 1. add_operations
// ---------------------------------------------------------------------------

fn add_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_operations");
    let rt = rt();

    // -- new member into sets of varying size --
    for &size in &[0usize, 1_000, 100_000] {
        let store = populated_store(&rt, b"add", size);
        let mut next = size;
        group.bench_with_input(BenchmarkId::new("new_member", size), &size, |b, _| {
            b.to_async(&rt).iter(|| {
                next += 1;
                let st = store.clone();
                let member = make_member(next);
                async move {
                    st.add(b"add", member, 1e12).await.expect("add failed");
                }
            });
        });
    }

    // -- existing member (insert-if-absent short circuit) --
    {
        let store = populated_store(&rt, b"add", 1_000);
        group.bench_function("existing_member", |b| {
            b.to_async(&rt).iter(|| {
                let st = store.clone();
                async move {
                    st.add(b"add", make_member(500), 1.0).await.expect("add failed");
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. lookup_operations
// ---------------------------------------------------------------------------

fn lookup_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_operations");
    let rt = rt();
    let store = populated_store(&rt, b"look", 10_000);

    group.bench_function("contains_hit", |b| {
        b.to_async(&rt).iter(|| {
            let st = store.clone();
            async move {
                st.contains(b"look", &make_member(5_000)).await.expect("contains failed");
            }
        });
    });

    group.bench_function("contains_miss", |b| {
        b.to_async(&rt).iter(|| {
            let st = store.clone();
            async move {
                st.contains(b"look", b"absent").await.expect("contains failed");
            }
        });
    });

    group.bench_function("cardinality", |b| {
        b.to_async(&rt).iter(|| {
            let st = store.clone();
            async move {
                st.cardinality(b"look").await.expect("cardinality failed");
            }
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. range_operations
// ---------------------------------------------------------------------------

fn range_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_operations");
    let rt = rt();
    let store = populated_store(&rt, b"range", 10_000);

    // -- one 25-member page at increasing depth --
    for &page in &[0usize, 10, 100, 399] {
        let start = page * 25;
        group.throughput(Throughput::Elements(25));
        group.bench_with_input(BenchmarkId::new("page_desc", page), &start, |b, &start| {
            b.to_async(&rt).iter(|| {
                let st = store.clone();
                async move {
                    st.range_desc(b"range", start..=start + 24).await.expect("range failed");
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 4. pipeline_operations
// ---------------------------------------------------------------------------

fn pipeline_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_operations");
    let rt = rt();

    for &ops in &[2usize, 4, 16] {
        let store = MemoryStore::new();
        let mut round = 0usize;
        group.throughput(Throughput::Elements(ops as u64));
        group.bench_with_input(BenchmarkId::new("commit", ops), &ops, |b, &ops| {
            b.to_async(&rt).iter(|| {
                round += 1;
                let st = store.clone();
                async move {
                    let mut pipeline = st.pipeline().await.expect("pipeline failed");
                    for i in 0..ops {
                        pipeline.add(format!("p:{i}").into_bytes(), make_member(round), 1.0);
                    }
                    pipeline.commit().await.expect("commit failed");
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Group registration
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    add_operations,
    lookup_operations,
    range_operations,
    pipeline_operations,
);
criterion_main!(benches);
