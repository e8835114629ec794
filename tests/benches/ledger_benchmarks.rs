//! # MultiSafe Ledger Benchmarks
//!
//! | Area | Operation | Expected cost |
//! |------|-----------|---------------|
//! | ms-01 Ordered Storage | append / remove by id | O(1) |
//! | ms-01 Ordered Storage | select one page | O(offset + page) |
//! | ms-02 Transaction Manager | submit + confirm to execution | O(batch) |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ms_01_ordered_storage::{IdFactory, InMemoryKVStore, UidLinkedListDb};
use ms_02_transaction_manager::TransactionManagerApi;
use ms_tests::fixtures::{owner, pay, relayed, wallet, WALLET};
use shared_types::U256;
use std::time::Duration;

// ============================================================================
// MS-01: Ordered Storage
// ============================================================================

fn bench_queue_mutations(c: &mut Criterion) {
    let mut group = c.benchmark_group("ms-01-ordered-storage");
    group.measurement_time(Duration::from_secs(5));

    for size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("append", size), &size, |b, &size| {
            b.iter(|| {
                let mut store = InMemoryKVStore::new();
                let queue = UidLinkedListDb::new("BENCH");
                let ids = IdFactory::new("BENCH_IDS");
                for _ in 0..size {
                    let uid = ids.get_uid(&mut store).unwrap();
                    queue.append(&mut store, uid).unwrap();
                }
                black_box(queue.len(&store).unwrap())
            })
        });

        // Removal from the middle must not degrade with queue length.
        group.bench_with_input(BenchmarkId::new("remove_middle", size), &size, |b, &size| {
            let mut store = InMemoryKVStore::new();
            let queue = UidLinkedListDb::new("BENCH");
            for uid in 1..=size as u64 {
                queue.append(&mut store, uid).unwrap();
            }
            let middle = size as u64 / 2;
            b.iter(|| {
                queue.remove(&mut store, middle).unwrap();
                queue.append(&mut store, middle).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_queue_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("ms-01-select");

    let mut store = InMemoryKVStore::new();
    let queue = UidLinkedListDb::new("BENCH").with_max_iteration(100);
    for uid in 1..=10_000u64 {
        queue.append(&mut store, uid).unwrap();
    }

    for offset in [0usize, 1_000, 9_900] {
        group.bench_with_input(BenchmarkId::new("page", offset), &offset, |b, &offset| {
            b.iter(|| black_box(queue.select(&store, offset, None).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// MS-02: Transaction Manager
// ============================================================================

fn bench_proposal_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("ms-02-transaction-manager");

    for batch in [1usize, 10, 50] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(
            BenchmarkId::new("submit_and_execute", batch),
            &batch,
            |b, &batch| {
                let (mut wallet, sink) = wallet(3, 2);
                let host = wallet.host().clone();
                host.credit(wallet.store_mut(), &WALLET, U256::from(u64::MAX))
                    .unwrap();
                let operations: Vec<_> = (0..batch).map(|_| pay(owner(9), 1)).collect();
                b.iter(|| {
                    let uid = wallet
                        .submit_transaction(&relayed(owner(1)), operations.clone())
                        .unwrap();
                    wallet.confirm_transaction(&relayed(owner(2)), uid).unwrap();
                    sink.clear();
                    black_box(uid)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_queue_mutations,
    bench_queue_select,
    bench_proposal_throughput
);
criterion_main!(benches);
