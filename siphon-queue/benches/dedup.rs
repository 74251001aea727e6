//! Benchmarks for the dedup queue hot paths.
//!
//! Compares against a plain `Mutex<VecDeque>` (what the dedup bookkeeping
//! costs on top of a bare blocking queue) and crossbeam's `ArrayQueue`
//! (what the lock costs against a lock-free baseline).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_queue::ArrayQueue;
use siphon_queue::DedupQueue;

// ============================================================================
// Single-threaded latency
// ============================================================================

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");

    group.bench_function("siphon_dedup/push_pop", |b| {
        let queue = DedupQueue::<u64>::new();
        b.iter(|| {
            queue.push(black_box(42));
            black_box(queue.try_pop().unwrap())
        });
    });

    group.bench_function("mutex_vecdeque/push_pop", |b| {
        let queue = Mutex::new(VecDeque::<u64>::new());
        b.iter(|| {
            queue.lock().unwrap().push_back(black_box(42));
            black_box(queue.lock().unwrap().pop_front().unwrap())
        });
    });

    group.bench_function("crossbeam_array/push_pop", |b| {
        let queue = ArrayQueue::<u64>::new(1024);
        b.iter(|| {
            queue.push(black_box(42)).unwrap();
            black_box(queue.pop().unwrap())
        });
    });

    // The rejected-duplicate path: a membership probe and nothing else.
    group.bench_function("siphon_dedup/duplicate_hit", |b| {
        let queue = DedupQueue::<u64>::new();
        queue.push(42);
        b.iter(|| black_box(queue.push(black_box(42))));
    });

    group.finish();
}

// ============================================================================
// Producer/consumer throughput
// ============================================================================

fn bench_throughput(c: &mut Criterion) {
    const MESSAGES: u64 = 100_000;

    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("siphon_dedup/spsc_distinct", |b| {
        b.iter(|| {
            let queue = DedupQueue::<u64>::new();
            let producer = queue.clone();

            let handle = thread::spawn(move || {
                for i in 0..MESSAGES {
                    producer.push(i);
                }
                producer.close();
            });

            let mut received = 0u64;
            loop {
                match queue.try_pop() {
                    Some(_) => received += 1,
                    None if queue.is_closed() => {
                        // Drain anything that raced in before the close.
                        while queue.try_pop().is_some() {
                            received += 1;
                        }
                        break;
                    }
                    None => std::hint::spin_loop(),
                }
            }

            handle.join().unwrap();
            black_box(received)
        });
    });

    group.bench_function("mutex_vecdeque/spsc", |b| {
        b.iter(|| {
            let queue = Arc::new(Mutex::new(VecDeque::<u64>::new()));
            let producer = Arc::clone(&queue);

            let handle = thread::spawn(move || {
                for i in 0..MESSAGES {
                    producer.lock().unwrap().push_back(i);
                }
            });

            let mut received = 0u64;
            while received < MESSAGES {
                if queue.lock().unwrap().pop_front().is_some() {
                    received += 1;
                }
            }

            handle.join().unwrap();
            black_box(received)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_throughput);
criterion_main!(benches);
