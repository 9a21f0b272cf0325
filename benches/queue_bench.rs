#![allow(missing_docs, clippy::cast_possible_truncation)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::{runtime::Runtime, task};

use skein::{
    QueueError,
    spmc::queue,
    traits::{QueueConsumer, QueueProducer},
};

#[cfg(feature = "dev-profiling")]
mod common;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct SmallData {
    value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    seq: u64,
    payload: [u8; 56],
}

/// Single-threaded latency benchmark - measures ns per operation
fn bench_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_ns_per_op");
    group.measurement_time(Duration::from_secs(10));
    group.warm_up_time(Duration::from_secs(3));

    group.bench_function("push_pop_small", |b| {
        let (producer, consumer) = queue::<SmallData>().reserve(1024).channels().unwrap();
        b.iter(|| {
            producer.push(black_box(SmallData { value: 42 })).unwrap();
            black_box(consumer.pop().unwrap());
        });
    });

    group.bench_function("push_pop_solo_small", |b| {
        let (producer, consumer) = queue::<SmallData>().reserve(1024).solo_channels().unwrap();
        b.iter(|| {
            producer.push(black_box(SmallData { value: 42 })).unwrap();
            black_box(consumer.pop().unwrap());
        });
    });

    group.bench_function("push_pop_frame_64b", |b| {
        let (producer, consumer) = queue::<Frame>().reserve(1024).channels().unwrap();
        let frame = Frame {
            seq: 1,
            payload: [7; 56],
        };
        b.iter(|| {
            producer.push(black_box(frame)).unwrap();
            black_box(consumer.pop().unwrap());
        });
    });

    // a fresh queue per batch so every batch pays for the growth steps
    group.bench_function("grow_from_empty_4096", |b| {
        b.iter(|| {
            let (producer, consumer) = queue::<u64>().channels().unwrap();
            for i in 0..4096 {
                producer.push(i).unwrap();
            }
            black_box(consumer.len());
        });
    });

    group.finish();
}

/// Multi-threaded throughput benchmark
fn bench_throughput(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("throughput_ops_per_sec");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));
    group.warm_up_time(Duration::from_secs(5));

    // (consumers, ops)
    let configs = [(1, 100_000), (2, 100_000), (4, 100_000), (8, 100_000)];

    for (consumers, ops) in configs {
        let config_name = format!("1p_{consumers}c");
        group.throughput(Throughput::Elements(ops as u64));

        group.bench_with_input(
            BenchmarkId::new("unbounded_grow", &config_name),
            &(consumers, ops),
            |b, &(consumers, ops)| {
                b.to_async(&rt).iter(|| async {
                    bench_spmc(consumers, ops, None, 0).await;
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("reserved", &config_name),
            &(consumers, ops),
            |b, &(consumers, ops)| {
                b.to_async(&rt).iter(|| async {
                    bench_spmc(consumers, ops, None, ops).await;
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("bounded_1024", &config_name),
            &(consumers, ops),
            |b, &(consumers, ops)| {
                b.to_async(&rt).iter(|| async {
                    bench_spmc(consumers, ops, Some(1024), 0).await;
                });
            },
        );
    }

    group.finish();
}

async fn bench_spmc(consumers: usize, ops: usize, max_capacity: Option<usize>, reserve: usize) {
    let builder = queue::<SmallData>().reserve(reserve);
    let builder = match max_capacity {
        Some(max) => builder.max_capacity(max),
        None => builder,
    };
    let (producer, consumer) = builder.channels().unwrap();
    let consumed = Arc::new(AtomicUsize::new(0));

    let producer_handle = task::spawn(async move {
        for i in 0..ops {
            let mut data = SmallData { value: i as u32 };
            loop {
                match producer.try_push(data) {
                    Ok(()) => break,
                    Err((back, QueueError::Full)) => {
                        data = back;
                        task::yield_now().await;
                    },
                    Err((_, e)) => panic!("Unexpected queue error: {e:?}"),
                }
            }
        }
    });

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let consumer = consumer.clone();
            let consumed = consumed.clone();
            task::spawn(async move {
                while consumed.load(Ordering::Relaxed) < ops {
                    match consumer.try_pop() {
                        Ok(_) => {
                            consumed.fetch_add(1, Ordering::Relaxed);
                        },
                        Err(QueueError::Empty | QueueError::FailedRace) => task::yield_now().await,
                        Err(e) => panic!("Unexpected queue error: {e:?}"),
                    }
                }
            })
        })
        .collect();

    producer_handle.await.unwrap();
    for handle in consumer_handles {
        handle.await.unwrap();
    }
}

#[cfg(feature = "dev-profiling")]
criterion_group! {
    name = benches;
    config = Criterion::default()
        .significance_level(0.01)
        .noise_threshold(0.05)
        .with_profiler(common::FlamegraphProfiler::new(100));
    targets = bench_latency, bench_throughput
}

#[cfg(not(feature = "dev-profiling"))]
criterion_group!(benches, bench_latency, bench_throughput);

criterion_main!(benches);
