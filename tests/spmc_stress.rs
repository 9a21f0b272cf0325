use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use skein::{
    QueueError,
    spmc::{MIN_BLOCK_CAPACITY, QueueState, queue},
    traits::{QueueConsumer, QueueFactory, QueueProducer},
};

/// Pops until `done` is set and the queue is drained, recording every index.
fn drain<C: QueueConsumer<u64>>(consumer: &C, done: &AtomicBool) -> Vec<u64> {
    let mut seen = Vec::new();
    loop {
        match consumer.pop_with_seq() {
            Ok((value, seq)) => {
                assert_eq!(value, seq, "item popped from the wrong slot");
                seen.push(seq);
            },
            Err(QueueError::Empty) if done.load(Ordering::Acquire) => {
                // the producer may have finished between the pop and the load
                if consumer.is_empty() {
                    return seen;
                }
            },
            Err(QueueError::Empty) => thread::yield_now(),
            Err(e) => panic!("unexpected queue error: {e:?}"),
        }
    }
}

fn assert_strictly_increasing(seen: &[u64]) {
    for pair in seen.windows(2) {
        assert!(pair[0] < pair[1], "consumer saw {} after {}", pair[1], pair[0]);
    }
}

#[test]
fn million_items_eight_consumers() {
    const TOTAL: u64 = 1_000_000;
    const CONSUMERS: usize = 8;

    let (producer, consumer) = queue::<u64>().channels().unwrap();
    let done = &AtomicBool::new(false);

    let per_consumer: Vec<Vec<u64>> = thread::scope(|s| {
        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let consumer = consumer.clone();
                s.spawn(move || drain(&consumer, done))
            })
            .collect();

        s.spawn(move || {
            for i in 0..TOTAL {
                producer.push(i).unwrap();
            }
            done.store(true, Ordering::Release);
        });

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for seen in &per_consumer {
        assert_strictly_increasing(seen);
    }

    let mut all: Vec<u64> = per_consumer.into_iter().flatten().collect();
    all.sort_unstable();
    assert_eq!(all.len() as u64, TOTAL, "items lost or duplicated");
    assert!(all.iter().copied().eq(0..TOTAL));
}

#[test]
fn grow_under_pop_single_consumer() {
    const TOTAL: u64 = 10_000;

    let (producer, consumer) = queue::<u64>().reserve(0).solo_channels().unwrap();
    assert_eq!(producer.capacity(), 0);

    let (capacities, consumer) = thread::scope(|s| {
        let popper = s.spawn(move || {
            let mut expected = 0;
            while expected < TOTAL {
                match consumer.pop() {
                    Ok(value) => {
                        assert_eq!(value, expected, "stale or reordered slot");
                        expected += 1;
                    },
                    Err(QueueError::Empty) => thread::yield_now(),
                    Err(e) => panic!("unexpected queue error: {e:?}"),
                }
            }
            consumer
        });

        let mut capacities = Vec::new();
        for i in 0..TOTAL {
            producer.push(i).unwrap();
            let capacity = producer.capacity();
            if capacities.last() != Some(&capacity) {
                capacities.push(capacity);
            }
            // stall now and then so the consumer catches up and the ring
            // has to wrap as well as grow
            if i % 512 == 0 {
                for _ in 0..2_000 {
                    std::hint::spin_loop();
                }
            }
        }

        (capacities, popper.join().unwrap())
    });

    assert_eq!(capacities[0], MIN_BLOCK_CAPACITY);
    for pair in capacities.windows(2) {
        assert!(pair[1] > pair[0] && pair[1].is_power_of_two());
    }
    assert!(consumer.is_empty());
}

#[test]
fn growth_with_concurrent_consumers() {
    const TOTAL: u64 = 200_000;
    const CONSUMERS: usize = 3;

    let (producer, consumer) = queue::<u64>().channels().unwrap();
    let done = &AtomicBool::new(false);

    let per_consumer: Vec<Vec<u64>> = thread::scope(|s| {
        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let consumer = consumer.clone();
                s.spawn(move || drain(&consumer, done))
            })
            .collect();

        s.spawn(move || {
            // bursts far larger than the first block
            let mut i = 0;
            while i < TOTAL {
                let burst_end = (i + 4_096).min(TOTAL);
                while i < burst_end {
                    producer.push(i).unwrap();
                    i += 1;
                }
                thread::yield_now();
            }
            done.store(true, Ordering::Release);
        });

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for seen in &per_consumer {
        assert_strictly_increasing(seen);
    }
    let mut all: Vec<u64> = per_consumer.into_iter().flatten().collect();
    all.sort_unstable();
    assert!(all.iter().copied().eq(0..TOTAL));
}

#[test]
fn count_bounds_hold_while_popping() {
    const TOTAL: u64 = 100_000;

    let queue = queue::<u64>().build().unwrap();
    let producer = queue.producer().unwrap();
    assert_eq!(queue.producer().unwrap_err(), QueueError::ProducerTaken);
    let probe = queue.consumer();
    let popped = &AtomicUsize::new(0);
    let done = &AtomicBool::new(false);

    thread::scope(|s| {
        for _ in 0..2 {
            let consumer = queue.consumer();
            s.spawn(move || {
                while !done.load(Ordering::Acquire) || !consumer.is_empty() {
                    if consumer.try_pop().is_ok() {
                        popped.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }

        let q = probe.queue();
        for i in 0..TOTAL {
            producer.push(i).unwrap();
            if i % 64 == 0 {
                // only the tail moves while we sample, so the samples are
                // ordered from the largest to the smallest
                let upper = q.count_upper();
                let count = q.count();
                let lower = q.count_lower();
                let capacity = q.capacity();
                assert!(lower <= count, "lower {lower} above count {count}");
                assert!(count <= upper, "count {count} above upper {upper}");
                assert!(upper <= capacity, "upper {upper} over capacity {capacity}");

                let (lo, hi) = producer.count_bounds();
                assert!(lo <= hi, "lower {lo} above upper {hi}");
            }
        }
        done.store(true, Ordering::Release);
    });

    assert_eq!(popped.load(Ordering::Relaxed) as u64, TOTAL);
    assert_eq!(queue.count(), 0);
}

#[test]
fn bounded_queue_matches_model() {
    let mut rng = SmallRng::seed_from_u64(0x5EED);

    for max in [1usize, 3, 4, 50, 64, 100] {
        let (producer, consumer) = queue::<u32>().max_capacity(max).solo_channels().unwrap();
        let capacity = max.next_power_of_two();
        let mut model = VecDeque::new();
        let mut next = 0u32;

        for _ in 0..5_000 {
            if rng.random_bool(0.55) {
                match producer.try_push(next) {
                    Ok(()) => {
                        assert!(model.len() < capacity, "push past capacity {capacity}");
                        model.push_back(next);
                    },
                    Err((value, QueueError::Full)) => {
                        assert_eq!(value, next);
                        assert_eq!(model.len(), capacity, "spurious FULL below capacity");
                    },
                    Err((_, e)) => panic!("unexpected queue error: {e:?}"),
                }
                next += 1;
            } else {
                match consumer.try_pop() {
                    Ok(value) => assert_eq!(Some(value), model.pop_front()),
                    Err(QueueError::Empty) => assert!(model.is_empty()),
                    Err(e) => panic!("unexpected queue error: {e:?}"),
                }
            }
            assert_eq!(consumer.len(), model.len());
        }
        assert!(producer.capacity() <= capacity);
    }
}

#[test]
fn raw_results_report_indices() {
    let queue = queue::<u16>().max_capacity(2).build().unwrap();

    // SAFETY: this thread is the only producer and the only consumer.
    unsafe {
        let first = queue.push_st(10);
        assert_eq!((first.state, first.head), (QueueState::Ok, 0));
        assert_eq!(queue.push_st(11).head, 1);

        let full = queue.push_st(12);
        assert_eq!(full.state, QueueState::Full);
        assert_eq!((full.head, full.tail), (2, 0));

        let popped = queue.pop_st();
        assert_eq!(popped.item, Some(10));
        assert_eq!(popped.result.tail, 0);
    }

    assert_eq!(queue.skip().state, QueueState::Ok);
    let empty = queue.pop_weak();
    assert_eq!(empty.result.state, QueueState::Empty);
    assert_eq!(empty.item, None);
    assert_eq!((empty.result.head, empty.result.tail), (2, 2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consumers_as_tasks() {
    const TOTAL: u64 = 50_000;

    let (producer, consumer) = queue::<u64>().channels().unwrap();
    let popped = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let consumer = consumer.clone();
            let popped = popped.clone();
            tokio::task::spawn(async move {
                let mut last = None;
                while popped.load(Ordering::Relaxed) < TOTAL as usize {
                    match consumer.pop_with_seq() {
                        Ok((_, seq)) => {
                            assert!(last.is_none_or(|l| l < seq));
                            last = Some(seq);
                            popped.fetch_add(1, Ordering::Relaxed);
                        },
                        Err(_) => tokio::task::yield_now().await,
                    }
                }
            })
        })
        .collect();

    for i in 0..TOTAL {
        producer.push(i).unwrap();
        if i % 1_000 == 0 {
            tokio::task::yield_now().await;
        }
    }

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(popped.load(Ordering::Relaxed), TOTAL as usize);
}
