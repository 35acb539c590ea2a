use super::*;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn assert_conserved<T, D: Discipline>(queue: &BoundedQueue<T, D>) {
    assert_eq!(queue.approx_size() + queue.approx_free(), queue.capacity());
}

#[test]
fn test_new_rejects_zero_capacity() {
    let err = MpmcQueue::<u32>::new(0).unwrap_err();
    assert_eq!(err, QueueError::InvalidCapacity(0));
}

#[test]
fn test_with_config_discipline_mismatch() {
    let config = QueueConfig::new().capacity(8).discipline(DisciplineKind::Spsc);
    let err = MpmcQueue::<u32>::with_config(&config).unwrap_err();
    assert_eq!(
        err,
        QueueError::DisciplineMismatch {
            expected: DisciplineKind::Mpmc,
            found: DisciplineKind::Spsc,
        }
    );

    let queue = SpscQueue::<u32>::with_config(&config).unwrap();
    assert_eq!(queue.capacity(), 8);
    assert_eq!(queue.discipline(), DisciplineKind::Spsc);
}

#[test]
fn test_fresh_queue() {
    let queue = SpmcQueue::<String>::new(3).unwrap();
    assert_eq!(queue.state(), QueueState::Open);
    assert!(!queue.is_closed());
    assert!(queue.is_empty());
    assert!(!queue.is_full());
    assert_eq!(queue.approx_size(), 0);
    assert_conserved(&queue);
}

#[test]
fn test_spsc_fifo_with_wraparound() {
    let queue = SpscQueue::new(3).unwrap();
    for round in 0..5 {
        for i in 0..3 {
            queue.push(round * 10 + i).unwrap();
        }
        assert!(queue.is_full());
        for i in 0..3 {
            assert_eq!(queue.pop().unwrap(), round * 10 + i);
        }
        assert_conserved(&queue);
    }
}

#[test]
fn test_try_push_full_returns_value() {
    let queue = MpscQueue::new(2).unwrap();
    queue.try_push("a").unwrap();
    queue.try_push("b").unwrap();

    let err = queue.try_push("c").unwrap_err();
    assert!(err.is_full());
    assert_eq!(err.into_inner(), "c");
    assert_eq!(queue.approx_size(), 2);
}

#[test]
fn test_try_pop_empty() {
    let queue = MpmcQueue::<u8>::new(2).unwrap();
    assert_eq!(queue.try_pop(), Err(QueueError::Empty));
    queue.push(1).unwrap();
    assert_eq!(queue.try_pop(), Ok(1));
    assert_eq!(queue.try_pop(), Err(QueueError::Empty));
}

#[test]
fn test_capacity_one() {
    let queue = SpscQueue::new(1).unwrap();
    for i in 0..10 {
        queue.push(i).unwrap();
        assert!(queue.try_push(99).unwrap_err().is_full());
        assert_eq!(queue.pop().unwrap(), i);
    }
}

#[test]
fn test_spsc_capacity_four_push_blocks_until_pop() {
    let queue = Arc::new(SpscQueue::new(4).unwrap());
    for i in 1..=4 {
        queue.push(i).unwrap();
    }
    assert!(queue.is_full());

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(5))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished(), "push into a full queue returned early");
    assert!(queue.is_full());
    assert_eq!(queue.approx_size(), 4);

    assert_eq!(queue.pop(), Ok(1));
    assert!(producer.join().unwrap().is_ok());

    let rest: Vec<i32> = queue.try_iter().collect();
    assert_eq!(rest, vec![2, 3, 4, 5]);
    assert!(queue.is_empty());
    assert_conserved(&queue);
}

#[test]
fn test_spsc_streaming_through_capacity_four() {
    // Producer pushes 1..=10 into 4 slots while the consumer drains,
    // then closes; every value arrives in order.
    let queue = Arc::new(SpscQueue::new(4).unwrap());

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 1..=10 {
                queue.push(i).unwrap();
            }
            queue.close().unwrap();
        })
    };

    let received: Vec<i32> = queue.iter().collect();
    producer.join().unwrap();

    assert_eq!(received, (1..=10).collect::<Vec<_>>());
    assert_eq!(queue.state(), QueueState::Closed);
}

#[test]
fn test_mpmc_capacity_two_exactly_once() {
    const PRODUCERS: usize = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: usize = 2_000;

    let queue = Arc::new(MpmcQueue::new(2).unwrap());
    let barrier = Arc::new(Barrier::new(PRODUCERS + CONSUMERS));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_PRODUCER {
                    queue.push(p * PER_PRODUCER + i).unwrap();
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                queue.iter().collect::<Vec<usize>>()
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    queue.close().unwrap();

    let mut seen = HashSet::new();
    for c in consumers {
        for v in c.join().unwrap() {
            assert!(seen.insert(v), "value {} received twice", v);
        }
    }
    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    assert_eq!(queue.state(), QueueState::Closed);
    assert_conserved(&queue);
}

#[test]
fn test_mpsc_preserves_per_producer_order() {
    const PRODUCERS: usize = 3;
    const PER_PRODUCER: usize = 1_000;

    let queue = Arc::new(MpscQueue::new(8).unwrap());
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.push((p, i)).unwrap();
                }
            })
        })
        .collect();

    let mut next = [0usize; PRODUCERS];
    for _ in 0..(PRODUCERS * PER_PRODUCER) {
        let (p, i) = queue.pop().unwrap();
        assert_eq!(i, next[p]);
        next[p] += 1;
    }

    for p in producers {
        p.join().unwrap();
    }
    assert!(queue.is_empty());
}

#[test]
fn test_close_drains_then_closed() {
    let queue = SpscQueue::new(4).unwrap();
    queue.push(1).unwrap();
    queue.push(2).unwrap();

    queue.close().unwrap();
    assert!(queue.is_closed());
    assert_eq!(queue.state(), QueueState::Draining);

    assert_eq!(queue.pop(), Ok(1));
    assert_eq!(queue.try_pop(), Ok(2));
    assert_eq!(queue.state(), QueueState::Closed);

    assert_eq!(queue.pop(), Err(QueueError::Closed));
    assert_eq!(queue.try_pop(), Err(QueueError::Closed));
    assert_eq!(queue.pop_timeout(Duration::from_secs(5)), Err(QueueError::Closed));
}

#[test]
fn test_close_empty_queue_is_closed_immediately() {
    let queue = MpmcQueue::<u32>::new(4).unwrap();
    queue.close().unwrap();
    assert_eq!(queue.state(), QueueState::Closed);
    assert_eq!(queue.pop(), Err(QueueError::Closed));
}

#[test]
fn test_push_after_close_rejected() {
    let queue = MpmcQueue::new(4).unwrap();
    queue.close().unwrap();

    let err = queue.push(String::from("late")).unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.value, "late");

    assert!(queue.try_push(String::from("x")).unwrap_err().is_closed());
    assert_eq!(queue.emplace_with(|| String::from("y")), Err(QueueError::Closed));
    assert_eq!(queue.approx_size(), 0);
}

#[test]
fn test_double_close() {
    let queue = SpscQueue::<u8>::new(1).unwrap();
    assert_eq!(queue.close(), Ok(()));
    assert_eq!(queue.close(), Err(QueueError::AlreadyClosed));
    assert_eq!(queue.state(), QueueState::Closed);
}

#[test]
fn test_close_wakes_blocked_producer() {
    let queue = Arc::new(MpscQueue::new(1).unwrap());
    queue.push(0).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push(1))
    };

    thread::sleep(Duration::from_millis(30));
    queue.close().unwrap();

    let err = producer.join().unwrap().unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.into_inner(), 1);

    // The item pushed before close is still delivered
    assert_eq!(queue.pop(), Ok(0));
    assert_eq!(queue.pop(), Err(QueueError::Closed));
}

#[test]
fn test_close_wakes_blocked_consumers() {
    let queue = Arc::new(SpmcQueue::<u32>::new(4).unwrap());

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop())
        })
        .collect();

    thread::sleep(Duration::from_millis(30));
    queue.close().unwrap();

    for c in consumers {
        assert_eq!(c.join().unwrap(), Err(QueueError::Closed));
    }
}

#[test]
fn test_blocked_consumer_receives_late_push() {
    let queue = Arc::new(SpscQueue::new(2).unwrap());
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.pop())
    };

    thread::sleep(Duration::from_millis(20));
    queue.push(42u64).unwrap();
    assert_eq!(consumer.join().unwrap(), Ok(42));
}

#[test]
fn test_timeouts() {
    let queue = SpscQueue::new(1).unwrap();

    let start = Instant::now();
    assert_eq!(queue.pop_timeout(Duration::from_millis(20)), Err(QueueError::Timeout));
    assert!(start.elapsed() >= Duration::from_millis(15));

    queue.push_timeout(1, Duration::from_millis(20)).unwrap();
    let err = queue.push_timeout(2, Duration::from_millis(20)).unwrap_err();
    assert_eq!(err.error, QueueError::Timeout);
    assert_eq!(err.value, 2);

    assert_eq!(
        queue.emplace_timeout(Duration::from_millis(10), || 3),
        Err(QueueError::Timeout)
    );

    // Timed-out waits leave the counters untouched
    assert_conserved(&queue);
    assert_eq!(queue.pop_timeout(Duration::from_millis(20)), Ok(1));
}

#[test]
fn test_max_timeout_does_not_overflow() {
    let queue = MpmcQueue::<u32>::new(1).unwrap();
    queue.push_timeout(1, Duration::MAX).unwrap();
    assert_eq!(queue.pop_timeout(Duration::MAX), Ok(1));

    queue.close().unwrap();
    assert_eq!(queue.pop_timeout(Duration::MAX), Err(QueueError::Closed));
    assert_eq!(queue.emplace_timeout(Duration::MAX, || 2), Err(QueueError::Closed));
}

#[test]
fn test_max_timeout_push_wakes_on_close() {
    let queue = Arc::new(SpscQueue::new(1).unwrap());
    queue.push(1).unwrap();

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.push_timeout(2, Duration::MAX))
    };

    thread::sleep(Duration::from_millis(30));
    assert!(!producer.is_finished());
    queue.close().unwrap();

    let err = producer.join().unwrap().unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.into_inner(), 2);
    assert_eq!(queue.pop(), Ok(1));
}

#[test]
fn test_emplace_constructs_in_place() {
    let queue = MpmcQueue::new(2).unwrap();
    queue.emplace_with(|| vec![1, 2, 3]).unwrap();
    assert_eq!(queue.pop().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_failed_construction_rolls_back() {
    let queue = SpscQueue::new(2).unwrap();
    queue.push(1).unwrap();

    let err = queue.try_emplace_with(|| Err::<i32, _>("boom")).unwrap_err();
    assert!(matches!(err, EmplaceError::Construct("boom")));
    assert_eq!(queue.approx_size(), 1);
    assert_conserved(&queue);

    // The reserved slot is reused by the next push
    queue.push(2).unwrap();
    assert!(queue.is_full());
    assert_eq!(queue.pop(), Ok(1));
    assert_eq!(queue.pop(), Ok(2));
}

#[test]
fn test_panicking_construction_rolls_back() {
    let queue = MpmcQueue::new(1).unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = queue.emplace_with(|| -> u32 { panic!("constructor failed") });
    }));
    assert!(result.is_err());

    assert_eq!(queue.approx_size(), 0);
    assert_conserved(&queue);

    queue.try_push(7).unwrap();
    assert_eq!(queue.pop(), Ok(7));
}

#[test]
fn test_try_emplace_on_closed_queue_is_queue_error() {
    let queue = MpscQueue::<u8>::new(2).unwrap();
    queue.close().unwrap();

    let mut ran = false;
    let err = queue
        .try_emplace_with(|| {
            ran = true;
            Ok::<u8, ()>(1)
        })
        .unwrap_err();
    assert!(matches!(err, EmplaceError::Queue(QueueError::Closed)));
    assert!(!ran);
}

#[test]
fn test_drop_destroys_remaining_items() {
    let drops = Arc::new(AtomicUsize::new(0));
    {
        let queue = MpmcQueue::new(4).unwrap();
        for _ in 0..3 {
            queue.push(DropCounter(drops.clone())).unwrap();
        }
        drop(queue.pop().unwrap());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
    assert_eq!(drops.load(Ordering::SeqCst), 3);
}

#[test]
fn test_rejected_push_does_not_drop_value() {
    let drops = Arc::new(AtomicUsize::new(0));
    let queue = SpscQueue::new(1).unwrap();
    queue.push(DropCounter(drops.clone())).unwrap();

    let err = queue.try_push(DropCounter(drops.clone())).unwrap_err();
    assert_eq!(drops.load(Ordering::SeqCst), 0);
    drop(err);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_try_iter_stops_when_empty() {
    let queue = SpscQueue::new(8).unwrap();
    for i in 0..5 {
        queue.push(i).unwrap();
    }
    let drained: Vec<_> = queue.try_iter().collect();
    assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    assert!(queue.is_empty());
    assert!(!queue.is_closed());
}

#[test]
fn test_debug_output() {
    let queue = SpscQueue::<u8>::new(4).unwrap();
    queue.push(1).unwrap();
    let s = format!("{:?}", queue);
    assert!(s.contains("spsc") || s.contains("Spsc"));
    assert!(s.contains("capacity: 4"));
    assert!(s.contains("approx_size: 1"));
}

fn stress<D: Discipline>(producers: usize, consumers: usize, per_producer: usize, capacity: usize) {
    let queue = Arc::new(BoundedQueue::<usize, D>::new(capacity).unwrap());
    let received = Arc::new(AtomicUsize::new(0));
    let sum = Arc::new(AtomicUsize::new(0));

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let received = Arc::clone(&received);
            let sum = Arc::clone(&sum);
            thread::spawn(move || {
                for v in queue.iter() {
                    received.fetch_add(1, Ordering::Relaxed);
                    sum.fetch_add(v, Ordering::Relaxed);
                }
            })
        })
        .collect();

    let producer_handles: Vec<_> = (0..producers)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    queue.push(p * per_producer + i).unwrap();
                }
            })
        })
        .collect();

    for p in producer_handles {
        p.join().unwrap();
    }
    queue.close().unwrap();
    for c in consumer_handles {
        c.join().unwrap();
    }

    let total = producers * per_producer;
    assert_eq!(received.load(Ordering::SeqCst), total);
    assert_eq!(sum.load(Ordering::SeqCst), total * (total - 1) / 2);
    assert_eq!(queue.state(), QueueState::Closed);
    assert_conserved(&queue);
}

#[test]
fn test_stress_spsc() {
    stress::<Spsc>(1, 1, 20_000, 16);
}

#[test]
fn test_stress_mpsc() {
    stress::<Mpsc>(4, 1, 5_000, 16);
}

#[test]
fn test_stress_spmc() {
    stress::<Spmc>(1, 4, 20_000, 16);
}

#[test]
fn test_stress_mpmc() {
    stress::<Mpmc>(4, 4, 5_000, 3);
}

#[test]
fn test_close_races_with_producers() {
    // Every push that succeeded is popped, every rejected value comes back
    for _ in 0..20 {
        let queue = Arc::new(MpmcQueue::new(4).unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let accepted = Arc::clone(&accepted);
                thread::spawn(move || {
                    for i in 0..200 {
                        match queue.push(i) {
                            Ok(()) => {
                                accepted.fetch_add(1, Ordering::SeqCst);
                            }
                            Err(e) => {
                                assert!(e.is_closed());
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.iter().count())
        };

        thread::sleep(Duration::from_millis(2));
        queue.close().unwrap();

        for p in producers {
            p.join().unwrap();
        }
        let popped = consumer.join().unwrap();
        assert_eq!(popped, accepted.load(Ordering::SeqCst));
        assert_eq!(queue.state(), QueueState::Closed);
    }
}
