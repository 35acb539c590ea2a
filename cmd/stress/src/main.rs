//! Stress test - many producers and consumers on one small queue
//!
//! Usage: `stress [discipline] [items-per-producer] [capacity]`
//!
//! Producer/consumer counts follow the discipline: single sides get one
//! thread, multi sides get `BQ_STRESS_THREADS` (default 4). Every value is
//! checked to arrive exactly once. Gives up after `BQ_STRESS_TIMEOUT_MS`.

use boundq::{
    env_get, env_get_duration_ms, init_logging, kinfo, BoundedQueue, Discipline, DisciplineKind, Mpmc, Mpsc,
    QueueState, Spmc, Spsc,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    println!("=== boundq Stress Test ===\n");
    init_logging();

    let mut args = std::env::args().skip(1);
    let kind: DisciplineKind = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DisciplineKind::Mpmc);
    let per_producer: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(200_000);
    let capacity: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(8);
    let threads: usize = env_get("BQ_STRESS_THREADS", 4);
    let timeout = env_get_duration_ms("BQ_STRESS_TIMEOUT_MS", 60_000);

    let ok = match kind {
        DisciplineKind::Spsc => run::<Spsc>(threads, per_producer, capacity, timeout),
        DisciplineKind::Mpsc => run::<Mpsc>(threads, per_producer, capacity, timeout),
        DisciplineKind::Spmc => run::<Spmc>(threads, per_producer, capacity, timeout),
        DisciplineKind::Mpmc => run::<Mpmc>(threads, per_producer, capacity, timeout),
    };

    if !ok {
        println!("\n=== Stress Test FAILED ===");
        std::process::exit(1);
    }
    println!("\n=== Stress Test Complete ===");
}

fn run<D: Discipline>(threads: usize, per_producer: u64, capacity: usize, timeout: Duration) -> bool {
    let producers = if D::KIND.multi_producer() { threads } else { 1 };
    let consumers = if D::KIND.multi_consumer() { threads } else { 1 };

    println!(
        "{}: {} producers x {} items, {} consumers, capacity {}",
        D::KIND, producers, per_producer, consumers, capacity
    );

    let queue = match BoundedQueue::<u64, D>::new(capacity) {
        Ok(q) => Arc::new(q),
        Err(e) => {
            println!("failed to create queue: {}", e);
            return false;
        }
    };

    let received = Arc::new(AtomicU64::new(0));
    let checksum = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    let consumer_handles: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let received = Arc::clone(&received);
            let checksum = Arc::clone(&checksum);
            thread::spawn(move || {
                for v in queue.iter() {
                    received.fetch_add(1, Ordering::Relaxed);
                    checksum.fetch_add(v, Ordering::Relaxed);
                }
            })
        })
        .collect();

    let producer_handles: Vec<_> = (0..producers as u64)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    if queue.push(p * per_producer + i).is_err() {
                        return;
                    }
                }
            })
        })
        .collect();

    // Progress indicator
    let total = producers as u64 * per_producer;
    while producer_handles.iter().any(|h| !h.is_finished()) {
        if start.elapsed() > timeout {
            println!(
                "\nTimeout! Only {}/{} received",
                received.load(Ordering::Relaxed),
                total
            );
            return false;
        }
        print!("\rReceived: {}/{}", received.load(Ordering::Relaxed), total);
        thread::sleep(Duration::from_millis(100));
    }

    for h in producer_handles {
        if h.join().is_err() {
            println!("\nproducer panicked");
            return false;
        }
    }
    if let Err(e) = queue.close() {
        println!("\nclose failed: {}", e);
        return false;
    }
    for h in consumer_handles {
        if h.join().is_err() {
            println!("\nconsumer panicked");
            return false;
        }
    }

    let elapsed = start.elapsed();
    let got = received.load(Ordering::Relaxed);
    let sum = checksum.load(Ordering::Relaxed);
    let expected_sum = total * (total.saturating_sub(1)) / 2;

    println!("\n\n=== Results ===");
    println!("Items sent:      {}", total);
    println!("Items received:  {}", got);
    println!("Checksum ok:     {}", sum == expected_sum);
    println!("Final state:     {}", queue.state());
    println!("Time:            {:?}", elapsed);
    println!("Throughput:      {:.0} items/sec", got as f64 / elapsed.as_secs_f64());
    kinfo!("{} stress finished in {:?}", D::KIND, elapsed);

    got == total && sum == expected_sum && queue.state() == QueueState::Closed
}
