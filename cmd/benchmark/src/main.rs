//! Throughput benchmark: boundq vs crossbeam ArrayQueue
//!
//! Usage: `benchmark [items] [capacity]`
//!
//! Both queues move the same number of items between the same number of
//! threads. ArrayQueue has no blocking API, so its side spins on full/empty;
//! boundq parks.

use boundq::{BoundedQueue, Discipline, Mpmc, Mpsc, Spmc, Spsc};
use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    println!("=== boundq Benchmark ===\n");

    let mut args = std::env::args().skip(1);
    let items: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(1_000_000);
    let capacity: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(1024);

    println!("{} items, capacity {}\n", items, capacity);
    println!("{:<8} {:>6} {:>6} {:>14} {:>14}", "kind", "prod", "cons", "boundq", "ArrayQueue");

    bench_pair::<Spsc>(1, 1, items, capacity);
    bench_pair::<Mpsc>(4, 1, items, capacity);
    bench_pair::<Spmc>(1, 4, items, capacity);
    bench_pair::<Mpmc>(4, 4, items, capacity);

    println!("\n=== Benchmark Complete ===");
}

fn bench_pair<D: Discipline>(producers: u64, consumers: u64, items: u64, capacity: usize) {
    let ours = bench_boundq::<D>(producers, consumers, items, capacity);
    let theirs = bench_array_queue(producers, consumers, items, capacity);
    println!(
        "{:<8} {:>6} {:>6} {:>10.2} M/s {:>10.2} M/s",
        D::KIND.as_str(),
        producers,
        consumers,
        rate(items, ours),
        rate(items, theirs)
    );
}

fn rate(items: u64, elapsed: Duration) -> f64 {
    items as f64 / elapsed.as_secs_f64() / 1_000_000.0
}

fn bench_boundq<D: Discipline>(producers: u64, consumers: u64, items: u64, capacity: usize) -> Duration {
    let queue = match BoundedQueue::<u64, D>::new(capacity) {
        Ok(q) => Arc::new(q),
        Err(e) => fail(&format!("failed to create queue: {}", e)),
    };
    let per_producer = items / producers;
    let start = Instant::now();

    let cons: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.iter().count())
        })
        .collect();

    let prods: Vec<_> = (0..producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    if queue.push(i).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();

    for p in prods {
        if p.join().is_err() {
            fail("boundq producer panicked");
        }
    }
    if let Err(e) = queue.close() {
        fail(&format!("close failed: {}", e));
    }
    let mut received = 0;
    for c in cons {
        match c.join() {
            Ok(n) => received += n as u64,
            Err(_) => fail("boundq consumer panicked"),
        }
    }
    let elapsed = start.elapsed();
    if received != per_producer * producers {
        fail(&format!("boundq lost items: {}/{}", received, per_producer * producers));
    }
    elapsed
}

fn bench_array_queue(producers: u64, consumers: u64, items: u64, capacity: usize) -> Duration {
    let queue = Arc::new(ArrayQueue::<u64>::new(capacity));
    let done = Arc::new(AtomicBool::new(false));
    let per_producer = items / producers;
    let start = Instant::now();

    let cons: Vec<_> = (0..consumers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut n = 0usize;
                loop {
                    match queue.pop() {
                        Some(_) => n += 1,
                        None if done.load(Ordering::Acquire) && queue.is_empty() => break,
                        None => std::hint::spin_loop(),
                    }
                }
                n
            })
        })
        .collect();

    let prods: Vec<_> = (0..producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    let mut v = i;
                    while let Err(back) = queue.push(v) {
                        v = back;
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    for p in prods {
        if p.join().is_err() {
            fail("ArrayQueue producer panicked");
        }
    }
    done.store(true, Ordering::Release);
    let mut received = 0;
    for c in cons {
        match c.join() {
            Ok(n) => received += n as u64,
            Err(_) => fail("ArrayQueue consumer panicked"),
        }
    }
    let elapsed = start.elapsed();
    if received != per_producer * producers {
        fail(&format!("ArrayQueue lost items: {}/{}", received, per_producer * producers));
    }
    elapsed
}

/// Abort the run: a broken run must not print a throughput number
fn fail(msg: &str) -> ! {
    eprintln!("\nbenchmark FAILED: {}", msg);
    std::process::exit(1);
}
