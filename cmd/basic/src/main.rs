//! Basic boundq example
//!
//! One producer pushes 1..=10 into a 4-slot SPSC queue while a slow consumer
//! pops. The producer blocks whenever all 4 slots are full, then closes the
//! queue; the consumer drains what is left and stops.
//!
//! # Environment Variables
//!
//! - `BQ_FLUSH_EPRINT=1` - Flush debug output immediately
//! - `BQ_LOG_LEVEL=debug` - Set log level (off, error, warn, info, debug, trace)

use boundq::{init_logging, kdebug, kinfo, EmplaceError, QueueConfig, QueueState, SpscQueue};
use boundq::DisciplineKind;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// BQ_LOG_LEVEL=debug cargo run -p boundq-basic
fn main() {
    println!("=== boundq Basic Example ===\n");

    init_logging();

    let config = QueueConfig::new()
        .capacity(4)
        .discipline(DisciplineKind::Spsc)
        .debug_logging(true);

    let queue = match SpscQueue::<u32>::with_config(&config) {
        Ok(q) => Arc::new(q),
        Err(e) => {
            eprintln!("failed to create queue: {}", e);
            std::process::exit(1);
        }
    };

    let producer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            for i in 1..=10 {
                kdebug!("[Producer] pushing {} (size ~{})", i, queue.approx_size());
                if let Err(e) = queue.push(i) {
                    println!("[Producer] push {} failed: {}", i, e);
                    return;
                }
                println!("[Producer] Sent: {}", i);
            }

            // A constructor that fails leaves no trace in the queue
            match queue.try_emplace_with(|| Err::<u32, _>("sensor offline")) {
                Err(EmplaceError::Construct(msg)) => {
                    println!("[Producer] emplace rolled back: {}", msg)
                }
                other => println!("[Producer] unexpected emplace result: {:?}", other),
            }

            if let Err(e) = queue.close() {
                println!("[Producer] close failed: {}", e);
            }
            println!("[Producer] Done, queue closed");
        })
    };

    let mut received = Vec::new();
    for value in queue.iter() {
        println!("[Consumer] Received: {}", value);
        received.push(value);
        thread::sleep(Duration::from_millis(5));
    }

    if producer.join().is_err() {
        eprintln!("producer thread panicked");
    }

    kinfo!("consumer received {} values", received.len());
    println!("\nReceived in order: {:?}", received);
    assert_eq!(queue.state(), QueueState::Closed);

    println!("\n=== Example Complete ===");
}
