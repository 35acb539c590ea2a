//! # boundq - Bounded Multi-Discipline Concurrent Queue
//!
//! A fixed-capacity FIFO shared between threads, where each side (producers,
//! consumers) is independently single- or multi-threaded.
//!
//! ## Features
//!
//! - **Bounded**: exactly N slots allocated once, no element ever default-constructed
//! - **Four disciplines**: `SpscQueue`, `MpscQueue`, `SpmcQueue`, `MpmcQueue`
//! - **Blocking and non-blocking**: `push`/`pop`, `try_*`, and `*_timeout` variants
//! - **In-place construction**: `emplace_with` builds the element only after a slot is reserved
//! - **Rollback**: a failing or panicking constructor leaves no trace in the queue
//! - **Graceful close**: `close()` rejects producers while consumers drain what is left
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::thread;
//! use boundq::SpscQueue;
//!
//! fn main() -> Result<(), boundq::QueueError> {
//!     let queue = Arc::new(SpscQueue::new(4)?);
//!
//!     let producer = {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || {
//!             for i in 1..=10 {
//!                 queue.push(i).unwrap();
//!             }
//!             queue.close().unwrap();
//!         })
//!     };
//!
//!     for value in queue.iter() {
//!         println!("Received: {}", value);
//!     }
//!     producer.join().unwrap();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │        push / emplace_with / pop / close / approx_size      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Admission Gate                           │
//! │   produce permits (empty slots), consume permits (full)     │
//! │        blocking waits park on a futex / condvar             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┴───────────────────┐
//!          ▼                                       ▼
//!    ┌─────────────┐                         ┌─────────────┐
//!    │ tail index  │                         │ head index  │
//!    │ single/CAS  │                         │ single/CAS  │
//!    └─────────────┘                         └─────────────┘
//!          │                                       │
//!          └───────────────────┬───────────────────┘
//!                              ▼
//!    ┌─────────────────────────────────────────────────────────┐
//!    │                  Fixed Storage                          │
//!    │      N slots, EMPTY → WRITING → FULL → READING          │
//!    └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//!
//! `QueueConfig::from_env()` reads `BQ_CAPACITY`, `BQ_DISCIPLINE`,
//! `BQ_SPIN_LIMIT` and `BQ_DEBUG`. Logging is controlled by `BQ_LOG_LEVEL`
//! (off/error/warn/info/debug/trace), `BQ_LOG_TIME` and `BQ_FLUSH_EPRINT`;
//! call `init_logging()` once at startup to apply them.

// Re-export core types
pub use boundq_core::{
    DisciplineKind,
    Discipline,
    Spsc,
    Mpsc,
    Spmc,
    Mpmc,
    QueueState,
    QueueError,
    QueueResult,
    PushError,
    EmplaceError,
};

// Re-export kprint macros for debug logging
pub use boundq_core::{kprint, kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use boundq_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled, set_time_enabled};

// Re-export env utilities
pub use boundq_core::{env_get, env_get_bool, env_get_duration_ms, env_get_opt, env_get_str, env_is_set};

// Re-export runtime types
pub use boundq_runtime::{
    BoundedQueue,
    SpscQueue,
    MpscQueue,
    SpmcQueue,
    MpmcQueue,
    QueueConfig,
    Iter,
    TryIter,
};

/// Create a queue from `QueueConfig::from_env()`, overriding only the discipline
///
/// The discipline always comes from the type parameter `D`, so an unrelated
/// `BQ_DISCIPLINE` in the environment never makes this fail.
pub fn queue_from_env<T, D: Discipline>() -> QueueResult<BoundedQueue<T, D>> {
    let config = QueueConfig::from_env().discipline(D::KIND);
    BoundedQueue::with_config(&config)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
