//! # boundq-runtime
//!
//! Blocking half of the boundq bounded queue.
//!
//! This crate provides:
//! - Thread parking (futex on Linux, Condvar elsewhere)
//! - The admission gate: produce/consume permit counters
//! - Queue configuration with environment overrides
//! - `BoundedQueue` and its per-discipline aliases

pub mod config;
pub mod gate;
pub mod parking;
pub mod queue;

// Re-exports
pub use config::QueueConfig;
pub use gate::{Acquire, AdmissionGate, PermitCounter};
pub use parking::{FallbackParker, Parker, PlatformParker};
pub use queue::{
    BoundedQueue, Iter, MpmcQueue, MpscQueue, SpmcQueue, SpscQueue, TryIter,
};
