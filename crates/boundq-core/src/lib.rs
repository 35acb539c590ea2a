//! # boundq-core
//!
//! Platform-agnostic building blocks of the boundq bounded queue.
//!
//! This crate contains no OS-specific code. Blocking, parking and the queue
//! itself live in `boundq-runtime`.
//!
//! ## Modules
//!
//! - `storage` - Fixed capacity slot storage and the per-slot claim protocol
//! - `discipline` - Head/tail index claiming rules (SPSC, MPSC, SPMC, MPMC)
//! - `state` - Queue lifecycle state
//! - `backoff` - Spin-then-yield backoff
//! - `error` - Error types
//! - `kprint` - Leveled stderr logging macros
//! - `env` - Environment variable utilities

pub mod storage;
pub mod discipline;
pub mod state;
pub mod backoff;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use storage::{CachePadded, FixedStorage, Slot};
pub use discipline::{
    AtomicIndex, Discipline, DisciplineKind, IndexClaim, Mpmc, Mpsc, SingleIndex, Spmc, Spsc,
};
pub use state::QueueState;
pub use backoff::Backoff;
pub use error::{EmplaceError, PushError, QueueError, QueueResult};
pub use env::{env_get, env_get_bool, env_get_duration_ms, env_get_opt, env_get_str, env_is_set};

/// Layout constants
pub mod constants {
    /// Cache line size for alignment of shared indices
    pub const CACHE_LINE_SIZE: usize = 64;

    /// Smallest allowed queue capacity
    pub const MIN_CAPACITY: usize = 1;
}
