//! Compile-time defaults for `QueueConfig`

use boundq_core::backoff::DEFAULT_SPIN_LIMIT;
use boundq_core::DisciplineKind;

/// Slots per queue
pub const CAPACITY: usize = 1024;

/// Concurrency discipline
pub const DISCIPLINE: DisciplineKind = DisciplineKind::Mpmc;

/// Spin rounds before yielding while a peer still holds a slot
pub const SPIN_LIMIT: u32 = DEFAULT_SPIN_LIMIT;

/// Log queue lifecycle events at debug level
pub const DEBUG_LOGGING: bool = false;

/// Upper bound accepted by `validate()`, guards against typos like `BQ_CAPACITY=1e12`
pub const MAX_CAPACITY: usize = 1 << 30;
