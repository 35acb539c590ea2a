//! Queue configuration
//!
//! Provides compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (`from_env()` only)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use boundq_runtime::config::QueueConfig;
//! use boundq_core::DisciplineKind;
//!
//! let config = QueueConfig::from_env()
//!     .capacity(256)
//!     .discipline(DisciplineKind::Spsc);
//! config.validate()?;
//! ```

pub mod defaults;

use boundq_core::env::{env_get, env_get_bool};
use boundq_core::constants::MIN_CAPACITY;
use boundq_core::{kprintln, DisciplineKind, QueueError, QueueResult};

/// Queue configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Number of slots (N ≥ 1), fixed for the queue's lifetime
    pub capacity: usize,
    /// Which sides use atomic index claiming
    pub discipline: DisciplineKind,
    /// Spin rounds before yielding while a peer still holds a slot
    pub spin_limit: u32,
    /// Log queue lifecycle events at debug level
    pub debug_logging: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `BQ_CAPACITY` - Number of slots
    /// - `BQ_DISCIPLINE` - spsc / mpsc / spmc / mpmc
    /// - `BQ_SPIN_LIMIT` - Spins before yielding on a busy slot
    /// - `BQ_DEBUG` - Log lifecycle events (0/1)
    pub fn from_env() -> Self {
        Self {
            capacity: env_get("BQ_CAPACITY", defaults::CAPACITY),
            discipline: env_get("BQ_DISCIPLINE", defaults::DISCIPLINE),
            spin_limit: env_get("BQ_SPIN_LIMIT", defaults::SPIN_LIMIT),
            debug_logging: env_get_bool("BQ_DEBUG", defaults::DEBUG_LOGGING),
        }
    }

    /// Create config with explicit defaults (no env override).
    /// Useful for testing or when you want full control.
    pub fn new() -> Self {
        Self {
            capacity: defaults::CAPACITY,
            discipline: defaults::DISCIPLINE,
            spin_limit: defaults::SPIN_LIMIT,
            debug_logging: defaults::DEBUG_LOGGING,
        }
    }

    /// Set number of slots
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Set concurrency discipline
    pub fn discipline(mut self, kind: DisciplineKind) -> Self {
        self.discipline = kind;
        self
    }

    /// Set spin rounds before yielding
    pub fn spin_limit(mut self, n: u32) -> Self {
        self.spin_limit = n;
        self
    }

    /// Enable debug logging of lifecycle events
    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> QueueResult<()> {
        if self.capacity < MIN_CAPACITY {
            return Err(QueueError::InvalidCapacity(self.capacity));
        }
        if self.capacity > defaults::MAX_CAPACITY {
            return Err(QueueError::InvalidConfig("capacity exceeds maximum"));
        }
        Ok(())
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        kprintln!("boundq configuration:");
        kprintln!("  capacity:       {}", self.capacity);
        kprintln!("  discipline:     {}", self.discipline);
        kprintln!("  spin_limit:     {}", self.spin_limit);
        kprintln!("  debug_logging:  {}", self.debug_logging);
    }
}
