//! Spin-then-yield backoff for short waits on a peer thread
//!
//! Used while a claimed slot is still being written or read by the thread
//! that claimed it on the previous lap. Such waits last as long as one
//! element move, so spinning with pause hints comes first; after
//! `spin_limit` rounds the OS thread yields instead.

/// Default number of spin rounds before yielding
pub const DEFAULT_SPIN_LIMIT: u32 = 64;

/// Exponential spin backoff with a yield fallback
#[derive(Debug)]
pub struct Backoff {
    step: u32,
    spin_limit: u32,
}

impl Backoff {
    /// Create a backoff that spins for `spin_limit` rounds before yielding
    #[inline]
    pub const fn new(spin_limit: u32) -> Self {
        Self { step: 0, spin_limit }
    }

    /// Wait a little, longer on each call
    #[inline]
    pub fn snooze(&mut self) {
        if self.step < self.spin_limit {
            for _ in 0..(1u32 << self.step.min(6)) {
                core::hint::spin_loop();
            }
        } else {
            std::thread::yield_now();
        }
        self.step = self.step.saturating_add(1);
    }

    /// Whether spinning is over and waits now yield the thread
    #[inline]
    pub fn is_yielding(&self) -> bool {
        self.step >= self.spin_limit
    }

    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_SPIN_LIMIT)
    }
}
