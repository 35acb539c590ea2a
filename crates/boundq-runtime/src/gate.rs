//! Admission gate: counting permits for producers and consumers
//!
//! Two independent permit counters bound how many producers and consumers
//! may proceed at once:
//!
//! - `produce`: slots currently empty (safe to construct into), starts at N
//! - `consume`: slots currently full (safe to move out of), starts at 0
//!
//! With no claim in flight, `produce + consume == N`.
//!
//! Releasing a permit uses `Release` ordering and a successful acquire uses
//! `AcqRel`, so whatever a producer wrote before releasing a consume permit
//! is visible to the consumer that acquires it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use crate::parking::{Parker, PlatformParker};

/// Outcome of a blocking acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A permit was taken
    Acquired,
    /// The cancel predicate reported true; no permit was taken
    Cancelled,
    /// The deadline passed; no permit was taken
    TimedOut,
}

/// A counting semaphore with cancellable, optionally timed waits
pub struct PermitCounter<P: Parker = PlatformParker> {
    permits: AtomicUsize,
    parker: P,
}

impl PermitCounter<PlatformParker> {
    /// Create a counter holding `initial` permits
    pub fn new(initial: usize) -> Self {
        Self::with_parker(initial, PlatformParker::new())
    }
}

impl<P: Parker> PermitCounter<P> {
    /// Create a counter using a specific parking implementation
    pub fn with_parker(initial: usize, parker: P) -> Self {
        Self {
            permits: AtomicUsize::new(initial),
            parker,
        }
    }

    /// Take a permit if one is available, without blocking
    #[inline]
    pub fn try_acquire(&self) -> bool {
        let mut current = self.permits.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return false;
            }
            match self.permits.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Block until a permit is taken, `cancel` reports true, or `timeout` elapses
    ///
    /// `cancel` is re-evaluated after every wake. When it reports true a
    /// final `try_acquire` is still attempted, so a permit released just
    /// before cancellation is not stranded. A cancelled or timed-out acquire
    /// never decrements the count.
    pub fn acquire<F>(&self, timeout: Option<Duration>, cancel: F) -> Acquire
    where
        F: Fn() -> bool,
    {
        if self.try_acquire() {
            return Acquire::Acquired;
        }

        // A deadline past what Instant can represent is an unbounded wait
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let epoch = self.parker.prepare_park();

            if self.try_acquire() {
                return Acquire::Acquired;
            }
            if cancel() {
                return if self.try_acquire() {
                    Acquire::Acquired
                } else {
                    Acquire::Cancelled
                };
            }

            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Acquire::TimedOut;
                    }
                    Some(deadline - now)
                }
                None => None,
            };

            self.parker.park(epoch, remaining);
        }
    }

    /// Return a permit and wake at most one waiter
    #[inline]
    pub fn release(&self) {
        self.permits.fetch_add(1, Ordering::Release);
        self.parker.unpark_one();
    }

    /// Wake every waiter without adding permits
    ///
    /// Waiters re-check their cancel predicate; used when the queue closes.
    pub fn release_all(&self) {
        self.parker.unpark_all();
    }

    /// Sample the number of available permits (advisory)
    #[inline]
    pub fn available(&self) -> usize {
        self.permits.load(Ordering::Acquire)
    }

    /// Number of threads currently blocked in `acquire` (hint)
    #[inline]
    pub fn waiters(&self) -> usize {
        self.parker.parked_count()
    }
}

/// The pair of permit counters guarding one queue
pub struct AdmissionGate<P: Parker = PlatformParker> {
    /// Empty slots: producers take, consumers give back
    pub produce: PermitCounter<P>,
    /// Full slots: consumers take, producers give back
    pub consume: PermitCounter<P>,
    capacity: usize,
}

impl AdmissionGate<PlatformParker> {
    /// Create a gate for `capacity` slots, all empty
    pub fn new(capacity: usize) -> Self {
        Self {
            produce: PermitCounter::new(capacity),
            consume: PermitCounter::new(0),
            capacity,
        }
    }
}

impl<P: Parker> AdmissionGate<P> {
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of both counters; equals capacity whenever no claim is in flight
    #[inline]
    pub fn permits_total(&self) -> usize {
        self.produce.available() + self.consume.available()
    }

    /// Wake every blocked producer and consumer
    pub fn wake_all(&self) {
        self.consume.release_all();
        self.produce.release_all();
    }
}
