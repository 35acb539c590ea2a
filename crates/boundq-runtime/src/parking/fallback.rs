//! Fallback parking using std::sync::Condvar
//!
//! Used on platforms without futex support, and available everywhere
//! for testing. Less efficient but portable.

use super::Parker;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Condvar-based parking (fallback)
pub struct FallbackParker {
    /// Wake epoch, guarded for the condvar
    epoch: Mutex<u32>,

    /// Condition variable
    condvar: Condvar,

    /// Count of parked threads
    parked: AtomicUsize,
}

impl FallbackParker {
    /// Create a new fallback parker
    pub fn new() -> Self {
        Self {
            epoch: Mutex::new(0),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }

    // The guarded value is a plain counter, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, u32> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        let mut guard = self.lock();
        *guard = guard.wrapping_add(1);
    }
}

impl Default for FallbackParker {
    fn default() -> Self {
        Self::new()
    }
}

impl Parker for FallbackParker {
    fn prepare_park(&self) -> u32 {
        *self.lock()
    }

    fn park(&self, epoch: u32, timeout: Option<Duration>) -> bool {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut guard = self.lock();
        self.parked.fetch_add(1, Ordering::SeqCst);

        let woken = loop {
            if *guard != epoch {
                break true;
            }
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break false;
                    }
                    let (g, _) = self
                        .condvar
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    guard = g;
                }
                None => {
                    guard = self.condvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
                }
            }
        };

        self.parked.fetch_sub(1, Ordering::SeqCst);
        woken
    }

    fn unpark_one(&self) {
        self.bump();
        if self.parked.load(Ordering::SeqCst) > 0 {
            self.condvar.notify_one();
        }
    }

    fn unpark_all(&self) {
        self.bump();
        if self.parked.load(Ordering::SeqCst) > 0 {
            self.condvar.notify_all();
        }
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
