//! Linux futex-based parking
//!
//! Futex word semantics: the word is a wake epoch, bumped by every unpark.
//!
//! When a thread parks:
//! 1. Snapshot the epoch (`prepare_park`) and re-check its condition
//! 2. Increment parked count
//! 3. FUTEX_WAIT on the epoch word (returns at once if it moved)
//! 4. Decrement parked count on return
//!
//! When waking:
//! 1. Bump the epoch
//! 2. FUTEX_WAKE 1 or all waiters, skipped when nobody is parked

use super::Parker;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

/// Linux futex-based parking
pub struct FutexParker {
    /// Futex word: wake epoch
    epoch: AtomicU32,

    /// Count of parked threads (lets unpark skip the syscall)
    parked: AtomicUsize,
}

impl FutexParker {
    /// Create a new futex parker
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            parked: AtomicUsize::new(0),
        }
    }

    fn wake(&self, count: i32) {
        // Bump before checking parked: pairs with the waiter's
        // parked increment preceding its FUTEX_WAIT value check
        self.epoch.fetch_add(1, Ordering::SeqCst);

        if self.parked.load(Ordering::SeqCst) == 0 {
            return;
        }

        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                count,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }
}

impl Default for FutexParker {
    fn default() -> Self {
        Self::new()
    }
}

impl Parker for FutexParker {
    #[inline]
    fn prepare_park(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn park(&self, epoch: u32, timeout: Option<Duration>) -> bool {
        self.parked.fetch_add(1, Ordering::SeqCst);

        // Waits longer than i32::MAX seconds are treated as unbounded
        let timespec = timeout.filter(|d| d.as_secs() < i32::MAX as u64).map(|d| libc::timespec {
            tv_sec: d.as_secs() as libc::time_t,
            tv_nsec: d.subsec_nanos() as libc::c_long,
        });

        let timespec_ptr = match &timespec {
            Some(ts) => ts as *const libc::timespec,
            None => std::ptr::null(),
        };

        // FUTEX_WAIT: sleep only while the epoch still equals our snapshot
        let result = unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                epoch,
                timespec_ptr,
                std::ptr::null::<u32>(),
                0u32,
            )
        };

        self.parked.fetch_sub(1, Ordering::SeqCst);

        if result == 0 {
            return true;
        }

        // EAGAIN: epoch already moved, which counts as a wake.
        // ETIMEDOUT / EINTR: not woken.
        let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
        errno == libc::EAGAIN
    }

    fn unpark_one(&self) {
        self.wake(1);
    }

    fn unpark_all(&self) {
        self.wake(i32::MAX);
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}

// Safety: FutexParker only contains atomics
unsafe impl Send for FutexParker {}
unsafe impl Sync for FutexParker {}
