//! Thread parking for blocked queue operations
//!
//! An event count: a waiter snapshots the wake epoch with `prepare_park()`,
//! re-checks its condition, then parks only if the epoch is unchanged.
//! Every `unpark_*` bumps the epoch first, so a wake that races with a
//! waiter between its check and its park is never lost.
//!
//! Platform-specific implementations use the most efficient primitive
//! available.

use std::time::Duration;

/// Platform-specific parking mechanism
///
/// Blocked `push`/`pop` calls park here until a permit is released,
/// the queue is closed, or their deadline passes.
pub trait Parker: Send + Sync {
    /// Snapshot the wake epoch before re-checking the wait condition
    fn prepare_park(&self) -> u32;

    /// Park until the epoch moves past `epoch`, or timeout
    ///
    /// Returns:
    /// - `true` if woken by `unpark_one`/`unpark_all` (or the epoch already moved)
    /// - `false` on timeout or spurious wakeup
    ///
    /// Callers must re-check their condition regardless of the return value.
    fn park(&self, epoch: u32, timeout: Option<Duration>) -> bool;

    /// Wake at most one parked thread
    fn unpark_one(&self);

    /// Wake every parked thread
    fn unpark_all(&self);

    /// Number of currently parked threads (hint, may be stale)
    fn parked_count(&self) -> usize;
}

mod fallback;
pub use fallback::FallbackParker;

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexParker as PlatformParker;
    } else {
        pub use fallback::FallbackParker as PlatformParker;
    }
}
