//! Fixed capacity slot storage
//!
//! A pre-allocated block of exactly N slots. No element is ever
//! default-constructed: each slot holds `MaybeUninit<T>` plus a state word.
//! The storage never constructs or destroys elements on its own; the queue
//! does that through the slot's claim protocol.
//!
//! Slot state machine:
//!
//! ```text
//!   EMPTY ──claim──▶ WRITING ──publish──▶ FULL
//!     ▲                                    │
//!     └──publish── READING ◀──claim────────┘
//! ```
//!
//! Both claims are compare-and-swap transitions, so one slot is never written
//! or read by two threads at once, even when a multi-writer side laps a peer
//! that is still working on the previous round of the same slot.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU8, Ordering};
use crate::backoff::Backoff;
use crate::constants::CACHE_LINE_SIZE;

const EMPTY: u8 = 0;
const WRITING: u8 = 1;
const FULL: u8 = 2;
const READING: u8 = 3;

/// One storage cell holding at most one element
pub struct Slot<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

// Safety: access to `value` is serialized by the `state` claim protocol
unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

impl<T> Slot<T> {
    /// Create an empty (unconstructed) slot
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(EMPTY),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Check if the slot currently holds a live element
    #[inline]
    pub fn is_full(&self) -> bool {
        self.state.load(Ordering::Acquire) == FULL
    }

    /// Move `value` into the slot
    ///
    /// Waits (spin, then yield) while a previous occupant has not been
    /// moved out yet. The element is published with `Release` ordering.
    ///
    /// The caller must hold a produce permit for this slot's index, otherwise
    /// the wait may never end.
    #[inline]
    pub fn write(&self, value: T, backoff: &mut Backoff) {
        while self.state
            .compare_exchange_weak(EMPTY, WRITING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }

        // Safety: WRITING grants exclusive access and the cell is unconstructed
        unsafe { (*self.value.get()).write(value) };

        self.state.store(FULL, Ordering::Release);
    }

    /// Move the element out, leaving the slot empty
    ///
    /// Waits (spin, then yield) while the element is still being written.
    ///
    /// The caller must hold a consume permit for this slot's index, otherwise
    /// the wait may never end.
    #[inline]
    pub fn take(&self, backoff: &mut Backoff) -> T {
        while self.state
            .compare_exchange_weak(FULL, READING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }

        // Safety: READING grants exclusive access and the cell holds a live T
        let value = unsafe { (*self.value.get()).assume_init_read() };

        self.state.store(EMPTY, Ordering::Release);
        value
    }

    /// Destroy the element in place if the slot is full
    ///
    /// Returns whether an element was destroyed. Requires exclusive access,
    /// so no claim can be in flight.
    pub fn clear(&mut self) -> bool {
        if *self.state.get_mut() != FULL {
            return false;
        }
        *self.state.get_mut() = EMPTY;
        // Safety: FULL means the cell holds a live T, and &mut excludes peers
        unsafe { self.value.get_mut().assume_init_drop() };
        true
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exactly N slots allocated once, never resized
pub struct FixedStorage<T> {
    slots: Box<[Slot<T>]>,
}

impl<T> FixedStorage<T> {
    /// Allocate `capacity` empty slots
    pub fn new(capacity: usize) -> Self {
        let slots: Box<[Slot<T>]> = (0..capacity).map(|_| Slot::new()).collect();
        Self { slots }
    }

    /// Number of slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot at `index`
    ///
    /// Indices must already be reduced modulo capacity. Bounds are only
    /// checked in debug builds.
    #[inline]
    pub fn get(&self, index: usize) -> &Slot<T> {
        debug_assert!(
            index < self.slots.len(),
            "slot index {} out of range for capacity {}",
            index,
            self.slots.len()
        );
        // Safety: every caller reduces the index mod capacity
        unsafe { self.slots.get_unchecked(index) }
    }

    /// Count slots holding a live element (advisory under concurrency)
    pub fn full_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_full()).count()
    }

    /// Destroy every remaining element, returning how many were destroyed
    pub fn clear(&mut self) -> usize {
        self.slots.iter_mut().map(|s| s.clear()).filter(|&b| b).count()
    }
}

/// Pads and aligns a value to a cache line
///
/// Keeps the producer-side and consumer-side indices from sharing a line.
#[repr(align(64))]
pub struct CachePadded<T> {
    value: T,
}

const _: () = assert!(core::mem::align_of::<CachePadded<u8>>() == CACHE_LINE_SIZE);

impl<T> CachePadded<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}
