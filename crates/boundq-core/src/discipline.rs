//! Index disciplines for claiming head/tail slot positions
//!
//! Each side of a queue (producers advance `tail`, consumers advance `head`)
//! is either single-writer or multi-writer. The single-writer side needs no
//! synchronization; the multi-writer side claims positions with a
//! compare-and-swap retry loop, the one lock-free hot path of the queue.
//!
//! | Discipline | Tail (producers) | Head (consumers) |
//! |------------|------------------|------------------|
//! | `Spsc`     | `SingleIndex`    | `SingleIndex`    |
//! | `Mpsc`     | `AtomicIndex`    | `SingleIndex`    |
//! | `Spmc`     | `SingleIndex`    | `AtomicIndex`    |
//! | `Mpmc`     | `AtomicIndex`    | `AtomicIndex`    |

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(debug_assertions)]
use core::sync::atomic::AtomicBool;

/// Rule for claiming the next slot index on one side of the queue
pub trait IndexClaim: Send + Sync {
    /// Create an index starting at position 0
    fn new() -> Self;

    /// Claim the current position and advance it to `(old + 1) % capacity`
    ///
    /// Returns the claimed (old) position, always `< capacity`.
    fn claim(&self, capacity: usize) -> usize;

    /// Sample the current position (advisory under concurrency)
    fn position(&self) -> usize;
}

/// Index for a side with exactly one concurrent writer
///
/// # Precondition
///
/// At most one thread may call `claim` at a time. Violating this is a logic
/// error caught by an assertion in debug builds only. Memory safety does not
/// depend on it: slot state transitions are still claimed atomically.
pub struct SingleIndex {
    pos: AtomicUsize,
    #[cfg(debug_assertions)]
    busy: AtomicBool,
}

impl IndexClaim for SingleIndex {
    #[inline]
    fn new() -> Self {
        Self {
            pos: AtomicUsize::new(0),
            #[cfg(debug_assertions)]
            busy: AtomicBool::new(false),
        }
    }

    #[inline]
    fn claim(&self, capacity: usize) -> usize {
        #[cfg(debug_assertions)]
        assert!(
            !self.busy.swap(true, Ordering::Acquire),
            "single-writer index claimed by two threads at once"
        );

        let old = self.pos.load(Ordering::Relaxed);
        self.pos.store((old + 1) % capacity, Ordering::Relaxed);

        #[cfg(debug_assertions)]
        self.busy.store(false, Ordering::Release);

        old
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos.load(Ordering::Relaxed)
    }
}

/// Index for a side with any number of concurrent writers
pub struct AtomicIndex {
    pos: AtomicUsize,
}

impl IndexClaim for AtomicIndex {
    #[inline]
    fn new() -> Self {
        Self {
            pos: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn claim(&self, capacity: usize) -> usize {
        let mut old = self.pos.load(Ordering::Relaxed);
        loop {
            let next = (old + 1) % capacity;
            match self.pos.compare_exchange_weak(
                old,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return old,
                Err(current) => {
                    old = current;
                    core::hint::spin_loop();
                }
            }
        }
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos.load(Ordering::Relaxed)
    }
}

/// Runtime tag for a concurrency discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DisciplineKind {
    /// Single producer, single consumer
    Spsc = 0,
    /// Multi producer, single consumer
    Mpsc = 1,
    /// Single producer, multi consumer
    Spmc = 2,
    /// Multi producer, multi consumer
    Mpmc = 3,
}

impl DisciplineKind {
    #[inline]
    pub const fn multi_producer(&self) -> bool {
        matches!(self, DisciplineKind::Mpsc | DisciplineKind::Mpmc)
    }

    #[inline]
    pub const fn multi_consumer(&self) -> bool {
        matches!(self, DisciplineKind::Spmc | DisciplineKind::Mpmc)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DisciplineKind::Spsc => "spsc",
            DisciplineKind::Mpsc => "mpsc",
            DisciplineKind::Spmc => "spmc",
            DisciplineKind::Mpmc => "mpmc",
        }
    }

    /// All disciplines, single-threaded sides first
    pub fn iter() -> impl Iterator<Item = DisciplineKind> {
        [
            DisciplineKind::Spsc,
            DisciplineKind::Mpsc,
            DisciplineKind::Spmc,
            DisciplineKind::Mpmc,
        ]
        .into_iter()
    }
}

impl fmt::Display for DisciplineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisciplineKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spsc" => Ok(DisciplineKind::Spsc),
            "mpsc" => Ok(DisciplineKind::Mpsc),
            "spmc" => Ok(DisciplineKind::Spmc),
            "mpmc" => Ok(DisciplineKind::Mpmc),
            _ => Err(()),
        }
    }
}

/// Compile-time selection of head and tail index rules
pub trait Discipline: Send + Sync + 'static {
    /// Index rule for the consumer side
    type Head: IndexClaim;
    /// Index rule for the producer side
    type Tail: IndexClaim;
    /// Runtime tag of this discipline
    const KIND: DisciplineKind;
}

/// Single producer, single consumer
#[derive(Debug, Clone, Copy, Default)]
pub struct Spsc;

/// Multi producer, single consumer
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpsc;

/// Single producer, multi consumer
#[derive(Debug, Clone, Copy, Default)]
pub struct Spmc;

/// Multi producer, multi consumer
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpmc;

impl Discipline for Spsc {
    type Head = SingleIndex;
    type Tail = SingleIndex;
    const KIND: DisciplineKind = DisciplineKind::Spsc;
}

impl Discipline for Mpsc {
    type Head = SingleIndex;
    type Tail = AtomicIndex;
    const KIND: DisciplineKind = DisciplineKind::Mpsc;
}

impl Discipline for Spmc {
    type Head = AtomicIndex;
    type Tail = SingleIndex;
    const KIND: DisciplineKind = DisciplineKind::Spmc;
}

impl Discipline for Mpmc {
    type Head = AtomicIndex;
    type Tail = AtomicIndex;
    const KIND: DisciplineKind = DisciplineKind::Mpmc;
}
