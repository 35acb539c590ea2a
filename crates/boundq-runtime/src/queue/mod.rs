//! Bounded multi-discipline concurrent queue
//!
//! A fixed ring of N slots shared by producers and consumers. The discipline
//! type parameter picks which side(s) claim indices atomically; everything
//! else is the same for all four disciplines.
//!
//! # Push path
//!
//! 1. Take a produce permit (blocks while full, aborts once closed)
//! 2. Re-validate that the queue is still open
//! 3. Construct the element (may fail; the permit is handed back)
//! 4. Claim a tail index and move the element into that slot
//! 5. Release a consume permit
//!
//! # Pop path
//!
//! 1. Take a consume permit (blocks while empty, aborts once drained)
//! 2. Claim a head index and move the element out
//! 3. Release a produce permit
//!
//! No lock is held across either path. The only suspension point is the
//! permit wait in the admission gate.
//!
//! # Lifecycle
//!
//! `close()` moves `Open → Draining` and wakes every blocked producer and
//! consumer. Producers are rejected from then on; consumers keep receiving
//! until nothing is left and no admitted producer is mid-publication, at
//! which point the queue reads as `Closed` and every pop fails fast.
//!
//! # Preconditions
//!
//! The single side of `Spsc`, `Mpsc` and `Spmc` must never be used by two
//! threads at once. This is checked by assertions in debug builds only.
//! Element construction must not itself block on an operation of the same
//! queue.

#[cfg(test)]
mod tests;

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use boundq_core::{
    kdebug, ktrace, kwarn, Backoff, CachePadded, Discipline, DisciplineKind, EmplaceError,
    FixedStorage, IndexClaim, Mpmc, Mpsc, PushError, QueueError, QueueResult, QueueState, Spmc,
    Spsc,
};
use crate::config::QueueConfig;
use crate::gate::{Acquire, AdmissionGate};

/// Single producer, single consumer queue
pub type SpscQueue<T> = BoundedQueue<T, Spsc>;
/// Multi producer, single consumer queue
pub type MpscQueue<T> = BoundedQueue<T, Mpsc>;
/// Single producer, multi consumer queue
pub type SpmcQueue<T> = BoundedQueue<T, Spmc>;
/// Multi producer, multi consumer queue
pub type MpmcQueue<T> = BoundedQueue<T, Mpmc>;

/// How long an operation may wait for a permit
#[derive(Debug, Clone, Copy)]
enum Wait {
    Never,
    Until(Option<Duration>),
}

/// A bounded FIFO of capacity N with a selectable concurrency discipline
///
/// Share it between threads with `Arc`.
///
/// # Example
///
/// ```ignore
/// use boundq_runtime::SpscQueue;
///
/// let queue = SpscQueue::new(4)?;
/// queue.push(1)?;
/// assert_eq!(queue.pop()?, 1);
/// queue.close()?;
/// assert!(queue.pop().is_err());
/// ```
pub struct BoundedQueue<T, D: Discipline = Mpmc> {
    storage: FixedStorage<T>,

    /// Next slot to construct into (producer side)
    tail: CachePadded<D::Tail>,

    /// Next slot to move out of (consumer side)
    head: CachePadded<D::Head>,

    gate: AdmissionGate,

    /// Stored lifecycle: only `Open` or `Draining`
    state: AtomicU8,

    /// Producers holding a produce permit that have not published yet
    pending: AtomicUsize,

    spin_limit: u32,
    debug_logging: bool,
    _discipline: PhantomData<D>,
}

impl<T, D: Discipline> BoundedQueue<T, D> {
    /// Create an open queue with `capacity` slots
    pub fn new(capacity: usize) -> QueueResult<Self> {
        Self::with_config(&QueueConfig::new().capacity(capacity).discipline(D::KIND))
    }

    /// Create a queue from a validated configuration
    ///
    /// Fails with `DisciplineMismatch` if `config.discipline` is not `D`.
    pub fn with_config(config: &QueueConfig) -> QueueResult<Self> {
        if let Err(e) = config.validate() {
            kwarn!("rejected queue config: {}", e);
            return Err(e);
        }
        if config.discipline != D::KIND {
            kwarn!("rejected queue config: {} requested for a {} queue", config.discipline, D::KIND);
            return Err(QueueError::DisciplineMismatch {
                expected: D::KIND,
                found: config.discipline,
            });
        }

        if config.debug_logging {
            kdebug!(
                "creating {} queue: capacity={} spin_limit={}",
                D::KIND,
                config.capacity,
                config.spin_limit
            );
        }

        Ok(Self {
            storage: FixedStorage::new(config.capacity),
            tail: CachePadded::new(D::Tail::new()),
            head: CachePadded::new(D::Head::new()),
            gate: AdmissionGate::new(config.capacity),
            state: AtomicU8::new(QueueState::Open.into()),
            pending: AtomicUsize::new(0),
            spin_limit: config.spin_limit,
            debug_logging: config.debug_logging,
            _discipline: PhantomData,
        })
    }

    // ------------------------------------------------------------------
    // Producers
    // ------------------------------------------------------------------

    /// Push a value, blocking while the queue is full
    ///
    /// Fails with `Closed` if the queue was closed before or during the wait.
    /// The value is handed back inside the error.
    pub fn push(&self, value: T) -> Result<(), PushError<T>> {
        self.push_inner(value, Wait::Until(None))
    }

    /// Push a value, waiting at most `timeout` for a free slot
    pub fn push_timeout(&self, value: T, timeout: Duration) -> Result<(), PushError<T>> {
        self.push_inner(value, Wait::Until(Some(timeout)))
    }

    /// Push a value without blocking
    ///
    /// Fails with `Full` if no slot is free, `Closed` after `close()`.
    pub fn try_push(&self, value: T) -> Result<(), PushError<T>> {
        self.push_inner(value, Wait::Never)
    }

    /// Construct an element once a slot is reserved, blocking while full
    ///
    /// `f` runs only after admission. If it panics, the reservation is
    /// released before the panic propagates.
    pub fn emplace_with<F>(&self, f: F) -> QueueResult<()>
    where
        F: FnOnce() -> T,
    {
        self.emplace_inner(Wait::Until(None), || Ok::<T, Infallible>(f()))
            .map_err(unwrap_infallible)
    }

    /// `emplace_with`, waiting at most `timeout` for a free slot
    pub fn emplace_timeout<F>(&self, timeout: Duration, f: F) -> QueueResult<()>
    where
        F: FnOnce() -> T,
    {
        self.emplace_inner(Wait::Until(Some(timeout)), || Ok::<T, Infallible>(f()))
            .map_err(unwrap_infallible)
    }

    /// Construct an element with a fallible constructor, blocking while full
    ///
    /// If `f` fails, the reserved capacity is rolled back: the tail index is
    /// never advanced, no slot becomes full, and the next push reuses the
    /// same slot. The constructor's error is returned as
    /// `EmplaceError::Construct`.
    pub fn try_emplace_with<E, F>(&self, f: F) -> Result<(), EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.emplace_inner(Wait::Until(None), f)
    }

    fn push_inner(&self, value: T, wait: Wait) -> Result<(), PushError<T>> {
        match self.admit_producer(wait) {
            Ok(()) => {
                self.publish(value);
                Ok(())
            }
            Err(e) => Err(PushError::new(value, e)),
        }
    }

    fn emplace_inner<E, F>(&self, wait: Wait, f: F) -> Result<(), EmplaceError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.admit_producer(wait)?;

        let reservation = Reservation::new(self);
        match f() {
            Ok(value) => {
                reservation.commit();
                self.publish(value);
                Ok(())
            }
            Err(e) => {
                drop(reservation);
                ktrace!("element construction failed, slot reservation rolled back");
                Err(EmplaceError::Construct(e))
            }
        }
    }

    /// Take a produce permit and register as an in-flight producer
    fn admit_producer(&self, wait: Wait) -> QueueResult<()> {
        if !self.is_open() {
            return Err(QueueError::Closed);
        }

        let outcome = match wait {
            Wait::Never => {
                if !self.gate.produce.try_acquire() {
                    return Err(QueueError::Full);
                }
                Acquire::Acquired
            }
            Wait::Until(timeout) => self.gate.produce.acquire(timeout, || !self.is_open()),
        };

        match outcome {
            Acquire::Acquired => {}
            Acquire::Cancelled => return Err(QueueError::Closed),
            Acquire::TimedOut => return Err(QueueError::Timeout),
        }

        self.pending.fetch_add(1, Ordering::SeqCst);

        // close() may have run while we waited or right after we woke
        if !self.is_open() {
            self.abandon_producer();
            return Err(QueueError::Closed);
        }
        Ok(())
    }

    /// Hand back an unused produce permit
    fn abandon_producer(&self) {
        self.gate.produce.release();
        self.finish_producer();
    }

    fn finish_producer(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 && !self.is_open() {
            // Consumers parked on an empty draining queue must re-check
            // whether it is now fully drained
            self.gate.consume.release_all();
        }
    }

    /// Move a constructed value into the next tail slot and publish it
    fn publish(&self, value: T) {
        let index = self.tail.claim(self.capacity());
        let mut backoff = Backoff::new(self.spin_limit);
        self.storage.get(index).write(value, &mut backoff);
        self.gate.consume.release();
        self.finish_producer();
    }

    // ------------------------------------------------------------------
    // Consumers
    // ------------------------------------------------------------------

    /// Pop the oldest value, blocking while the queue is empty
    ///
    /// Fails with `Closed` only once the queue is closed and drained.
    pub fn pop(&self) -> QueueResult<T> {
        self.admit_consumer(Wait::Until(None))?;
        Ok(self.take())
    }

    /// Pop, waiting at most `timeout` for a value
    pub fn pop_timeout(&self, timeout: Duration) -> QueueResult<T> {
        self.admit_consumer(Wait::Until(Some(timeout)))?;
        Ok(self.take())
    }

    /// Pop without blocking
    ///
    /// Fails with `Empty` if nothing is available yet, `Closed` once drained.
    pub fn try_pop(&self) -> QueueResult<T> {
        self.admit_consumer(Wait::Never)?;
        Ok(self.take())
    }

    /// Iterator that pops without blocking until `Empty` or `Closed`
    pub fn try_iter(&self) -> TryIter<'_, T, D> {
        TryIter { queue: self }
    }

    /// Iterator that pops, blocking, until the queue is closed and drained
    pub fn iter(&self) -> Iter<'_, T, D> {
        Iter { queue: self }
    }

    fn admit_consumer(&self, wait: Wait) -> QueueResult<()> {
        if self.gate.consume.try_acquire() {
            return Ok(());
        }

        let outcome = match wait {
            Wait::Never => {
                if !self.is_drained() {
                    return Err(QueueError::Empty);
                }
                // The last producer may have published between the two checks
                if self.gate.consume.try_acquire() {
                    Acquire::Acquired
                } else {
                    Acquire::Cancelled
                }
            }
            Wait::Until(timeout) => self.gate.consume.acquire(timeout, || self.is_drained()),
        };

        match outcome {
            Acquire::Acquired => Ok(()),
            Acquire::Cancelled => Err(QueueError::Closed),
            Acquire::TimedOut => Err(QueueError::Timeout),
        }
    }

    /// Move the value out of the next head slot and free the slot
    fn take(&self) -> T {
        let index = self.head.claim(self.capacity());
        let mut backoff = Backoff::new(self.spin_limit);
        let value = self.storage.get(index).take(&mut backoff);
        self.gate.produce.release();
        value
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Stop accepting pushes and wake every blocked producer and consumer
    ///
    /// Items already in the queue can still be popped. Closing twice is an
    /// error (`AlreadyClosed`) and has no further effect.
    pub fn close(&self) -> QueueResult<()> {
        if self
            .state
            .compare_exchange(
                QueueState::Open.into(),
                QueueState::Draining.into(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            kwarn!("close() called on a {} queue that is already {}", D::KIND, self.state());
            return Err(QueueError::AlreadyClosed);
        }

        if self.debug_logging {
            kdebug!(
                "{} queue closed: {} items left to drain, {} producers in flight",
                D::KIND,
                self.approx_size(),
                self.pending.load(Ordering::SeqCst)
            );
        }

        self.gate.wake_all();
        Ok(())
    }

    /// Whether `close()` has been called
    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Current lifecycle state
    ///
    /// `Closed` is reported once the queue is draining, empty, and no
    /// admitted producer is still publishing.
    pub fn state(&self) -> QueueState {
        if self.is_open() {
            QueueState::Open
        } else if self.is_drained() && self.gate.consume.available() == 0 {
            QueueState::Closed
        } else {
            QueueState::Draining
        }
    }

    #[inline]
    fn is_open(&self) -> bool {
        self.state.load(Ordering::SeqCst) == u8::from(QueueState::Open)
    }

    /// Closed with no producer left that could still publish
    #[inline]
    fn is_drained(&self) -> bool {
        !self.is_open() && self.pending.load(Ordering::SeqCst) == 0
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Number of slots, fixed at construction
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Number of items ready to pop, sampled once (advisory)
    #[inline]
    pub fn approx_size(&self) -> usize {
        self.gate.consume.available()
    }

    /// Number of slots free for pushing, sampled once (advisory)
    #[inline]
    pub fn approx_free(&self) -> usize {
        self.gate.produce.available()
    }

    /// Advisory: nothing ready to pop
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.approx_size() == 0
    }

    /// Advisory: no slot free for pushing
    #[inline]
    pub fn is_full(&self) -> bool {
        self.approx_free() == 0
    }

    /// Discipline this queue was built with
    #[inline]
    pub fn discipline(&self) -> DisciplineKind {
        D::KIND
    }
}

impl<T, D: Discipline> Drop for BoundedQueue<T, D> {
    fn drop(&mut self) {
        let destroyed = self.storage.clear();
        if destroyed > 0 {
            kdebug!("{} queue dropped with {} undrained items", D::KIND, destroyed);
        }
    }
}

impl<T, D: Discipline> fmt::Debug for BoundedQueue<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("discipline", &D::KIND)
            .field("capacity", &self.capacity())
            .field("state", &self.state())
            .field("approx_size", &self.approx_size())
            .field("blocked_producers", &self.gate.produce.waiters())
            .field("blocked_consumers", &self.gate.consume.waiters())
            .finish()
    }
}

fn unwrap_infallible(e: EmplaceError<Infallible>) -> QueueError {
    match e {
        EmplaceError::Queue(e) => e,
        EmplaceError::Construct(never) => match never {},
    }
}

/// A produce permit held while the element is being constructed
///
/// Dropped without `commit()` (constructor error or panic), it hands the
/// permit back so no capacity leaks and no phantom slot appears.
struct Reservation<'a, T, D: Discipline> {
    queue: &'a BoundedQueue<T, D>,
    armed: bool,
}

impl<'a, T, D: Discipline> Reservation<'a, T, D> {
    fn new(queue: &'a BoundedQueue<T, D>) -> Self {
        Self { queue, armed: true }
    }

    fn commit(mut self) {
        self.armed = false;
    }
}

impl<'a, T, D: Discipline> Drop for Reservation<'a, T, D> {
    fn drop(&mut self) {
        if self.armed {
            self.queue.abandon_producer();
        }
    }
}

/// Non-blocking draining iterator, see `BoundedQueue::try_iter`
pub struct TryIter<'a, T, D: Discipline> {
    queue: &'a BoundedQueue<T, D>,
}

impl<'a, T, D: Discipline> Iterator for TryIter<'a, T, D> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.try_pop().ok()
    }
}

/// Blocking iterator, see `BoundedQueue::iter`
pub struct Iter<'a, T, D: Discipline> {
    queue: &'a BoundedQueue<T, D>,
}

impl<'a, T, D: Discipline> Iterator for Iter<'a, T, D> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.queue.pop().ok()
    }
}
