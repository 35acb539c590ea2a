//! Error types for bounded queue operations

use core::fmt;
use crate::discipline::DisciplineKind;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue no longer accepts pushes, or has been fully drained (for pops)
    Closed,

    /// No free slot (for try_push)
    Full,

    /// No full slot (for try_pop)
    Empty,

    /// Bounded wait elapsed before a permit became available
    Timeout,

    /// `close()` called on a queue that was already closed
    AlreadyClosed,

    /// Capacity must be at least 1
    InvalidCapacity(usize),

    /// Configured discipline does not match the queue type
    DisciplineMismatch {
        expected: DisciplineKind,
        found: DisciplineKind,
    },

    /// Configuration rejected by validation
    InvalidConfig(&'static str),
}

impl QueueError {
    /// Whether the caller can reasonably retry the same operation later
    #[inline]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, QueueError::Full | QueueError::Empty | QueueError::Timeout)
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Closed => write!(f, "queue closed"),
            QueueError::Full => write!(f, "queue full"),
            QueueError::Empty => write!(f, "queue empty"),
            QueueError::Timeout => write!(f, "operation timed out"),
            QueueError::AlreadyClosed => write!(f, "queue already closed"),
            QueueError::InvalidCapacity(n) => write!(f, "invalid capacity: {}", n),
            QueueError::DisciplineMismatch { expected, found } => {
                write!(f, "discipline mismatch: queue is {}, config asks for {}", expected, found)
            }
            QueueError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for QueueError {}

/// Error returned by push operations, handing the rejected value back
#[derive(Clone, PartialEq, Eq)]
pub struct PushError<T> {
    pub value: T,
    pub error: QueueError,
}

impl<T> PushError<T> {
    #[inline]
    pub fn new(value: T, error: QueueError) -> Self {
        Self { value, error }
    }

    /// Recover the value that was not enqueued
    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.error == QueueError::Full
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.error == QueueError::Closed
    }
}

// Manual impl so T does not need Debug
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push rejected: {}", self.error)
    }
}

impl<T> std::error::Error for PushError<T> {}

impl<T> From<PushError<T>> for QueueError {
    fn from(e: PushError<T>) -> Self {
        e.error
    }
}

/// Error returned by fallible in-place construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmplaceError<E> {
    /// Queue refused admission, the constructor was never run
    Queue(QueueError),

    /// The element's constructor failed; the claimed capacity was rolled back
    Construct(E),
}

impl<E: fmt::Display> fmt::Display for EmplaceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmplaceError::Queue(e) => write!(f, "{}", e),
            EmplaceError::Construct(e) => write!(f, "element construction failed: {}", e),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for EmplaceError<E> {}

impl<E> From<QueueError> for EmplaceError<E> {
    fn from(e: QueueError) -> Self {
        EmplaceError::Queue(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", QueueError::Closed), "queue closed");
        assert_eq!(format!("{}", QueueError::InvalidCapacity(0)), "invalid capacity: 0");

        let e = QueueError::DisciplineMismatch {
            expected: DisciplineKind::Spsc,
            found: DisciplineKind::Mpmc,
        };
        assert_eq!(
            format!("{}", e),
            "discipline mismatch: queue is spsc, config asks for mpmc"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(QueueError::Full.is_recoverable());
        assert!(QueueError::Empty.is_recoverable());
        assert!(QueueError::Timeout.is_recoverable());
        assert!(!QueueError::Closed.is_recoverable());
        assert!(!QueueError::AlreadyClosed.is_recoverable());
    }

    #[test]
    fn test_push_error_returns_value() {
        let err = PushError::new(String::from("payload"), QueueError::Full);
        assert!(err.is_full());
        assert!(!err.is_closed());
        assert_eq!(format!("{}", err), "push rejected: queue full");
        assert_eq!(err.into_inner(), "payload");
    }

    #[test]
    fn test_emplace_error_conversion() {
        let e: EmplaceError<&str> = QueueError::Closed.into();
        assert_eq!(e, EmplaceError::Queue(QueueError::Closed));

        let e: EmplaceError<&str> = EmplaceError::Construct("bad input");
        assert_eq!(format!("{}", e), "element construction failed: bad input");
    }
}
