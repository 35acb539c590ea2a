//! Queue lifecycle state

use core::fmt;

/// Lifecycle of a bounded queue
///
/// Transitions are monotonic: `Open → Draining → Closed`.
/// Only `Open` and `Draining` are ever stored; `Closed` is derived
/// (draining with nothing left to consume), so each consumer observes it
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum QueueState {
    /// Pushes and pops both permitted
    Open = 0,

    /// `close()` was called; pops continue while items remain
    Draining = 1,

    /// Drained after close; terminal
    Closed = 2,
}

impl QueueState {
    /// Check if pushes are still accepted
    #[inline]
    pub const fn accepts_push(&self) -> bool {
        matches!(self, QueueState::Open)
    }

    /// Check if pops may still succeed
    #[inline]
    pub const fn accepts_pop(&self) -> bool {
        !matches!(self, QueueState::Closed)
    }

    /// Check if `close()` has been called
    #[inline]
    pub const fn is_closing(&self) -> bool {
        !matches!(self, QueueState::Open)
    }
}

impl From<u8> for QueueState {
    fn from(v: u8) -> Self {
        match v {
            0 => QueueState::Open,
            1 => QueueState::Draining,
            _ => QueueState::Closed,
        }
    }
}

impl From<QueueState> for u8 {
    fn from(state: QueueState) -> u8 {
        state as u8
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::Open => write!(f, "open"),
            QueueState::Draining => write!(f, "draining"),
            QueueState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        for s in [QueueState::Open, QueueState::Draining, QueueState::Closed] {
            assert_eq!(QueueState::from(u8::from(s)), s);
        }
        assert_eq!(QueueState::from(200), QueueState::Closed);
    }

    #[test]
    fn test_state_permissions() {
        assert!(QueueState::Open.accepts_push());
        assert!(!QueueState::Draining.accepts_push());
        assert!(QueueState::Draining.accepts_pop());
        assert!(!QueueState::Closed.accepts_pop());
        assert!(!QueueState::Open.is_closing());
        assert!(QueueState::Closed.is_closing());
    }

    #[test]
    fn test_state_is_monotonic_order() {
        assert!(QueueState::Open < QueueState::Draining);
        assert!(QueueState::Draining < QueueState::Closed);
    }
}
