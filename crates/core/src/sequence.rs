//! Sequence counter for log records
//!
//! Hands out strictly increasing, unique sequence numbers to any number of
//! concurrent callers. Used only for ordering external output; nothing in the
//! protocol makes synchronization decisions based on these values.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic sequence counter.
///
/// The first value handed out is 1. Increments are a single atomic
/// read-modify-write, so two callers can never observe the same value.
#[derive(Debug)]
pub struct SequenceCounter {
    last: AtomicU64,
}

impl SequenceCounter {
    /// Create a counter whose first `next()` returns 1
    pub const fn new() -> Self {
        Self::starting_after(0)
    }

    /// Create a counter whose first `next()` returns `last + 1`
    pub const fn starting_after(last: u64) -> Self {
        SequenceCounter {
            last: AtomicU64::new(last),
        }
    }

    /// Allocate the next sequence number
    #[inline]
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last value handed out (0 if none)
    #[inline]
    pub fn current(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
