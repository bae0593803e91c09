//! Request generations for discarding stale view results.
//!
//! Every selection change starts a new generation. A view computed for an
//! older generation may still finish after a newer one; its ticket is then
//! no longer current and the result is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies the generation a request was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    /// The generation number.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// A shared, monotonically increasing generation counter.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestGenerations {
    current: Arc<AtomicU64>,
}

impl RequestGenerations {
    /// Creates a counter at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation and returns its ticket. Every earlier ticket
    /// becomes stale.
    #[must_use]
    pub fn next(&self) -> RequestTicket {
        RequestTicket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The ticket of the latest generation.
    #[must_use]
    pub fn current(&self) -> RequestTicket {
        RequestTicket(self.current.load(Ordering::Acquire))
    }

    /// Whether `ticket` belongs to the latest generation.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.current() == ticket
    }
}
