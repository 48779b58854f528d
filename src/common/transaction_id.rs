//! Transaction identifier type.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one transaction.
///
/// The storage core cares only about identity and equality: locks are owned
/// by a `TransactionId`, and a page's dirty marker names the
/// `TransactionId` that mutated it. There is no further transaction state
/// at this layer.
///
/// # Example
/// ```
/// use galena::TransactionId;
///
/// let a = TransactionId::fresh();
/// let b = TransactionId::fresh();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

impl TransactionId {
    /// Allocate a process-unique transaction identifier.
    pub fn fresh() -> Self {
        TransactionId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw identifier value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx {}", self.0)
    }
}
