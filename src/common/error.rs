//! Error types for galena.
//!
//! A single enum covers every failure the storage engine can surface, so
//! callers can distinguish the three recovery stories:
//! - "this transaction must roll back" ([`Error::Aborted`]),
//! - "the operation failed, transaction state is unaffected"
//!   ([`Error::CapacityExhausted`], [`Error::PageNotFound`], ...),
//! - "the medium failed, propagate and stop" ([`Error::Io`]).
//!
//! No operation ever swallows a failure by returning a default value.

use thiserror::Error;

use crate::common::{PageId, TransactionId};

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in galena.
#[derive(Debug, Error)]
pub enum Error {
    /// A page lock could not be granted within the bounded wait.
    ///
    /// The named transaction must be rolled back by its caller via
    /// `BufferPool::abort`; it may then be retried from scratch.
    #[error("{0} aborted: lock wait timed out")]
    Aborted(TransactionId),

    /// Every cached page is dirty and none can be evicted.
    ///
    /// Not retryable without first committing a writer or flushing the
    /// pool; the cache is unchanged.
    #[error("buffer pool capacity exhausted: all cached pages are dirty")]
    CapacityExhausted,

    /// I/O error from the underlying medium.
    ///
    /// Fatal for the operation in progress; never silently retried, since
    /// a retry could reorder page writes against the log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A page was requested by identity but does not exist in its file.
    #[error("{0} does not exist")]
    PageNotFound(PageId),

    /// No table with this identifier is registered in the catalog.
    #[error("unknown table {0}")]
    UnknownTable(u32),

    /// The on-disk file is malformed, e.g. its length is not an exact
    /// multiple of the page size.
    #[error("heap file corrupted: {0}")]
    Corruption(String),

    /// A collaborator broke a contract, e.g. deleting from a slot that is
    /// not occupied. Indicates a bug; fails loudly rather than masking.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A tuple's field types do not match the table it is bound for.
    #[error("tuple does not match table schema")]
    SchemaMismatch,
}
