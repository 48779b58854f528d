//! Concurrency control - the page-level lock table.
//!
//! Strict two-phase locking at page granularity: locks are granted through
//! [`LockManager`] and held until their transaction commits or aborts,
//! which gives conflict-serializable execution without per-tuple
//! bookkeeping.

mod lock_manager;

pub use lock_manager::{LockManager, LockMode};
