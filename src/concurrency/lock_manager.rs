//! Lock manager - page-level shared/exclusive locking.
//!
//! The lock table maps each page to the set of transactions currently
//! granted on it. At any instant a page is in one of three legal states:
//! no holders, one or more `Shared` holders, or exactly one `Exclusive`
//! holder — never a mix.
//!
//! # Upgrades
//! A transaction holding `Shared` may upgrade to `Exclusive` only while it
//! is the page's *sole* holder. Restricting upgrades this way sidesteps
//! lock-conversion deadlocks between two simultaneous upgraders: one of
//! them simply fails and retries or times out. A transaction already
//! holding `Exclusive` is granted any further request without recording
//! the weaker mode — the stronger mode subsumes it.
//!
//! # Waiting and deadlock
//! [`LockManager::acquire_timeout`] parks the calling thread on a condvar
//! that is signalled on every release, re-attempting the grant each wakeup
//! until the deadline passes. The bounded wait is the system's only
//! deadlock-avoidance mechanism: there is no cycle detection, a stuck
//! transaction times out and its caller aborts it. There is likewise no
//! fairness queue among waiters; whoever re-attempts first after a release
//! wins, so starvation is possible. Known limitation, not a bug.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::common::{PageId, TransactionId};

/// Lock strength. `Shared` admits concurrent readers; `Exclusive` admits
/// one writer and nobody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Page-level lock table with transaction-scoped grants.
#[derive(Default)]
pub struct LockManager {
    table: Mutex<HashMap<PageId, HashMap<TransactionId, LockMode>>>,
    /// Signalled on every release so waiters re-attempt their grant.
    released: Condvar,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// One non-blocking grant attempt. Returns whether the lock is now held
    /// in a mode at least as strong as `mode`.
    pub fn acquire(&self, pid: PageId, tx: TransactionId, mode: LockMode) -> bool {
        let mut table = self.table.lock();
        Self::try_grant(&mut table, pid, tx, mode)
    }

    /// Repeatedly attempt the grant until it succeeds or `timeout` elapses.
    ///
    /// Returns `false` on timeout; the caller must then treat its
    /// transaction as aborted.
    pub fn acquire_timeout(
        &self,
        pid: PageId,
        tx: TransactionId,
        mode: LockMode,
        timeout: Duration,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        let mut table = self.table.lock();
        loop {
            if Self::try_grant(&mut table, pid, tx, mode) {
                return true;
            }
            if self.released.wait_until(&mut table, deadline).timed_out() {
                // One last attempt in case the conflicting lock was dropped
                // in the window between the timeout and reacquiring the
                // table mutex.
                return Self::try_grant(&mut table, pid, tx, mode);
            }
        }
    }

    /// The mode `tx` currently holds on `pid`, if any.
    pub fn holding(&self, pid: PageId, tx: TransactionId) -> Option<LockMode> {
        self.table.lock().get(&pid).and_then(|locks| locks.get(&tx).copied())
    }

    /// Release `tx`'s lock on `pid`. Removing the last holder removes the
    /// page's row from the table entirely.
    pub fn release(&self, pid: PageId, tx: TransactionId) {
        let mut table = self.table.lock();
        if let Some(locks) = table.get_mut(&pid) {
            locks.remove(&tx);
            if locks.is_empty() {
                table.remove(&pid);
            }
        }
        drop(table);
        self.released.notify_all();
    }

    /// Release every lock `tx` holds, across all pages. Called at
    /// transaction end (commit or abort).
    pub fn release_all(&self, tx: TransactionId) {
        let mut table = self.table.lock();
        table.retain(|_, locks| {
            locks.remove(&tx);
            !locks.is_empty()
        });
        drop(table);
        self.released.notify_all();
    }

    /// Number of pages with at least one holder. Empty rows are never
    /// retained, so this is also the number of rows in the table.
    pub fn locked_page_count(&self) -> usize {
        self.table.lock().len()
    }

    fn try_grant(
        table: &mut HashMap<PageId, HashMap<TransactionId, LockMode>>,
        pid: PageId,
        tx: TransactionId,
        mode: LockMode,
    ) -> bool {
        let Some(locks) = table.get_mut(&pid) else {
            // Nobody holds anything on this page: grant outright.
            table.insert(pid, HashMap::from([(tx, mode)]));
            return true;
        };

        match locks.get(&tx).copied() {
            // Exclusive absorbs any later request by the same transaction.
            Some(LockMode::Exclusive) => true,

            Some(LockMode::Shared) => match mode {
                // Same or weaker mode: no-op success.
                LockMode::Shared => true,
                // Upgrade is legal only for the sole holder.
                LockMode::Exclusive => {
                    if locks.len() == 1 {
                        locks.insert(tx, LockMode::Exclusive);
                        true
                    } else {
                        false
                    }
                }
            },

            None => {
                if locks.is_empty() {
                    locks.insert(tx, mode);
                    return true;
                }
                let any_exclusive = locks.values().any(|m| *m == LockMode::Exclusive);
                match mode {
                    // Any existing holder denies a newcomer's Exclusive.
                    LockMode::Exclusive => false,
                    // Shared joins other Shared holders only.
                    LockMode::Shared => {
                        if any_exclusive {
                            false
                        } else {
                            locks.insert(tx, LockMode::Shared);
                            true
                        }
                    }
                }
            }
        }
    }
}
