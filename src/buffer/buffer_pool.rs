//! Buffer pool - the page cache and transaction orchestrator.
//!
//! Every page access in the system funnels through [`BufferPool::get_page`]:
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         BufferPool                           │
//! │  ┌───────────────┐  ┌──────────────────┐  ┌──────────────┐  │
//! │  │  LockManager  │  │  EvictionCache   │  │   Catalog    │  │
//! │  │ page-level 2PL│─▶│ PageId → PageRef │─▶│ id → HeapFile│  │
//! │  └───────────────┘  └──────────────────┘  └──────────────┘  │
//! │          lock first,     then cache,         then disk      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # No-steal
//! The eviction step never writes a dirty page: a dirty page's only path
//! to disk is an explicit flush, on commit or via [`BufferPool::flush_all`].
//! That is what makes [`BufferPool::abort`] trivially correct — discarding
//! the in-memory copy suffices, the medium was never touched.
//!
//! # Lock ordering
//! The lock-table decision always comes before any cache access. The cache
//! mutex is never held while blocking on a page's RwLock (eviction uses a
//! non-blocking read attempt), and a page's RwLock is never held while
//! taking the cache mutex.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rand::Rng;

use crate::buffer::eviction::EvictionCache;
use crate::buffer::stats::PoolStats;
use crate::common::config::{LOCK_TIMEOUT_BASE_MS, LOCK_TIMEOUT_JITTER_MS};
use crate::common::{Error, PageId, Result, TransactionId};
use crate::concurrency::{LockManager, LockMode};
use crate::recovery::WalManager;
use crate::storage::{Catalog, HeapPage, Tuple};

/// A cached page handle.
///
/// Shared-lock holders take the read side and must treat the page as
/// read-only; the exclusive holder takes the write side to mutate in
/// place. The RwLock makes a data race impossible even for a caller that
/// ignores the lock discipline; *which* transactions may hold which side
/// is the lock manager's business.
pub type PageRef = Arc<RwLock<HeapPage>>;

/// Fixed-capacity page cache with page-level two-phase locking.
///
/// One `BufferPool` instance serves one running database; collaborators
/// receive it explicitly (usually as `Arc<BufferPool>`) rather than
/// through ambient global state.
pub struct BufferPool {
    /// Maximum number of cached pages, fixed at construction.
    capacity: usize,
    cache: Mutex<EvictionCache<PageId, PageRef>>,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    wal: Arc<WalManager>,
    stats: PoolStats,
}

impl BufferPool {
    /// Create a pool caching up to `capacity` pages.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, catalog: Arc<Catalog>, wal: Arc<WalManager>) -> Self {
        BufferPool {
            capacity,
            cache: Mutex::new(EvictionCache::new(capacity)),
            lock_manager: LockManager::new(),
            catalog,
            wal,
            stats: PoolStats::new(),
        }
    }

    // ========================================================================
    // Public API: page access
    // ========================================================================

    /// Fetch a page on behalf of `tx`, acquiring `mode` on it first.
    ///
    /// Blocks while a conflicting lock is held, up to a randomized bound;
    /// if the bound expires this returns [`Error::Aborted`] and the caller
    /// must roll the transaction back with [`BufferPool::abort`]. On a
    /// cache miss the page is read from its heap file, which may evict the
    /// least recently used clean page.
    ///
    /// # Errors
    /// - [`Error::Aborted`] - the lock wait timed out
    /// - [`Error::CapacityExhausted`] - every cached page is dirty
    /// - [`Error::PageNotFound`] / [`Error::UnknownTable`] - bad identity
    /// - [`Error::Io`] - the heap file could not be read
    pub fn get_page(&self, tx: TransactionId, pid: PageId, mode: LockMode) -> Result<PageRef> {
        let timeout = Duration::from_millis(
            LOCK_TIMEOUT_BASE_MS + rand::rng().random_range(0..LOCK_TIMEOUT_JITTER_MS),
        );
        if !self.lock_manager.acquire_timeout(pid, tx, mode, timeout) {
            PoolStats::bump(&self.stats.lock_timeouts);
            return Err(Error::Aborted(tx));
        }

        let mut cache = self.cache.lock();
        if let Some(page) = cache.get(&pid) {
            PoolStats::bump(&self.stats.cache_hits);
            return Ok(Arc::clone(page));
        }
        PoolStats::bump(&self.stats.cache_misses);

        let file = self.catalog.file(pid.table)?;
        let page: PageRef = Arc::new(RwLock::new(file.read_page(pid.page_no)?));

        // Make room before inserting so a failed eviction leaves the cache
        // exactly as it was, without the new page.
        if cache.len() >= self.capacity {
            self.evict(&mut cache)?;
        }
        cache.put(pid, Arc::clone(&page));
        Ok(page)
    }

    /// Whether `tx` currently holds a lock on `pid`.
    pub fn holds_lock(&self, tx: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holding(pid, tx).is_some()
    }

    /// Release `tx`'s lock on a single page before transaction end.
    ///
    /// Calling this is risky: it breaks strict two-phase locking, so the
    /// caller must know the page cannot be involved in the transaction's
    /// serializability (e.g. read-only lookahead that decided against the
    /// page). Prefer letting commit/abort release everything.
    pub fn release_page(&self, tx: TransactionId, pid: PageId) {
        self.lock_manager.release(pid, tx);
    }

    // ========================================================================
    // Public API: mutation
    // ========================================================================

    /// Insert a tuple into `table_id` on behalf of `tx`.
    ///
    /// Delegates to the table's heap file (which re-enters `get_page` with
    /// an exclusive lock for each page it probes), then marks every page
    /// the file reports as touched dirty-owned-by-`tx`, refreshes it in
    /// the cache, and runs the eviction step.
    pub fn insert_tuple(&self, tx: TransactionId, table_id: u32, tuple: Tuple) -> Result<()> {
        let file = self.catalog.file(table_id)?;
        let touched = file.insert_tuple(tx, tuple, self)?;
        self.mark_touched(tx, &touched)
    }

    /// Delete a tuple (located via its stored record id) on behalf of `tx`.
    pub fn delete_tuple(&self, tx: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple.record_id().ok_or_else(|| {
            Error::InvariantViolation("deleting a tuple with no stored location".into())
        })?;
        let file = self.catalog.file(rid.page.table)?;
        let touched = file.delete_tuple(tx, tuple, self)?;
        self.mark_touched(tx, &touched)
    }

    // ========================================================================
    // Public API: transaction completion
    // ========================================================================

    /// Commit `tx`: flush every page it dirtied, then release its locks.
    ///
    /// Each flush logs the page's before- and after-image and forces the
    /// log ahead of the page write. If any flush fails mid-commit the
    /// transaction's outcome is undefined; the error is fatal and must not
    /// be treated as a successful commit.
    pub fn commit(&self, tx: TransactionId) -> Result<()> {
        for (pid, page) in self.cache_snapshot() {
            // Peek cheaply; only our own dirty pages need the write lock,
            // and nobody else can clean or re-dirty them while we hold
            // their exclusive page lock.
            if page.read().dirtier() != Some(tx) {
                continue;
            }
            let mut guard = page.write();
            self.flush_page_locked(pid, &mut guard)?;
        }
        self.lock_manager.release_all(tx);
        PoolStats::bump(&self.stats.commits);
        Ok(())
    }

    /// Abort `tx`: discard every page it dirtied, then release its locks.
    ///
    /// Nothing is written. Under no-steal the medium never saw the
    /// transaction's mutations, so dropping the in-memory copies is a
    /// complete rollback; the next `get_page` re-reads the pre-transaction
    /// bytes from disk.
    pub fn abort(&self, tx: TransactionId) {
        for (pid, page) in self.cache_snapshot() {
            let is_mine = page.read().dirtier() == Some(tx);
            if is_mine {
                self.cache.lock().remove(&pid);
            }
        }
        self.lock_manager.release_all(tx);
        PoolStats::bump(&self.stats.aborts);
    }

    // ========================================================================
    // Public API: administrative
    // ========================================================================

    /// Flush every dirty page regardless of owner.
    ///
    /// Administrative only: writing another transaction's uncommitted
    /// mutations breaks the no-steal recovery contract, so this must not
    /// run while transactions are active.
    pub fn flush_all(&self) -> Result<()> {
        for (pid, page) in self.cache_snapshot() {
            let mut guard = page.write();
            self.flush_page_locked(pid, &mut guard)?;
        }
        Ok(())
    }

    /// Drop one page from the cache without flushing it, outside the
    /// normal transaction lifecycle (e.g. a recovery manager purging a
    /// rolled-back page).
    pub fn discard_page(&self, pid: PageId) {
        self.cache.lock().remove(&pid);
    }

    // ========================================================================
    // Public API: introspection
    // ========================================================================

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.cache.lock().len()
    }

    /// Whether `pid` is currently cached. Does not affect recency.
    pub fn contains_page(&self, pid: PageId) -> bool {
        self.cache.lock().contains(&pid)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Dirty-mark and cache-refresh the pages a heap file reported as
    /// mutated, running the eviction step once per page.
    fn mark_touched(&self, tx: TransactionId, touched: &[PageId]) -> Result<()> {
        for &pid in touched {
            let page = self
                .cache
                .lock()
                .get(&pid)
                .cloned()
                .ok_or_else(|| {
                    Error::InvariantViolation(format!("mutated {} vanished from the cache", pid))
                })?;

            // Guard dropped before re-taking the cache mutex below.
            page.write().mark_dirty(tx);

            let mut cache = self.cache.lock();
            cache.put(pid, page);
            if cache.len() >= self.capacity {
                self.evict(&mut cache)?;
            }
        }
        Ok(())
    }

    /// The eviction step: try up to `capacity` times to pop the LRU entry.
    /// A clean victim is dropped and we are done; a dirty one is put back
    /// (becoming most-recently-used, hence unevictable for a while). If
    /// every attempt surfaced a dirty page the pool is full of uncommitted
    /// mutations and cannot make room.
    fn evict(&self, cache: &mut EvictionCache<PageId, PageRef>) -> Result<()> {
        for _ in 0..self.capacity {
            let Some((pid, page)) = cache.evict_oldest() else {
                // Dropped below capacity: nothing left to do.
                return Ok(());
            };
            let clean = match page.try_read() {
                Some(guard) => guard.dirtier().is_none(),
                // Exclusively checked out right now: a mutation is in
                // flight, treat it like a dirty page.
                None => false,
            };
            if clean {
                PoolStats::bump(&self.stats.evictions);
                return Ok(());
            }
            cache.put(pid, page);
        }
        Err(Error::CapacityExhausted)
    }

    /// Flush one page whose write lock the caller already holds. A clean
    /// page is a no-op. For a dirty page: log (before, after), force the
    /// log, write the page, clear the dirty marker, and re-snapshot the
    /// before-image at the new clean point.
    fn flush_page_locked(&self, pid: PageId, page: &mut HeapPage) -> Result<()> {
        let Some(owner) = page.dirtier() else {
            return Ok(());
        };

        let after = page.to_bytes();
        self.wal.log_update(owner, pid, page.before_image(), &after)?;
        self.wal.force()?;
        self.catalog.file(pid.table)?.write_page_bytes(pid.page_no, &after)?;

        page.mark_clean();
        page.set_before_image();
        PoolStats::bump(&self.stats.pages_flushed);
        Ok(())
    }

    fn cache_snapshot(&self) -> Vec<(PageId, PageRef)> {
        self.cache.lock().entries()
    }
}
