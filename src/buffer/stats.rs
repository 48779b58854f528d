//! Buffer pool statistics tracking.
//!
//! All counters are atomic so transaction threads update them without
//! locks; `Ordering::Relaxed` is enough since the counters are independent
//! and only ever read as approximate telemetry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by the buffer pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Page requests served from the cache.
    pub cache_hits: AtomicU64,
    /// Page requests that had to read the heap file.
    pub cache_misses: AtomicU64,
    /// Clean pages dropped to make room.
    pub evictions: AtomicU64,
    /// Dirty pages written out (commit or administrative flush).
    pub pages_flushed: AtomicU64,
    /// Lock waits that expired and aborted their transaction.
    pub lock_timeouts: AtomicU64,
    /// Transactions committed through the pool.
    pub commits: AtomicU64,
    /// Transactions aborted through the pool.
    pub aborts: AtomicU64,
}

impl PoolStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_flushed: self.pages_flushed.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
        }
    }
}

/// Non-atomic snapshot, safe to print and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pages_flushed: u64,
    pub lock_timeouts: u64,
    pub commits: u64,
    pub aborts: u64,
}

impl StatsSnapshot {
    /// Fraction of page requests served from the cache (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool {{ hits: {}, misses: {}, evictions: {}, flushed: {}, timeouts: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_flushed,
            self.lock_timeouts,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_and_hit_rate() {
        let stats = PoolStats::new();
        stats.cache_hits.fetch_add(7, Ordering::Relaxed);
        stats.cache_misses.fetch_add(3, Ordering::Relaxed);

        let snap = stats.snapshot();
        assert_eq!(snap.cache_hits, 7);
        assert_eq!(snap.cache_misses, 3);
        assert_eq!(snap.hit_rate(), 0.7);
    }

    #[test]
    fn test_empty_hit_rate_is_zero() {
        assert_eq!(PoolStats::new().snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn test_display() {
        let stats = PoolStats::new();
        stats.cache_hits.fetch_add(80, Ordering::Relaxed);
        stats.cache_misses.fetch_add(20, Ordering::Relaxed);

        let shown = format!("{}", stats.snapshot());
        assert!(shown.contains("hits: 80"));
        assert!(shown.contains("80.00%"));
    }
}
