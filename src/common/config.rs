//! Configuration constants for galena.

/// Default size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems. Every page of a table file is
/// exactly this many bytes; page `n` lives at byte offset `n * page_size`.
///
/// Heap files may be constructed with a different page size for test
/// harnesses (see `HeapFile::with_page_size`); the value is fixed per file
/// at construction and never changed afterwards.
pub const PAGE_SIZE: usize = 4096;

/// Default number of pages a buffer pool caches.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Base lock-acquisition timeout in milliseconds.
///
/// Lock waits are bounded; a transaction that cannot acquire a page lock
/// within the bound must abort. This is the system's only deadlock-avoidance
/// mechanism — there is no cycle detection.
pub const LOCK_TIMEOUT_BASE_MS: u64 = 1000;

/// Per-call random jitter added to the base timeout, in milliseconds.
///
/// Randomizing the bound keeps two mutually blocked transactions from
/// timing out and retrying in lockstep.
pub const LOCK_TIMEOUT_JITTER_MS: u64 = 1500;

/// Number of content bytes a fixed-length text field occupies on a page,
/// excluding its 4-byte length prefix.
pub const TEXT_LEN: usize = 128;
