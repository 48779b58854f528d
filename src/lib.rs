//! galena - the storage engine of a single-node relational database.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           galena                              │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │          Query glue (exec/, optimizer/)               │   │
//! │  │   SeqScan · Filter · Insert · Delete · Aggregate      │   │
//! │  │        histograms + table statistics                  │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! │                            ↓                                  │
//! │  ┌───────────────────────────────────────────────────────┐   │
//! │  │            Buffer Pool (buffer/)                      │   │
//! │  │  ┌─────────────────┐   ┌───────────────────────────┐  │   │
//! │  │  │  LockManager    │   │  EvictionCache (LRU)      │  │   │
//! │  │  │ (concurrency/)  │   │  no-steal eviction        │  │   │
//! │  │  └─────────────────┘   └───────────────────────────┘  │   │
//! │  │      commit = flush-force · abort = discard           │   │
//! │  └───────────────────────────────────────────────────────┘   │
//! │                ↓                           ↓                  │
//! │  ┌──────────────────────────┐  ┌───────────────────────┐     │
//! │  │  Storage (storage/)      │  │  WAL sink (recovery/) │     │
//! │  │  HeapFile · HeapPage     │  │  (before, after) log  │     │
//! │  │  Catalog · tuples        │  │  forced before write  │     │
//! │  └──────────────────────────┘  └───────────────────────┘     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every page access goes through [`BufferPool::get_page`], which acquires
//! a page-level shared or exclusive lock (strict two-phase locking with a
//! bounded, jittered wait), serves the page from the LRU cache or loads it
//! from the table's heap file, and evicts a clean page when the pool is
//! full. Dirty pages are never stolen to disk: commit flushes them (with a
//! write-ahead log record forced first), abort simply discards them.
//!
//! # Modules
//! - [`common`] - shared primitives (PageId, TransactionId, Error, config)
//! - [`buffer`] - buffer pool, eviction cache, statistics
//! - [`concurrency`] - the page-level lock manager
//! - [`storage`] - heap files, slotted pages, tuples, catalog
//! - [`recovery`] - write-ahead log sink
//! - [`exec`] - relational operators over the pool
//! - [`optimizer`] - histograms and table statistics
//!
//! # Quick Start
//! ```no_run
//! use std::sync::Arc;
//! use galena::{BufferPool, Catalog, HeapFile, Schema, FieldType, Field, Tuple,
//!              TransactionId, WalManager};
//!
//! # fn main() -> galena::Result<()> {
//! let catalog = Arc::new(Catalog::new());
//! let file = HeapFile::open_or_create("users.tbl", 1,
//!     Schema::new(vec![FieldType::Int, FieldType::Text]))?;
//! catalog.add_table("users", Arc::new(file));
//!
//! let wal = Arc::new(WalManager::open("galena.wal")?);
//! let pool = Arc::new(BufferPool::new(50, catalog, wal));
//!
//! let tx = TransactionId::fresh();
//! pool.insert_tuple(tx, 1, Tuple::new(vec![
//!     Field::Int(1), Field::Text("ada".into()),
//! ]))?;
//! pool.commit(tx)?;
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod common;
pub mod concurrency;
pub mod exec;
pub mod optimizer;
pub mod recovery;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_POOL_PAGES, PAGE_SIZE};
pub use common::{Error, PageId, Result, TransactionId};

pub use buffer::{BufferPool, EvictionCache, PageRef, PoolStats, StatsSnapshot};
pub use concurrency::{LockManager, LockMode};
pub use recovery::WalManager;
pub use storage::{Catalog, Field, FieldType, HeapFile, HeapFileIterator, HeapPage, RecordId,
                  Schema, Tuple};
