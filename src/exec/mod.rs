//! Relational operators over the buffer pool.
//!
//! Volcano-style iterators: each operator pulls tuples from its child via
//! [`OpIterator::next`]. All page access happens through the buffer pool,
//! so operators participate in page-level two-phase locking like any other
//! transaction code — a scan takes shared locks, [`Insert`]/[`Delete`]
//! take exclusive ones, and a lock timeout surfaces as `Error::Aborted`
//! from `next`.

mod aggregate;
mod delete;
mod filter;
mod insert;
mod scan;

pub use aggregate::{Aggregate, AggregateOp, IntAggregator, TextAggregator};
pub use delete::Delete;
pub use filter::{CmpOp, Filter, Predicate};
pub use insert::Insert;
pub use scan::SeqScan;

use crate::common::Result;
use crate::storage::tuple::{Schema, Tuple};

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for operator tests: a pool over a tiny-page table.

    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::buffer::BufferPool;
    use crate::common::TransactionId;
    use crate::recovery::WalManager;
    use crate::storage::tuple::{Field, FieldType, Schema, Tuple};
    use crate::storage::{Catalog, HeapFile};

    /// 64-byte pages keep multi-page behavior testable with few tuples.
    pub const TEST_PAGE_SIZE: usize = 64;

    /// A pool whose catalog holds one table (id 1) with the given schema.
    pub fn table_pool(schema: Schema) -> (Arc<BufferPool>, TempDir) {
        let dir = TempDir::new().unwrap();
        let catalog = Arc::new(Catalog::new());
        let file = Arc::new(
            HeapFile::with_page_size(dir.path().join("t.tbl"), 1, schema, TEST_PAGE_SIZE).unwrap(),
        );
        catalog.add_table("t", file);
        let wal = Arc::new(WalManager::open(dir.path().join("wal")).unwrap());
        (Arc::new(BufferPool::new(8, catalog, wal)), dir)
    }

    /// A pool over a single-int-column table.
    pub fn int_table_pool() -> (Arc<BufferPool>, TempDir) {
        table_pool(Schema::new(vec![FieldType::Int]))
    }

    /// Insert and commit the given int values into table 1.
    pub fn insert_ints(pool: &Arc<BufferPool>, values: &[i32]) {
        let tx = TransactionId::fresh();
        for &v in values {
            pool.insert_tuple(tx, 1, Tuple::new(vec![Field::Int(v)])).unwrap();
        }
        pool.commit(tx).unwrap();
    }

    /// Insert and commit (a, b) int pairs into table 1 (two-int schema).
    pub fn insert_pairs(pool: &Arc<BufferPool>, rows: &[(i32, i32)]) {
        let tx = TransactionId::fresh();
        for &(a, b) in rows {
            pool.insert_tuple(tx, 1, Tuple::new(vec![Field::Int(a), Field::Int(b)]))
                .unwrap();
        }
        pool.commit(tx).unwrap();
    }
}

/// A pull-based relational operator.
pub trait OpIterator {
    /// Prepare the operator for iteration.
    fn open(&mut self) -> Result<()>;

    /// Produce the next tuple, or `None` when exhausted.
    fn next(&mut self) -> Result<Option<Tuple>>;

    /// Restart iteration from the beginning.
    fn rewind(&mut self) -> Result<()>;

    /// Release per-iteration state. Locks are *not* released here; they
    /// belong to the transaction and fall at commit/abort.
    fn close(&mut self);

    /// The layout of the tuples this operator produces.
    fn schema(&self) -> &Schema;
}
