//! Sequential scan over a table.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Error, Result, TransactionId};
use crate::exec::OpIterator;
use crate::storage::tuple::{Schema, Tuple};
use crate::storage::HeapFileIterator;

/// Full-table scan, page at a time, under shared locks.
pub struct SeqScan {
    pool: Arc<BufferPool>,
    tx: TransactionId,
    table_id: u32,
    schema: Schema,
    iter: Option<HeapFileIterator>,
}

impl SeqScan {
    pub fn new(pool: Arc<BufferPool>, tx: TransactionId, table_id: u32) -> Result<Self> {
        let schema = pool.catalog().schema(table_id)?;
        Ok(SeqScan {
            pool,
            tx,
            table_id,
            schema,
            iter: None,
        })
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.iter = Some(HeapFileIterator::new(
            Arc::clone(&self.pool),
            self.tx,
            self.table_id,
        )?);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        match self.iter.as_mut() {
            Some(iter) => iter.next(),
            None => Err(Error::InvariantViolation(
                "next() on a scan that is not open".into(),
            )),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        match self.iter.as_mut() {
            Some(iter) => iter.rewind(),
            None => Err(Error::InvariantViolation(
                "rewind() on a scan that is not open".into(),
            )),
        }
    }

    fn close(&mut self) {
        self.iter = None;
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
