//! The delete operator.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Result, TransactionId};
use crate::exec::OpIterator;
use crate::storage::tuple::{Field, FieldType, Schema, Tuple};

/// Deletes every tuple read from its child (located by record id) through
/// the buffer pool.
///
/// Produces a single one-column tuple holding the number of rows deleted,
/// then nothing on later calls.
pub struct Delete {
    pool: Arc<BufferPool>,
    tx: TransactionId,
    child: Box<dyn OpIterator>,
    schema: Schema,
    done: bool,
}

impl Delete {
    pub fn new(pool: Arc<BufferPool>, tx: TransactionId, child: Box<dyn OpIterator>) -> Self {
        Delete {
            pool,
            tx,
            child,
            schema: Schema::new(vec![FieldType::Int]),
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> Result<()> {
        self.done = false;
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            self.pool.delete_tuple(self.tx, &tuple)?;
            count += 1;
        }
        self.done = true;
        Ok(Some(Tuple::new(vec![Field::Int(count)])))
    }

    fn rewind(&mut self) -> Result<()> {
        self.done = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
