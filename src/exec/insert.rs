//! The insert operator.

use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Error, Result, TransactionId};
use crate::exec::OpIterator;
use crate::storage::tuple::{Field, FieldType, Schema, Tuple};

/// Inserts every tuple read from its child into a table, routing each
/// through the buffer pool so locks and dirty tracking apply.
///
/// Produces a single one-column tuple holding the number of rows inserted,
/// then nothing on later calls.
pub struct Insert {
    pool: Arc<BufferPool>,
    tx: TransactionId,
    table_id: u32,
    child: Box<dyn OpIterator>,
    schema: Schema,
    done: bool,
}

impl Insert {
    /// # Errors
    /// `Error::SchemaMismatch` if the child's tuples do not fit the table.
    pub fn new(
        pool: Arc<BufferPool>,
        tx: TransactionId,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> Result<Self> {
        let table_schema = pool.catalog().schema(table_id)?;
        if !child.schema().same_types(&table_schema) {
            return Err(Error::SchemaMismatch);
        }
        Ok(Insert {
            pool,
            tx,
            table_id,
            child,
            schema: Schema::new(vec![FieldType::Int]),
            done: false,
        })
    }
}

impl OpIterator for Insert {
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
            self.pool.insert_tuple(self.tx, self.table_id, tuple)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::int_table_pool;
    use crate::exec::SeqScan;

    /// Feeds a fixed set of tuples; stands in for any child operator.
    pub(crate) struct Rows {
        schema: Schema,
        rows: Vec<Tuple>,
        pos: usize,
    }

    impl Rows {
        pub(crate) fn new(schema: Schema, rows: Vec<Tuple>) -> Self {
            Rows {
                schema,
                rows,
                pos: 0,
            }
        }
    }

    impl OpIterator for Rows {
        fn open(&mut self) -> Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn next(&mut self) -> Result<Option<Tuple>> {
            let row = self.rows.get(self.pos).cloned();
            self.pos += 1;
            Ok(row)
        }
        fn rewind(&mut self) -> Result<()> {
            self.pos = 0;
            Ok(())
        }
        fn close(&mut self) {}
        fn schema(&self) -> &Schema {
            &self.schema
        }
    }

    fn int_rows(values: &[i32]) -> Box<Rows> {
        Box::new(Rows::new(
            Schema::new(vec![FieldType::Int]),
            values.iter().map(|&v| Tuple::new(vec![Field::Int(v)])).collect(),
        ))
    }

    #[test]
    fn test_insert_reports_count_once() {
        let (pool, _dir) = int_table_pool();
        let tx = TransactionId::fresh();

        let mut insert =
            Insert::new(Arc::clone(&pool), tx, int_rows(&[7, 8, 9]), 1).unwrap();
        insert.open().unwrap();

        let report = insert.next().unwrap().unwrap();
        assert_eq!(report.field(0), &Field::Int(3));
        // Second call yields nothing.
        assert!(insert.next().unwrap().is_none());
        insert.close();
        pool.commit(tx).unwrap();

        // The rows are visible to a later scan.
        let tx2 = TransactionId::fresh();
        let mut scan = SeqScan::new(Arc::clone(&pool), tx2, 1).unwrap();
        scan.open().unwrap();
        let mut count = 0;
        while scan.next().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        pool.commit(tx2).unwrap();
    }

    #[test]
    fn test_insert_schema_mismatch_rejected() {
        let (pool, _dir) = int_table_pool();
        let tx = TransactionId::fresh();

        let child = Box::new(Rows::new(
            Schema::new(vec![FieldType::Text]),
            vec![],
        ));
        assert!(matches!(
            Insert::new(pool, tx, child, 1),
            Err(Error::SchemaMismatch)
        ));
    }
}
