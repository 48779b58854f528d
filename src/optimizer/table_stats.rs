//! Per-table statistics for cost-based planning.
//!
//! `TableStats` scans a table once through the buffer pool, builds one
//! histogram per column over the observed value range, and answers the
//! three questions a planner asks: what does a scan cost, how many rows
//! survive a predicate, and how selective is `column op constant`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::BufferPool;
use crate::common::{Result, TransactionId};
use crate::exec::CmpOp;
use crate::optimizer::histogram::{IntHistogram, TextHistogram};
use crate::storage::tuple::{Field, FieldType, Schema};
use crate::storage::HeapFileIterator;

/// Buckets per histogram.
pub const NUM_HIST_BUCKETS: usize = 100;

/// Statistics over one table's columns.
pub struct TableStats {
    io_cost_per_page: u64,
    pages: u32,
    total_tuples: u64,
    schema: Schema,
    int_histograms: HashMap<usize, IntHistogram>,
    text_histograms: HashMap<usize, TextHistogram>,
}

impl TableStats {
    /// Build statistics for `table_id` with one full scan.
    ///
    /// The scan runs in its own fresh transaction which is completed (and
    /// its shared locks released) before this returns.
    pub fn build(pool: &Arc<BufferPool>, table_id: u32, io_cost_per_page: u64) -> Result<Self> {
        let file = pool.catalog().file(table_id)?;
        let schema = file.schema().clone();
        let pages = file.page_count()?;

        // First pass gathers values; histograms need the observed min/max
        // before any value can be added.
        let mut int_values: HashMap<usize, Vec<i32>> = HashMap::new();
        let mut text_values: HashMap<usize, Vec<String>> = HashMap::new();
        let mut total_tuples = 0u64;

        let tx = TransactionId::fresh();
        let mut iter = HeapFileIterator::new(Arc::clone(pool), tx, table_id)?;
        while let Some(tuple) = iter.next()? {
            total_tuples += 1;
            for i in 0..schema.len() {
                match tuple.field(i) {
                    Field::Int(v) => int_values.entry(i).or_default().push(*v),
                    Field::Text(s) => text_values.entry(i).or_default().push(s.clone()),
                }
            }
        }
        pool.commit(tx)?;

        let mut int_histograms = HashMap::new();
        for (col, values) in int_values {
            let min = values.iter().copied().min().unwrap_or(0);
            let max = values.iter().copied().max().unwrap_or(0);
            let mut hist = IntHistogram::new(NUM_HIST_BUCKETS, min, max);
            for v in values {
                hist.add_value(v);
            }
            int_histograms.insert(col, hist);
        }

        let mut text_histograms = HashMap::new();
        for (col, values) in text_values {
            let mut hist = TextHistogram::new(NUM_HIST_BUCKETS);
            for s in &values {
                hist.add_value(s);
            }
            text_histograms.insert(col, hist);
        }

        Ok(TableStats {
            io_cost_per_page,
            pages,
            total_tuples,
            schema,
            int_histograms,
            text_histograms,
        })
    }

    /// Cost of sequentially scanning the whole table, assuming nothing is
    /// cached and partial pages cost as much as full ones.
    pub fn estimate_scan_cost(&self) -> f64 {
        self.pages as f64 * self.io_cost_per_page as f64
    }

    /// Rows surviving a predicate of the given selectivity.
    pub fn estimate_table_cardinality(&self, selectivity: f64) -> u64 {
        (self.total_tuples as f64 * selectivity) as u64
    }

    /// Selectivity of `column op constant` against the column's histogram.
    ///
    /// A constant of the wrong type selects nothing.
    pub fn estimate_selectivity(&self, field: usize, op: CmpOp, constant: &Field) -> f64 {
        match (self.schema.field_type(field), constant) {
            (FieldType::Int, Field::Int(v)) => self
                .int_histograms
                .get(&field)
                .map(|h| h.estimate_selectivity(op, *v))
                .unwrap_or(0.0),
            (FieldType::Text, Field::Text(s)) => self
                .text_histograms
                .get(&field)
                .map(|h| h.estimate_selectivity(op, s))
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Total rows in the table at scan time.
    pub fn total_tuples(&self) -> u64 {
        self.total_tuples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::test_support::{insert_ints, int_table_pool};

    #[test]
    fn test_counts_and_scan_cost() {
        let (pool, _dir) = int_table_pool();
        // 40 tuples over 15-slot pages -> 3 pages.
        let values: Vec<i32> = (0..40).collect();
        insert_ints(&pool, &values);

        let stats = TableStats::build(&pool, 1, 1000).unwrap();
        assert_eq!(stats.total_tuples(), 40);
        assert_eq!(stats.estimate_scan_cost(), 3.0 * 1000.0);
    }

    #[test]
    fn test_cardinality_estimate() {
        let (pool, _dir) = int_table_pool();
        insert_ints(&pool, &(0..30).collect::<Vec<i32>>());

        let stats = TableStats::build(&pool, 1, 1000).unwrap();
        assert_eq!(stats.estimate_table_cardinality(0.5), 15);
        assert_eq!(stats.estimate_table_cardinality(0.0), 0);
        assert_eq!(stats.estimate_table_cardinality(1.0), 30);
    }

    #[test]
    fn test_selectivity_from_scan() {
        let (pool, _dir) = int_table_pool();
        insert_ints(&pool, &(0..100).collect::<Vec<i32>>());

        let stats = TableStats::build(&pool, 1, 1000).unwrap();
        let sel = stats.estimate_selectivity(0, CmpOp::GreaterThan, &Field::Int(49));
        assert!((sel - 0.5).abs() < 0.1, "sel = {}", sel);

        // Wrong-typed constant selects nothing.
        assert_eq!(
            stats.estimate_selectivity(0, CmpOp::Equals, &Field::Text("49".into())),
            0.0
        );
    }

    #[test]
    fn test_stats_scan_releases_its_locks() {
        let (pool, _dir) = int_table_pool();
        insert_ints(&pool, &[1, 2, 3]);

        let _stats = TableStats::build(&pool, 1, 1000).unwrap();
        // The stats transaction is gone; a writer gets the page at once.
        assert_eq!(pool.lock_manager().locked_page_count(), 0);
    }

    #[test]
    fn test_empty_table() {
        let (pool, _dir) = int_table_pool();
        let stats = TableStats::build(&pool, 1, 1000).unwrap();
        assert_eq!(stats.total_tuples(), 0);
        assert_eq!(stats.estimate_scan_cost(), 0.0);
        assert_eq!(
            stats.estimate_selectivity(0, CmpOp::Equals, &Field::Int(1)),
            0.0
        );
    }
}
