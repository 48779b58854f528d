//! Aggregation: COUNT/SUM/AVG/MIN/MAX over a single column, optionally
//! grouped by another column.
//!
//! Aggregates over int columns support every operator; text columns
//! support COUNT only. Results are computed in one pass over the child
//! when the operator is opened, then replayed tuple by tuple.

use std::collections::HashMap;

use crate::common::{Error, Result};
use crate::exec::OpIterator;
use crate::storage::tuple::{Field, FieldType, Schema, Tuple};

/// The aggregate function to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Running state for one group of an int aggregate.
#[derive(Debug, Clone)]
struct IntAggState {
    count: i32,
    sum: i32,
    min: i32,
    max: i32,
}

impl IntAggState {
    fn new() -> Self {
        IntAggState {
            count: 0,
            sum: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn add(&mut self, v: i32) {
        self.count += 1;
        self.sum = self.sum.wrapping_add(v);
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn result(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Count => self.count,
            AggregateOp::Sum => self.sum,
            AggregateOp::Avg => self.sum / self.count,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
        }
    }
}

/// Computes an aggregate over an int column.
///
/// The group key is the full group-by field value; `None` keys the single
/// group of an ungrouped aggregate.
pub struct IntAggregator {
    group_by: Option<usize>,
    field: usize,
    op: AggregateOp,
    groups: HashMap<Option<Field>, IntAggState>,
}

impl IntAggregator {
    pub fn new(group_by: Option<usize>, field: usize, op: AggregateOp) -> Self {
        IntAggregator {
            group_by,
            field,
            op,
            groups: HashMap::new(),
        }
    }

    /// Fold one tuple into its group.
    pub fn merge(&mut self, tuple: &Tuple) -> Result<()> {
        let Field::Int(v) = tuple.field(self.field) else {
            return Err(Error::InvariantViolation(
                "int aggregate over a non-int field".into(),
            ));
        };
        let key = self.group_by.map(|g| tuple.field(g).clone());
        self.groups.entry(key).or_insert_with(IntAggState::new).add(*v);
        Ok(())
    }

    /// One result tuple per group: `(group, value)` when grouping,
    /// a single `(value)` otherwise.
    pub fn results(&self) -> Vec<Tuple> {
        let mut out: Vec<Tuple> = self
            .groups
            .iter()
            .map(|(key, state)| {
                let value = Field::Int(state.result(self.op));
                match key {
                    Some(group) => Tuple::new(vec![group.clone(), value]),
                    None => Tuple::new(vec![value]),
                }
            })
            .collect();
        // Empty ungrouped COUNT is still a row.
        if out.is_empty() && self.group_by.is_none() && self.op == AggregateOp::Count {
            out.push(Tuple::new(vec![Field::Int(0)]));
        }
        out
    }
}

/// Computes COUNT over a text column; no other operator is defined for
/// text.
pub struct TextAggregator {
    group_by: Option<usize>,
    counts: HashMap<Option<Field>, i32>,
}

impl TextAggregator {
    /// # Errors
    /// `Error::InvariantViolation` for any operator but COUNT.
    pub fn new(group_by: Option<usize>, op: AggregateOp) -> Result<Self> {
        if op != AggregateOp::Count {
            return Err(Error::InvariantViolation(
                "text columns support only COUNT".into(),
            ));
        }
        Ok(TextAggregator {
            group_by,
            counts: HashMap::new(),
        })
    }

    pub fn merge(&mut self, tuple: &Tuple) {
        let key = self.group_by.map(|g| tuple.field(g).clone());
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn results(&self) -> Vec<Tuple> {
        let mut out: Vec<Tuple> = self
            .counts
            .iter()
            .map(|(key, count)| match key {
                Some(group) => Tuple::new(vec![group.clone(), Field::Int(*count)]),
                None => Tuple::new(vec![Field::Int(*count)]),
            })
            .collect();
        if out.is_empty() && self.group_by.is_none() {
            out.push(Tuple::new(vec![Field::Int(0)]));
        }
        out
    }
}

enum Aggregator {
    Int(IntAggregator),
    Text(TextAggregator),
}

/// The aggregation operator: drains its child at open, replays results.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    field: usize,
    group_by: Option<usize>,
    op: AggregateOp,
    out_schema: Schema,
    results: Vec<Tuple>,
    pos: usize,
}

impl Aggregate {
    /// Aggregate `op` over column `field` of the child, grouped by
    /// `group_by` when given.
    pub fn new(
        child: Box<dyn OpIterator>,
        field: usize,
        group_by: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let in_schema = child.schema();
        if matches!(in_schema.field_type(field), FieldType::Text) && op != AggregateOp::Count {
            return Err(Error::InvariantViolation(
                "text columns support only COUNT".into(),
            ));
        }
        let out_schema = match group_by {
            Some(g) => Schema::new(vec![in_schema.field_type(g), FieldType::Int]),
            None => Schema::new(vec![FieldType::Int]),
        };
        Ok(Aggregate {
            child,
            field,
            group_by,
            op,
            out_schema,
            results: Vec::new(),
            pos: 0,
        })
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;

        let mut agg = match self.child.schema().field_type(self.field) {
            FieldType::Int => Aggregator::Int(IntAggregator::new(self.group_by, self.field, self.op)),
            FieldType::Text => Aggregator::Text(TextAggregator::new(self.group_by, self.op)?),
        };
        while let Some(tuple) = self.child.next()? {
            match &mut agg {
                Aggregator::Int(a) => a.merge(&tuple)?,
                Aggregator::Text(a) => a.merge(&tuple),
            }
        }
        self.results = match &agg {
            Aggregator::Int(a) => a.results(),
            Aggregator::Text(a) => a.results(),
        };
        self.pos = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        let row = self.results.get(self.pos).cloned();
        self.pos += 1;
        Ok(row)
    }

    fn rewind(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.results.clear();
        self.pos = 0;
    }

    fn schema(&self) -> &Schema {
        &self.out_schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TransactionId;
    use crate::exec::test_support::{insert_pairs, table_pool};
    use crate::exec::SeqScan;
    use std::sync::Arc;

    fn int_tuple(v: i32) -> Tuple {
        Tuple::new(vec![Field::Int(v)])
    }

    #[test]
    fn test_int_aggregator_ungrouped() {
        let mut agg = IntAggregator::new(None, 0, AggregateOp::Sum);
        for v in [1, 2, 3, 4] {
            agg.merge(&int_tuple(v)).unwrap();
        }
        let results = agg.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field(0), &Field::Int(10));
    }

    #[test]
    fn test_int_aggregator_all_ops() {
        let values = [3, -1, 7, 7];
        let expectations = [
            (AggregateOp::Count, 4),
            (AggregateOp::Sum, 16),
            (AggregateOp::Avg, 4),
            (AggregateOp::Min, -1),
            (AggregateOp::Max, 7),
        ];
        for (op, expected) in expectations {
            let mut agg = IntAggregator::new(None, 0, op);
            for v in values {
                agg.merge(&int_tuple(v)).unwrap();
            }
            assert_eq!(
                agg.results()[0].field(0),
                &Field::Int(expected),
                "{:?}",
                op
            );
        }
    }

    #[test]
    fn test_int_aggregator_grouped() {
        // (group, value) rows.
        let rows = [(1, 10), (2, 20), (1, 30), (2, 40), (2, 60)];
        let mut agg = IntAggregator::new(Some(0), 1, AggregateOp::Avg);
        for (g, v) in rows {
            agg.merge(&Tuple::new(vec![Field::Int(g), Field::Int(v)])).unwrap();
        }

        let mut results: Vec<(i32, i32)> = agg
            .results()
            .iter()
            .map(|t| match (t.field(0), t.field(1)) {
                (Field::Int(g), Field::Int(v)) => (*g, *v),
                other => panic!("unexpected row {:?}", other),
            })
            .collect();
        results.sort_unstable();
        assert_eq!(results, vec![(1, 20), (2, 40)]);
    }

    #[test]
    fn test_empty_ungrouped_count_is_zero() {
        let agg = IntAggregator::new(None, 0, AggregateOp::Count);
        let results = agg.results();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].field(0), &Field::Int(0));

        // Other ops produce no rows on empty input.
        let agg = IntAggregator::new(None, 0, AggregateOp::Max);
        assert!(agg.results().is_empty());
    }

    #[test]
    fn test_text_aggregator_count_only() {
        assert!(TextAggregator::new(None, AggregateOp::Sum).is_err());

        let mut agg = TextAggregator::new(Some(0), AggregateOp::Count).unwrap();
        for name in ["a", "b", "a"] {
            agg.merge(&Tuple::new(vec![Field::Text(name.into())]));
        }
        let mut results: Vec<(String, i32)> = agg
            .results()
            .iter()
            .map(|t| match (t.field(0), t.field(1)) {
                (Field::Text(s), Field::Int(c)) => (s.clone(), *c),
                other => panic!("unexpected row {:?}", other),
            })
            .collect();
        results.sort();
        assert_eq!(results, vec![("a".into(), 2), ("b".into(), 1)]);
    }

    #[test]
    fn test_aggregate_operator_over_scan() {
        let (pool, _dir) = table_pool(Schema::new(vec![FieldType::Int, FieldType::Int]));
        insert_pairs(&pool, &[(1, 5), (1, 15), (2, 100)]);

        // SELECT group, SUM(value) FROM t GROUP BY group
        let tx = TransactionId::fresh();
        let scan = SeqScan::new(Arc::clone(&pool), tx, 1).unwrap();
        let mut agg = Aggregate::new(Box::new(scan), 1, Some(0), AggregateOp::Sum).unwrap();

        agg.open().unwrap();
        let mut rows = vec![];
        while let Some(t) = agg.next().unwrap() {
            match (t.field(0), t.field(1)) {
                (Field::Int(g), Field::Int(s)) => rows.push((*g, *s)),
                other => panic!("unexpected row {:?}", other),
            }
        }
        rows.sort_unstable();
        assert_eq!(rows, vec![(1, 20), (2, 100)]);

        agg.rewind().unwrap();
        assert!(agg.next().unwrap().is_some());
        agg.close();
        pool.commit(tx).unwrap();
    }

    #[test]
    fn test_aggregate_schema() {
        let (pool, _dir) = table_pool(Schema::new(vec![FieldType::Int, FieldType::Int]));
        let tx = TransactionId::fresh();
        let scan = SeqScan::new(Arc::clone(&pool), tx, 1).unwrap();

        let agg = Aggregate::new(Box::new(scan), 1, Some(0), AggregateOp::Max).unwrap();
        assert_eq!(agg.schema().len(), 2);

        let scan = SeqScan::new(Arc::clone(&pool), tx, 1).unwrap();
        let agg = Aggregate::new(Box::new(scan), 0, None, AggregateOp::Count).unwrap();
        assert_eq!(agg.schema().len(), 1);
    }
}
