//! Relational select: a predicate and the operator that applies it.

use crate::common::Result;
use crate::exec::OpIterator;
use crate::storage::tuple::{Field, Schema, Tuple};

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    /// Substring match on text; on ints it degenerates to equality.
    Like,
}

/// `tuple[field] op operand`, evaluated per tuple.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: usize,
    pub op: CmpOp,
    pub operand: Field,
}

impl Predicate {
    pub fn new(field: usize, op: CmpOp, operand: Field) -> Self {
        Predicate { field, op, operand }
    }

    /// Whether `tuple` satisfies this predicate. A type mismatch between
    /// the field and the operand never matches.
    pub fn eval(&self, tuple: &Tuple) -> bool {
        match (tuple.field(self.field), &self.operand) {
            (Field::Int(lhs), Field::Int(rhs)) => match self.op {
                CmpOp::Equals | CmpOp::Like => lhs == rhs,
                CmpOp::NotEquals => lhs != rhs,
                CmpOp::LessThan => lhs < rhs,
                CmpOp::LessThanOrEq => lhs <= rhs,
                CmpOp::GreaterThan => lhs > rhs,
                CmpOp::GreaterThanOrEq => lhs >= rhs,
            },
            (Field::Text(lhs), Field::Text(rhs)) => match self.op {
                CmpOp::Equals => lhs == rhs,
                CmpOp::NotEquals => lhs != rhs,
                CmpOp::LessThan => lhs < rhs,
                CmpOp::LessThanOrEq => lhs <= rhs,
                CmpOp::GreaterThan => lhs > rhs,
                CmpOp::GreaterThanOrEq => lhs >= rhs,
                CmpOp::Like => lhs.contains(rhs.as_str()),
            },
            _ => false,
        }
    }
}

/// Passes through only the child tuples satisfying the predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    schema: Schema,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        let schema = child.schema().clone();
        Filter {
            predicate,
            child,
            schema,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            if self.predicate.eval(&tuple) {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
