use crate::catalog::schema::Schema;
use crate::storage::table::tuple::Tuple;
use crate::types::value::Value;

/// References a column of an input tuple. `tuple_idx` selects the side in a
/// join context (0 = left / outer, 1 = right / inner).
#[derive(Debug, Clone, Copy)]
pub struct ColumnValueExpression {
    tuple_idx: usize,
    col_idx: usize,
}

impl ColumnValueExpression {
    pub fn new(tuple_idx: usize, col_idx: usize) -> Self {
        Self { tuple_idx, col_idx }
    }

    pub fn get_tuple_idx(&self) -> usize {
        self.tuple_idx
    }

    pub fn get_col_idx(&self) -> usize {
        self.col_idx
    }

    pub fn evaluate(&self, tuple: &Tuple, _schema: &Schema) -> Value {
        tuple.get_value(self.col_idx).clone()
    }

    pub fn evaluate_join(
        &self,
        left: &Tuple,
        _left_schema: &Schema,
        right: &Tuple,
        _right_schema: &Schema,
    ) -> Value {
        if self.tuple_idx == 0 {
            left.get_value(self.col_idx).clone()
        } else {
            right.get_value(self.col_idx).clone()
        }
    }
}
