use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::execution::expressions::arithmetic_expression::ArithmeticExpression;
use crate::execution::expressions::column_value_expression::ColumnValueExpression;
use crate::execution::expressions::comparison_expression::ComparisonExpression;
use crate::execution::expressions::constant_value_expression::ConstantValueExpression;
use crate::execution::expressions::logic_expression::LogicExpression;
use crate::storage::table::tuple::Tuple;
use crate::types::value::Value;

pub type ExpressionRef = Arc<Expression>;

/// Closed set of expression kinds the planner produces.
#[derive(Debug, Clone)]
pub enum Expression {
    ColumnValue(ColumnValueExpression),
    Constant(ConstantValueExpression),
    Comparison(ComparisonExpression),
    Logic(LogicExpression),
    Arithmetic(ArithmeticExpression),
}

impl Expression {
    /// Evaluates against a single tuple.
    pub fn evaluate(&self, tuple: &Tuple, schema: &Schema) -> Value {
        match self {
            Expression::ColumnValue(e) => e.evaluate(tuple, schema),
            Expression::Constant(e) => e.evaluate(),
            Expression::Comparison(e) => e.evaluate(tuple, schema),
            Expression::Logic(e) => e.evaluate(tuple, schema),
            Expression::Arithmetic(e) => e.evaluate(tuple, schema),
        }
    }

    /// Evaluates as a join predicate over a pair of tuples; column
    /// references resolve through their tuple index (0 = left, 1 = right).
    pub fn evaluate_join(
        &self,
        left: &Tuple,
        left_schema: &Schema,
        right: &Tuple,
        right_schema: &Schema,
    ) -> Value {
        match self {
            Expression::ColumnValue(e) => e.evaluate_join(left, left_schema, right, right_schema),
            Expression::Constant(e) => e.evaluate(),
            Expression::Comparison(e) => e.evaluate_join(left, left_schema, right, right_schema),
            Expression::Logic(e) => e.evaluate_join(left, left_schema, right, right_schema),
            Expression::Arithmetic(e) => e.evaluate_join(left, left_schema, right, right_schema),
        }
    }
}
