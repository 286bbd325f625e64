use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::storage::table::tuple::Tuple;
use crate::types::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticType {
    Plus,
    Minus,
}

/// Binary integer arithmetic; NULL operands propagate NULL.
#[derive(Debug, Clone)]
pub struct ArithmeticExpression {
    arithmetic_type: ArithmeticType,
    left: ExpressionRef,
    right: ExpressionRef,
}

impl ArithmeticExpression {
    pub fn new(arithmetic_type: ArithmeticType, left: ExpressionRef, right: ExpressionRef) -> Self {
        Self {
            arithmetic_type,
            left,
            right,
        }
    }

    fn apply(&self, lhs: &Value, rhs: &Value) -> Value {
        match self.arithmetic_type {
            ArithmeticType::Plus => lhs.add(rhs),
            ArithmeticType::Minus => lhs.subtract(rhs),
        }
    }

    pub fn evaluate(&self, tuple: &Tuple, schema: &Schema) -> Value {
        let lhs = self.left.evaluate(tuple, schema);
        let rhs = self.right.evaluate(tuple, schema);
        self.apply(&lhs, &rhs)
    }

    pub fn evaluate_join(
        &self,
        left: &Tuple,
        left_schema: &Schema,
        right: &Tuple,
        right_schema: &Schema,
    ) -> Value {
        let lhs = self.left.evaluate_join(left, left_schema, right, right_schema);
        let rhs = self.right.evaluate_join(left, left_schema, right, right_schema);
        self.apply(&lhs, &rhs)
    }
}
