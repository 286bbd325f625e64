use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::storage::table::tuple::Tuple;
use crate::types::type_id::TypeId;
use crate::types::value::{CmpBool, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonType {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

/// Binary comparison producing a three-valued boolean.
#[derive(Debug, Clone)]
pub struct ComparisonExpression {
    comp_type: ComparisonType,
    left: ExpressionRef,
    right: ExpressionRef,
}

impl ComparisonExpression {
    pub fn new(comp_type: ComparisonType, left: ExpressionRef, right: ExpressionRef) -> Self {
        Self {
            comp_type,
            left,
            right,
        }
    }

    pub fn get_comp_type(&self) -> ComparisonType {
        self.comp_type
    }

    pub fn get_left(&self) -> &ExpressionRef {
        &self.left
    }

    pub fn get_right(&self) -> &ExpressionRef {
        &self.right
    }

    fn to_value(cmp: CmpBool) -> Value {
        match cmp {
            CmpBool::CmpTrue => Value::new(true),
            CmpBool::CmpFalse => Value::new(false),
            CmpBool::CmpNull => Value::null(TypeId::Boolean),
        }
    }

    fn compare(&self, lhs: &Value, rhs: &Value) -> Value {
        let cmp = match self.comp_type {
            ComparisonType::Equal => lhs.compare_equals(rhs),
            ComparisonType::NotEqual => lhs.compare_not_equals(rhs),
            ComparisonType::LessThan => lhs.compare_less_than(rhs),
            ComparisonType::LessThanOrEqual => lhs.compare_less_than_equals(rhs),
            ComparisonType::GreaterThan => lhs.compare_greater_than(rhs),
            ComparisonType::GreaterThanOrEqual => lhs.compare_greater_than_equals(rhs),
        };
        Self::to_value(cmp)
    }

    pub fn evaluate(&self, tuple: &Tuple, schema: &Schema) -> Value {
        let lhs = self.left.evaluate(tuple, schema);
        let rhs = self.right.evaluate(tuple, schema);
        self.compare(&lhs, &rhs)
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
        self.compare(&lhs, &rhs)
    }
}
