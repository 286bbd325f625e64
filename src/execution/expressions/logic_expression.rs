use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::storage::table::tuple::Tuple;
use crate::types::type_id::TypeId;
use crate::types::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicType {
    And,
    Or,
}

/// Kleene three-valued AND / OR.
#[derive(Debug, Clone)]
pub struct LogicExpression {
    logic_type: LogicType,
    left: ExpressionRef,
    right: ExpressionRef,
}

impl LogicExpression {
    pub fn new(logic_type: LogicType, left: ExpressionRef, right: ExpressionRef) -> Self {
        Self {
            logic_type,
            left,
            right,
        }
    }

    pub fn get_logic_type(&self) -> LogicType {
        self.logic_type
    }

    pub fn get_left(&self) -> &ExpressionRef {
        &self.left
    }

    pub fn get_right(&self) -> &ExpressionRef {
        &self.right
    }

    fn combine(&self, lhs: &Value, rhs: &Value) -> Value {
        let l = if lhs.is_null() { None } else { Some(lhs.as_bool()) };
        let r = if rhs.is_null() { None } else { Some(rhs.as_bool()) };
        let result = match self.logic_type {
            LogicType::And => match (l, r) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            LogicType::Or => match (l, r) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };
        match result {
            Some(b) => Value::new(b),
            None => Value::null(TypeId::Boolean),
        }
    }

    pub fn evaluate(&self, tuple: &Tuple, schema: &Schema) -> Value {
        let lhs = self.left.evaluate(tuple, schema);
        let rhs = self.right.evaluate(tuple, schema);
        self.combine(&lhs, &rhs)
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
        self.combine(&lhs, &rhs)
    }
}
