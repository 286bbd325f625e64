use crate::types::value::Value;

/// A literal value.
#[derive(Debug, Clone)]
pub struct ConstantValueExpression {
    value: Value,
}

impl ConstantValueExpression {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn get_value(&self) -> &Value {
        &self.value
    }

    pub fn evaluate(&self) -> Value {
        self.value.clone()
    }
}
