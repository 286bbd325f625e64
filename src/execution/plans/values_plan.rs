use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Produces literal rows; the usual child of an insert plan.
#[derive(Debug, Clone)]
pub struct ValuesPlanNode {
    output_schema: Schema,
    values: Vec<Vec<ExpressionRef>>,
}

impl ValuesPlanNode {
    pub fn new(output_schema: Schema, values: Vec<Vec<ExpressionRef>>) -> Self {
        Self {
            output_schema,
            values,
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        &[]
    }

    pub fn get_values(&self) -> &[Vec<ExpressionRef>] {
        &self.values
    }
}
