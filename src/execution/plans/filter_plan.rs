use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Predicate gate over its child.
#[derive(Debug, Clone)]
pub struct FilterPlanNode {
    output_schema: Schema,
    predicate: ExpressionRef,
    children: Vec<PlanNodeRef>,
}

impl FilterPlanNode {
    pub fn new(output_schema: Schema, predicate: ExpressionRef, child: PlanNodeRef) -> Self {
        Self {
            output_schema,
            predicate,
            children: vec![child],
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        &self.children
    }

    pub fn get_child_plan(&self) -> &PlanNodeRef {
        &self.children[0]
    }

    pub fn get_predicate(&self) -> &ExpressionRef {
        &self.predicate
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            predicate: self.predicate.clone(),
            children,
        }
    }
}
