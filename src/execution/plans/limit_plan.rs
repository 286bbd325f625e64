use crate::catalog::schema::Schema;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Emits the first `limit` tuples of its child.
#[derive(Debug, Clone)]
pub struct LimitPlanNode {
    output_schema: Schema,
    limit: usize,
    children: Vec<PlanNodeRef>,
}

impl LimitPlanNode {
    pub fn new(output_schema: Schema, limit: usize, child: PlanNodeRef) -> Self {
        Self {
            output_schema,
            limit,
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

    pub fn get_limit(&self) -> usize {
        self.limit
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            limit: self.limit,
            children,
        }
    }
}
