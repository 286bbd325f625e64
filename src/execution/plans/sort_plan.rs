use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::{OrderByType, PlanNodeRef};

/// Materializing sort by an ORDER BY list.
#[derive(Debug, Clone)]
pub struct SortPlanNode {
    output_schema: Schema,
    order_bys: Vec<(OrderByType, ExpressionRef)>,
    children: Vec<PlanNodeRef>,
}

impl SortPlanNode {
    pub fn new(
        output_schema: Schema,
        order_bys: Vec<(OrderByType, ExpressionRef)>,
        child: PlanNodeRef,
    ) -> Self {
        Self {
            output_schema,
            order_bys,
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

    pub fn get_order_bys(&self) -> &[(OrderByType, ExpressionRef)] {
        &self.order_bys
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            order_bys: self.order_bys.clone(),
            children,
        }
    }
}
