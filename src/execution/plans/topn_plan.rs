use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::{OrderByType, PlanNodeRef};

/// Keeps only the first `n` tuples of the child in ORDER BY order, with a
/// bounded heap instead of a full sort.
#[derive(Debug, Clone)]
pub struct TopNPlanNode {
    output_schema: Schema,
    order_bys: Vec<(OrderByType, ExpressionRef)>,
    n: usize,
    children: Vec<PlanNodeRef>,
}

impl TopNPlanNode {
    pub fn new(
        output_schema: Schema,
        order_bys: Vec<(OrderByType, ExpressionRef)>,
        n: usize,
        child: PlanNodeRef,
    ) -> Self {
        Self {
            output_schema,
            order_bys,
            n,
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

    pub fn get_n(&self) -> usize {
        self.n
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            order_bys: self.order_bys.clone(),
            n: self.n,
            children,
        }
    }
}
