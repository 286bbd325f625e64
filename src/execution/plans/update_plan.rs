use crate::catalog::schema::Schema;
use crate::common::config::TableOid;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Rewrites every child-produced tuple with the target expressions; emits
/// the update count.
#[derive(Debug, Clone)]
pub struct UpdatePlanNode {
    output_schema: Schema,
    table_oid: TableOid,
    target_expressions: Vec<ExpressionRef>,
    children: Vec<PlanNodeRef>,
}

impl UpdatePlanNode {
    pub fn new(
        output_schema: Schema,
        table_oid: TableOid,
        target_expressions: Vec<ExpressionRef>,
        child: PlanNodeRef,
    ) -> Self {
        Self {
            output_schema,
            table_oid,
            target_expressions,
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

    pub fn get_table_oid(&self) -> TableOid {
        self.table_oid
    }

    pub fn get_target_expressions(&self) -> &[ExpressionRef] {
        &self.target_expressions
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            table_oid: self.table_oid,
            target_expressions: self.target_expressions.clone(),
            children,
        }
    }
}
