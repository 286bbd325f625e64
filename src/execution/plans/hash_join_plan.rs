use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::{JoinType, PlanNodeRef};

/// Equi-join over extracted key expression lists, one per side.
#[derive(Debug, Clone)]
pub struct HashJoinPlanNode {
    output_schema: Schema,
    left_key_expressions: Vec<ExpressionRef>,
    right_key_expressions: Vec<ExpressionRef>,
    join_type: JoinType,
    children: Vec<PlanNodeRef>,
}

impl HashJoinPlanNode {
    pub fn new(
        output_schema: Schema,
        left: PlanNodeRef,
        right: PlanNodeRef,
        left_key_expressions: Vec<ExpressionRef>,
        right_key_expressions: Vec<ExpressionRef>,
        join_type: JoinType,
    ) -> Self {
        Self {
            output_schema,
            left_key_expressions,
            right_key_expressions,
            join_type,
            children: vec![left, right],
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        &self.children
    }

    pub fn get_left_plan(&self) -> &PlanNodeRef {
        &self.children[0]
    }

    pub fn get_right_plan(&self) -> &PlanNodeRef {
        &self.children[1]
    }

    pub fn get_left_key_expressions(&self) -> &[ExpressionRef] {
        &self.left_key_expressions
    }

    pub fn get_right_key_expressions(&self) -> &[ExpressionRef] {
        &self.right_key_expressions
    }

    pub fn get_join_type(&self) -> JoinType {
        self.join_type
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        assert_eq!(children.len(), 2);
        Self {
            output_schema: self.output_schema.clone(),
            left_key_expressions: self.left_key_expressions.clone(),
            right_key_expressions: self.right_key_expressions.clone(),
            join_type: self.join_type,
            children,
        }
    }
}
