use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::{JoinType, PlanNodeRef};

/// Nested loop join: rescans the right child per left tuple.
#[derive(Debug, Clone)]
pub struct NestedLoopJoinPlanNode {
    output_schema: Schema,
    predicate: ExpressionRef,
    join_type: JoinType,
    children: Vec<PlanNodeRef>,
}

impl NestedLoopJoinPlanNode {
    pub fn new(
        output_schema: Schema,
        left: PlanNodeRef,
        right: PlanNodeRef,
        predicate: ExpressionRef,
        join_type: JoinType,
    ) -> Self {
        Self {
            output_schema,
            predicate,
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

    pub fn get_predicate(&self) -> &ExpressionRef {
        &self.predicate
    }

    pub fn get_join_type(&self) -> JoinType {
        self.join_type
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        assert_eq!(children.len(), 2);
        Self {
            output_schema: self.output_schema.clone(),
            predicate: self.predicate.clone(),
            join_type: self.join_type,
            children,
        }
    }
}
