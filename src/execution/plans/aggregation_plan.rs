use crate::catalog::schema::Schema;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::PlanNodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationType {
    CountStar,
    Count,
    Sum,
    Min,
    Max,
}

/// Hash aggregation: one bucket per distinct group-by vector, combining one
/// partial aggregate per aggregate expression.
#[derive(Debug, Clone)]
pub struct AggregationPlanNode {
    output_schema: Schema,
    group_bys: Vec<ExpressionRef>,
    aggregates: Vec<ExpressionRef>,
    agg_types: Vec<AggregationType>,
    children: Vec<PlanNodeRef>,
}

impl AggregationPlanNode {
    pub fn new(
        output_schema: Schema,
        group_bys: Vec<ExpressionRef>,
        aggregates: Vec<ExpressionRef>,
        agg_types: Vec<AggregationType>,
        child: PlanNodeRef,
    ) -> Self {
        assert_eq!(aggregates.len(), agg_types.len());
        Self {
            output_schema,
            group_bys,
            aggregates,
            agg_types,
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

    pub fn get_group_bys(&self) -> &[ExpressionRef] {
        &self.group_bys
    }

    pub fn get_aggregates(&self) -> &[ExpressionRef] {
        &self.aggregates
    }

    pub fn get_aggregate_types(&self) -> &[AggregationType] {
        &self.agg_types
    }

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            group_bys: self.group_bys.clone(),
            aggregates: self.aggregates.clone(),
            agg_types: self.agg_types.clone(),
            children,
        }
    }
}
