use crate::catalog::schema::Schema;
use crate::common::config::{IndexOid, TableOid};
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::expressions::constant_value_expression::ConstantValueExpression;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Point lookup through an index: probes with the constant key, then
/// re-checks the filter predicate against the fetched base tuples.
#[derive(Debug, Clone)]
pub struct IndexScanPlanNode {
    output_schema: Schema,
    table_oid: TableOid,
    index_oid: IndexOid,
    filter_predicate: Option<ExpressionRef>,
    pred_key: ConstantValueExpression,
}

impl IndexScanPlanNode {
    pub fn new(
        output_schema: Schema,
        table_oid: TableOid,
        index_oid: IndexOid,
        filter_predicate: Option<ExpressionRef>,
        pred_key: ConstantValueExpression,
    ) -> Self {
        Self {
            output_schema,
            table_oid,
            index_oid,
            filter_predicate,
            pred_key,
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        &[]
    }

    pub fn get_table_oid(&self) -> TableOid {
        self.table_oid
    }

    pub fn get_index_oid(&self) -> IndexOid {
        self.index_oid
    }

    pub fn get_filter_predicate(&self) -> Option<&ExpressionRef> {
        self.filter_predicate.as_ref()
    }

    pub fn get_pred_key(&self) -> &ConstantValueExpression {
        &self.pred_key
    }
}
