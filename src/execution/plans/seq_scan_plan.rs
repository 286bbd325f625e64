use crate::catalog::schema::Schema;
use crate::common::config::TableOid;
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Full table scan with an optional pushed-down filter predicate.
#[derive(Debug, Clone)]
pub struct SeqScanPlanNode {
    output_schema: Schema,
    table_oid: TableOid,
    table_name: String,
    filter_predicate: Option<ExpressionRef>,
}

impl SeqScanPlanNode {
    pub fn new(
        output_schema: Schema,
        table_oid: TableOid,
        table_name: &str,
        filter_predicate: Option<ExpressionRef>,
    ) -> Self {
        Self {
            output_schema,
            table_oid,
            table_name: table_name.to_string(),
            filter_predicate,
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

    pub fn get_table_name(&self) -> &str {
        &self.table_name
    }

    pub fn get_filter_predicate(&self) -> Option<&ExpressionRef> {
        self.filter_predicate.as_ref()
    }
}
