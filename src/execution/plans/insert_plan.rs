use crate::catalog::schema::Schema;
use crate::common::config::TableOid;
use crate::execution::plans::abstract_plan::PlanNodeRef;

/// Inserts every child-produced tuple into a table; emits the insert count.
#[derive(Debug, Clone)]
pub struct InsertPlanNode {
    output_schema: Schema,
    table_oid: TableOid,
    children: Vec<PlanNodeRef>,
}

impl InsertPlanNode {
    pub fn new(output_schema: Schema, table_oid: TableOid, child: PlanNodeRef) -> Self {
        Self {
            output_schema,
            table_oid,
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

    pub(crate) fn with_children(&self, children: Vec<PlanNodeRef>) -> Self {
        Self {
            output_schema: self.output_schema.clone(),
            table_oid: self.table_oid,
            children,
        }
    }
}
