use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::AbstractExecutor;
use crate::execution::plans::index_scan_plan::IndexScanPlanNode;
use crate::storage::table::tuple::Tuple;

/// Probes the index with the plan's constant key, then fetches the matching
/// base tuples, skipping deletions and re-checking the filter predicate.
pub struct IndexScanExecutor {
    context: Arc<ExecutorContext>,
    plan: Arc<IndexScanPlanNode>,
    results: Vec<RID>,
    cursor: usize,
}

impl IndexScanExecutor {
    pub fn new(context: Arc<ExecutorContext>, plan: Arc<IndexScanPlanNode>) -> Self {
        Self {
            context,
            plan,
            results: Vec::new(),
            cursor: 0,
        }
    }
}

impl AbstractExecutor for IndexScanExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.results.clear();
        self.cursor = 0;

        let catalog = self.context.get_catalog();
        let catalog_guard = catalog.read();
        let index_info = catalog_guard
            .get_index(self.plan.get_index_oid())
            .ok_or_else(|| {
                DBError::Execution(format!("index {} not found", self.plan.get_index_oid()))
            })?;

        let key_value = self.plan.get_pred_key().evaluate();
        let key_tuple = Tuple::new(vec![key_value]);
        index_info.get_index().scan_key(&key_tuple, &mut self.results);
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        let catalog = self.context.get_catalog();
        let catalog_guard = catalog.read();
        let table_info = catalog_guard
            .get_table(self.plan.get_table_oid())
            .ok_or_else(|| {
                DBError::Execution(format!("table {} not found", self.plan.get_table_oid()))
            })?;
        let table_heap = table_info.get_table_heap();
        let schema = self.plan.get_output_schema();

        while self.cursor < self.results.len() {
            let rid = self.results[self.cursor];
            self.cursor += 1;

            let Some((meta, tuple)) = table_heap.get_tuple(rid) else {
                continue;
            };
            if meta.is_deleted() {
                continue;
            }
            if let Some(predicate) = self.plan.get_filter_predicate() {
                if !predicate.evaluate(&tuple, schema).as_bool() {
                    continue;
                }
            }
            return Ok(Some((tuple, rid)));
        }
        Ok(None)
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
