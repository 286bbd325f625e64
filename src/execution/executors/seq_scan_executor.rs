//! Sequential scan with MVCC visibility.
//!
//! Each slot's visible version is reconstructed from the base tuple and the
//! undo chain: the base is used directly when it is committed at or before
//! the transaction's read timestamp or is the transaction's own write;
//! otherwise the chain is walked until a version old enough appears. Slots
//! with no visible version and deleted versions are skipped before the
//! pushdown predicate runs.

use log::trace;
use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::execution_common::{collect_undo_logs, reconstruct_tuple};
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::AbstractExecutor;
use crate::execution::plans::seq_scan_plan::SeqScanPlanNode;
use crate::storage::table::table_iterator::TableIterator;
use crate::storage::table::tuple::Tuple;

pub struct SeqScanExecutor {
    context: Arc<ExecutorContext>,
    plan: Arc<SeqScanPlanNode>,
    iterator: Option<TableIterator>,
}

impl SeqScanExecutor {
    pub fn new(context: Arc<ExecutorContext>, plan: Arc<SeqScanPlanNode>) -> Self {
        Self {
            context,
            plan,
            iterator: None,
        }
    }
}

impl AbstractExecutor for SeqScanExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        let catalog = self.context.get_catalog();
        let catalog_guard = catalog.read();
        let table_info = catalog_guard
            .get_table(self.plan.get_table_oid())
            .ok_or_else(|| {
                DBError::Execution(format!("table {} not found", self.plan.get_table_oid()))
            })?;
        self.iterator = Some(table_info.get_table_heap().make_iterator());
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        let txn = self.context.get_transaction();
        let txn_mgr = self.context.get_transaction_manager();
        let schema = self.plan.get_output_schema().clone();

        let iter = self
            .iterator
            .as_mut()
            .ok_or_else(|| DBError::Execution("seq scan not initialized".into()))?;

        for (base_meta, base_tuple) in iter.by_ref() {
            let rid = base_tuple.get_rid();

            let Some(undo_logs) = collect_undo_logs(rid, &base_meta, &txn, &txn_mgr) else {
                trace!("no visible version for {}", rid);
                continue;
            };
            let Some(tuple) = reconstruct_tuple(&schema, &base_tuple, &base_meta, &undo_logs)
            else {
                continue;
            };

            if let Some(predicate) = self.plan.get_filter_predicate() {
                if !predicate.evaluate(&tuple, &schema).as_bool() {
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
