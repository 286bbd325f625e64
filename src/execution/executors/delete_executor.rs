//! MVCC delete.
//!
//! For each child-produced RID the base timestamp decides the path: the
//! transaction's own write is simply marked deleted; a version newer than
//! the snapshot is a write-write conflict (the transaction is tainted and
//! the error raised); otherwise a full-pre-image undo log is appended and
//! the base is soft-deleted under the transaction's temporary timestamp.

use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::concurrency::transaction::{TransactionState, UndoLink, UndoLog};
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::delete_plan::DeletePlanNode;
use crate::storage::table::tuple::{Tuple, TupleMeta};
use crate::types::value::Value;

pub struct DeleteExecutor {
    context: Arc<ExecutorContext>,
    plan: Arc<DeletePlanNode>,
    child_executor: Box<ExecutorType>,
    done: bool,
}

impl DeleteExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<DeletePlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            context,
            plan,
            child_executor,
            done: false,
        }
    }
}

impl AbstractExecutor for DeleteExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.child_executor.init()?;
        self.done = false;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        if self.done {
            return Ok(None);
        }
        self.done = true;

        let txn = self.context.get_transaction();
        if txn.get_state() == TransactionState::Tainted {
            return Err(DBError::TxnTainted(txn.txn_id_human_readable()));
        }

        let catalog = self.context.get_catalog();
        let catalog_guard = catalog.read();
        let table_info = catalog_guard
            .get_table(self.plan.get_table_oid())
            .ok_or_else(|| {
                DBError::Execution(format!("table {} not found", self.plan.get_table_oid()))
            })?;
        let table_heap = table_info.get_table_heap();
        let indexes = catalog_guard.get_table_indexes(table_info.get_name());
        let txn_mgr = self.context.get_transaction_manager();
        let schema = table_info.get_schema();

        let mut count = 0i32;
        while let Some((child_tuple, rid)) = self.child_executor.next()? {
            let base_meta = table_heap
                .get_tuple_meta(rid)
                .ok_or_else(|| DBError::Execution(format!("tuple {} not found", rid)))?;

            if base_meta.ts() == txn.temp_ts() {
                // Our own uncommitted write; the existing undo log (if any)
                // already preserves the pre-image.
                table_heap.update_tuple_meta(TupleMeta::new(txn.temp_ts(), true), rid);
            } else if base_meta.ts() > txn.get_read_ts() {
                txn.set_tainted();
                return Err(DBError::WriteWriteConflict {
                    txn_id: txn.txn_id_human_readable(),
                    rid,
                });
            } else {
                let (_, base_tuple) = table_heap
                    .get_tuple(rid)
                    .ok_or_else(|| DBError::Execution(format!("tuple {} not found", rid)))?;
                let undo_log = UndoLog {
                    is_deleted: base_meta.is_deleted(),
                    modified_fields: vec![true; schema.get_column_count()],
                    tuple: base_tuple,
                    ts: base_meta.ts(),
                    prev_version: txn_mgr.get_undo_link(rid).unwrap_or(UndoLink::INVALID),
                };
                let link = txn.append_undo_log(undo_log);
                txn_mgr.update_undo_link(rid, Some(link), None);
                table_heap.update_tuple_meta(TupleMeta::new(txn.temp_ts(), true), rid);
            }
            txn.append_write_set(self.plan.get_table_oid(), rid);

            for index_info in &indexes {
                let key = child_tuple.key_from_tuple(
                    schema,
                    index_info.get_key_schema(),
                    index_info.get_key_attrs(),
                );
                index_info.get_index().delete_entry(&key, rid);
            }
            count += 1;
        }

        Ok(Some((Tuple::new(vec![Value::new(count)]), RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
