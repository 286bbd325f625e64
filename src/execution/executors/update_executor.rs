//! MVCC update.
//!
//! The new tuple is built from the target expressions and diffed against the
//! base to find the modified columns. Three cases by base timestamp:
//!
//! - own uncommitted write: overwrite in place; if this transaction already
//!   holds an undo log for the RID, widen it (union of modified sets, the
//!   earlier pre-image wins for columns both cover).
//! - newer than the snapshot: write-write conflict, taint and raise.
//! - committed at or before the snapshot: append a delta undo log carrying
//!   the pre-image of the modified columns, point the head link at it, and
//!   overwrite the base under the temporary timestamp.
//!
//! Indexes are touched only for keys that actually changed.

use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::concurrency::transaction::{TransactionState, UndoLink, UndoLog};
use crate::execution::execution_common::{cover_undo_log, delta_tuple, get_modified_fields};
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::update_plan::UpdatePlanNode;
use crate::storage::table::tuple::{Tuple, TupleMeta};
use crate::types::value::Value;

pub struct UpdateExecutor {
    context: Arc<ExecutorContext>,
    plan: Arc<UpdatePlanNode>,
    child_executor: Box<ExecutorType>,
    done: bool,
}

impl UpdateExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<UpdatePlanNode>,
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

impl AbstractExecutor for UpdateExecutor {
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
            let new_values: Vec<Value> = self
                .plan
                .get_target_expressions()
                .iter()
                .map(|expr| expr.evaluate(&child_tuple, schema))
                .collect();
            let new_tuple = Tuple::new(new_values);

            let (base_meta, base_tuple) = table_heap
                .get_tuple(rid)
                .ok_or_else(|| DBError::Execution(format!("tuple {} not found", rid)))?;
            let modified_fields = get_modified_fields(&new_tuple, &base_tuple, schema);

            if base_meta.ts() == txn.temp_ts() {
                // Second write by the same transaction: widen the existing
                // undo log so it still restores the oldest pre-image.
                if let Some(link) = txn_mgr.get_undo_link(rid).filter(UndoLink::is_valid) {
                    if link.prev_txn == txn.get_txn_id() {
                        let old_log = txn_mgr.get_undo_log(link);
                        let delta = delta_tuple(&base_tuple, &modified_fields);
                        let covered = cover_undo_log(&delta, &modified_fields, &old_log);
                        txn.modify_undo_log(link.prev_log_idx, covered);
                    }
                }
                table_heap.update_tuple_in_place(
                    TupleMeta::new(txn.temp_ts(), false),
                    new_tuple.clone(),
                    rid,
                );
            } else if base_meta.ts() > txn.get_read_ts() {
                txn.set_tainted();
                return Err(DBError::WriteWriteConflict {
                    txn_id: txn.txn_id_human_readable(),
                    rid,
                });
            } else {
                let undo_log = UndoLog {
                    is_deleted: base_meta.is_deleted(),
                    modified_fields: modified_fields.clone(),
                    tuple: delta_tuple(&base_tuple, &modified_fields),
                    ts: base_meta.ts(),
                    prev_version: txn_mgr.get_undo_link(rid).unwrap_or(UndoLink::INVALID),
                };
                let link = txn.append_undo_log(undo_log);
                txn_mgr.update_undo_link(rid, Some(link), None);
                table_heap.update_tuple_in_place(
                    TupleMeta::new(txn.temp_ts(), false),
                    new_tuple.clone(),
                    rid,
                );
            }
            txn.append_write_set(self.plan.get_table_oid(), rid);

            // Only indexes whose key actually changed are maintained.
            for index_info in &indexes {
                let old_key = base_tuple.key_from_tuple(
                    schema,
                    index_info.get_key_schema(),
                    index_info.get_key_attrs(),
                );
                let new_key = new_tuple.key_from_tuple(
                    schema,
                    index_info.get_key_schema(),
                    index_info.get_key_attrs(),
                );
                if keys_equal(&old_key, &new_key) {
                    continue;
                }
                index_info.get_index().delete_entry(&old_key, rid);
                index_info.get_index().insert_entry(&new_key, rid);
            }
            count += 1;
        }

        Ok(Some((Tuple::new(vec![Value::new(count)]), RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}

fn keys_equal(a: &Tuple, b: &Tuple) -> bool {
    a.get_values().len() == b.get_values().len()
        && a.get_values()
            .iter()
            .zip(b.get_values())
            .all(|(x, y)| x.compare_equals(y).is_true())
}
