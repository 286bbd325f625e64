use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::concurrency::transaction::TransactionState;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::insert_plan::InsertPlanNode;
use crate::storage::table::tuple::{Tuple, TupleMeta};
use crate::types::value::Value;

/// Inserts every child tuple into the table heap and all of the table's
/// indexes. New tuples carry the transaction's temporary timestamp until
/// commit restamps them; each insert joins the write set. Emits a single
/// row holding the insert count.
pub struct InsertExecutor {
    context: Arc<ExecutorContext>,
    plan: Arc<InsertPlanNode>,
    child_executor: Box<ExecutorType>,
    done: bool,
}

impl InsertExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<InsertPlanNode>,
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

impl AbstractExecutor for InsertExecutor {
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

        let mut count = 0i32;
        while let Some((tuple, _)) = self.child_executor.next()? {
            let meta = TupleMeta::new(txn.temp_ts(), false);
            let rid = table_heap
                .insert_tuple(meta, tuple.clone())
                .ok_or_else(|| DBError::Execution("insert into table heap failed".into()))?;
            txn.append_write_set(self.plan.get_table_oid(), rid);

            for index_info in &indexes {
                let key = tuple.key_from_tuple(
                    table_info.get_schema(),
                    index_info.get_key_schema(),
                    index_info.get_key_attrs(),
                );
                index_info.get_index().insert_entry(&key, rid);
            }
            count += 1;
        }

        Ok(Some((Tuple::new(vec![Value::new(count)]), RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
