use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::execution_common::compare_by_order_bys;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::sort_plan::SortPlanNode;
use crate::storage::table::tuple::Tuple;

/// Materializes the child and stable-sorts by the ORDER BY list.
pub struct SortExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<SortPlanNode>,
    child_executor: Box<ExecutorType>,
    output_tuples: Vec<Tuple>,
    cursor: usize,
}

impl SortExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<SortPlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            _context: context,
            plan,
            child_executor,
            output_tuples: Vec::new(),
            cursor: 0,
        }
    }
}

impl AbstractExecutor for SortExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_tuples.is_empty() {
            return Ok(());
        }

        self.child_executor.init()?;
        while let Some((tuple, _)) = self.child_executor.next()? {
            self.output_tuples.push(tuple);
        }

        let schema = self.child_executor.get_output_schema().clone();
        let order_bys = self.plan.get_order_bys().to_vec();
        self.output_tuples
            .sort_by(|a, b| compare_by_order_bys(&order_bys, &schema, a, b));
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        if self.cursor >= self.output_tuples.len() {
            return Ok(None);
        }
        let tuple = self.output_tuples[self.cursor].clone();
        self.cursor += 1;
        Ok(Some((tuple, RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
