use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::limit_plan::LimitPlanNode;
use crate::storage::table::tuple::Tuple;

/// Passes through the first `limit` child tuples.
pub struct LimitExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<LimitPlanNode>,
    child_executor: Box<ExecutorType>,
    emitted: usize,
}

impl LimitExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<LimitPlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            _context: context,
            plan,
            child_executor,
            emitted: 0,
        }
    }
}

impl AbstractExecutor for LimitExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.child_executor.init()?;
        self.emitted = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        if self.emitted >= self.plan.get_limit() {
            return Ok(None);
        }
        match self.child_executor.next()? {
            Some(item) => {
                self.emitted += 1;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
