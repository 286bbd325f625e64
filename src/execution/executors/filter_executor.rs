use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::filter_plan::FilterPlanNode;
use crate::storage::table::tuple::Tuple;

/// Emits only child tuples whose predicate evaluates to true.
pub struct FilterExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<FilterPlanNode>,
    child_executor: Box<ExecutorType>,
}

impl FilterExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<FilterPlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            _context: context,
            plan,
            child_executor,
        }
    }
}

impl AbstractExecutor for FilterExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.child_executor.init()
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        let schema = self.child_executor.get_output_schema().clone();
        while let Some((tuple, rid)) = self.child_executor.next()? {
            if self.plan.get_predicate().evaluate(&tuple, &schema).as_bool() {
                return Ok(Some((tuple, rid)));
            }
        }
        Ok(None)
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
