use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::AbstractExecutor;
use crate::execution::plans::values_plan::ValuesPlanNode;
use crate::storage::table::tuple::Tuple;

/// Emits the plan's literal rows, one per `next()`.
pub struct ValuesExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<ValuesPlanNode>,
    cursor: usize,
}

impl ValuesExecutor {
    pub fn new(context: Arc<ExecutorContext>, plan: Arc<ValuesPlanNode>) -> Self {
        Self {
            _context: context,
            plan,
            cursor: 0,
        }
    }
}

impl AbstractExecutor for ValuesExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        let rows = self.plan.get_values();
        if self.cursor >= rows.len() {
            return Ok(None);
        }
        let dummy = Tuple::empty();
        let schema = self.plan.get_output_schema();
        let values = rows[self.cursor]
            .iter()
            .map(|expr| expr.evaluate(&dummy, schema))
            .collect();
        self.cursor += 1;
        Ok(Some((Tuple::new(values), RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
