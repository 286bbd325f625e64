use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::abstract_plan::JoinType;
use crate::execution::plans::nested_loop_join_plan::NestedLoopJoinPlanNode;
use crate::storage::table::tuple::Tuple;
use crate::types::value::Value;

/// Nested loop join over INNER and LEFT join types. `init()` materializes
/// the full result (rescanning the right child once per left tuple);
/// `next()` replays the buffer, so repeated re-inits are cheap.
pub struct NestedLoopJoinExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<NestedLoopJoinPlanNode>,
    left_executor: Box<ExecutorType>,
    right_executor: Box<ExecutorType>,
    output_tuples: Vec<Tuple>,
    cursor: usize,
}

impl NestedLoopJoinExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<NestedLoopJoinPlanNode>,
        left_executor: Box<ExecutorType>,
        right_executor: Box<ExecutorType>,
    ) -> Result<Self, DBError> {
        match plan.get_join_type() {
            JoinType::Inner | JoinType::Left => {}
            other => {
                return Err(DBError::NotImplemented(format!(
                    "join type {:?} not supported",
                    other
                )));
            }
        }
        Ok(Self {
            _context: context,
            plan,
            left_executor,
            right_executor,
            output_tuples: Vec::new(),
            cursor: 0,
        })
    }

    fn concat(left_values: &[Value], right_values: &[Value]) -> Tuple {
        let mut values = Vec::with_capacity(left_values.len() + right_values.len());
        values.extend_from_slice(left_values);
        values.extend_from_slice(right_values);
        Tuple::new(values)
    }
}

impl AbstractExecutor for NestedLoopJoinExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_tuples.is_empty() {
            return Ok(());
        }

        let left_schema = self.plan.get_left_plan().get_output_schema().clone();
        let right_schema = self.plan.get_right_plan().get_output_schema().clone();
        let predicate = self.plan.get_predicate().clone();

        self.left_executor.init()?;
        while let Some((left_tuple, _)) = self.left_executor.next()? {
            let mut found = false;

            self.right_executor.init()?;
            while let Some((right_tuple, _)) = self.right_executor.next()? {
                let join_value =
                    predicate.evaluate_join(&left_tuple, &left_schema, &right_tuple, &right_schema);
                if !join_value.is_null() && join_value.as_bool() {
                    found = true;
                    self.output_tuples.push(Self::concat(
                        left_tuple.get_values(),
                        right_tuple.get_values(),
                    ));
                }
            }

            if !found && self.plan.get_join_type() == JoinType::Left {
                let nulls: Vec<Value> = right_schema
                    .get_columns()
                    .iter()
                    .map(|col| Value::null(col.get_type()))
                    .collect();
                self.output_tuples
                    .push(Self::concat(left_tuple.get_values(), &nulls));
            }
        }
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
