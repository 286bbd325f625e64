use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::expressions::abstract_expression::ExpressionRef;
use crate::execution::plans::abstract_plan::JoinType;
use crate::execution::plans::hash_join_plan::HashJoinPlanNode;
use crate::storage::table::tuple::Tuple;
use crate::types::value::Value;

/// Equi-join: builds a multimap over the right input keyed by the join key
/// vector, then probes it with each left tuple. INNER and LEFT only.
pub struct HashJoinExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<HashJoinPlanNode>,
    left_executor: Box<ExecutorType>,
    right_executor: Box<ExecutorType>,
    output_tuples: Vec<Tuple>,
    cursor: usize,
}

type JoinKey = Vec<Value>;

fn make_join_key(exprs: &[ExpressionRef], tuple: &Tuple, schema: &Schema) -> JoinKey {
    exprs.iter().map(|e| e.evaluate(tuple, schema)).collect()
}

impl HashJoinExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<HashJoinPlanNode>,
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
}

impl AbstractExecutor for HashJoinExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_tuples.is_empty() {
            return Ok(());
        }

        let left_schema = self.plan.get_left_plan().get_output_schema().clone();
        let right_schema = self.plan.get_right_plan().get_output_schema().clone();

        // Build side: the right input.
        let mut hash_table: HashMap<JoinKey, Vec<Tuple>> = HashMap::new();
        self.right_executor.init()?;
        while let Some((right_tuple, _)) = self.right_executor.next()? {
            let key = make_join_key(
                self.plan.get_right_key_expressions(),
                &right_tuple,
                &right_schema,
            );
            hash_table.entry(key).or_default().push(right_tuple);
        }

        // Probe side: the left input.
        self.left_executor.init()?;
        while let Some((left_tuple, _)) = self.left_executor.next()? {
            let key = make_join_key(
                self.plan.get_left_key_expressions(),
                &left_tuple,
                &left_schema,
            );
            let matches = hash_table.get(&key);

            let mut emitted = false;
            if let Some(matches) = matches {
                for right_tuple in matches {
                    let mut values = left_tuple.get_values().to_vec();
                    values.extend_from_slice(right_tuple.get_values());
                    self.output_tuples.push(Tuple::new(values));
                    emitted = true;
                }
            }
            if !emitted && self.plan.get_join_type() == JoinType::Left {
                let mut values = left_tuple.get_values().to_vec();
                values.extend(
                    right_schema
                        .get_columns()
                        .iter()
                        .map(|col| Value::null(col.get_type())),
                );
                self.output_tuples.push(Tuple::new(values));
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
