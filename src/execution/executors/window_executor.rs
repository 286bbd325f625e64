//! Window functions.
//!
//! The input is sorted by the (single) ORDER BY of the first window
//! definition. With an ORDER BY, aggregates run *cumulatively*: each row
//! observes the combine of every row up to itself within its partition, and
//! RANK assigns tied order-by keys the same rank, jumping by the size of the
//! previous tied group. Without an ORDER BY, each partition's aggregate is
//! computed in full first and every row observes the final value.

use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::execution_common::compare_by_order_bys;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::window_plan::{WindowFunctionType, WindowPlanNode};
use crate::storage::table::tuple::Tuple;
use crate::types::type_id::TypeId;
use crate::types::value::Value;

type AggregateKey = Vec<Value>;

/// Per-window-function state: running aggregate per partition plus the RANK
/// bookkeeping (last seen order-by key and the size of its tied group).
struct SimpleWindowHashTable {
    win_type: WindowFunctionType,
    values: HashMap<AggregateKey, Value>,
    last_order: HashMap<AggregateKey, Vec<Value>>,
    last_order_count: HashMap<AggregateKey, i32>,
}

impl SimpleWindowHashTable {
    fn new(win_type: WindowFunctionType) -> Self {
        Self {
            win_type,
            values: HashMap::new(),
            last_order: HashMap::new(),
            last_order_count: HashMap::new(),
        }
    }

    fn insert_combine(&mut self, key: &AggregateKey, input: &Value) {
        let entry = self
            .values
            .entry(key.clone())
            .or_insert_with(|| match self.win_type {
                WindowFunctionType::CountStar | WindowFunctionType::Rank => Value::new(0),
                _ => Value::null(TypeId::Integer),
            });
        match self.win_type {
            WindowFunctionType::CountStar => {
                *entry = entry.add(&Value::new(1));
            }
            WindowFunctionType::Count => {
                if !input.is_null() {
                    if entry.is_null() {
                        *entry = Value::new(0);
                    }
                    *entry = entry.add(&Value::new(1));
                }
            }
            WindowFunctionType::Sum => {
                if !input.is_null() {
                    *entry = if entry.is_null() {
                        input.clone()
                    } else {
                        entry.add(input)
                    };
                }
            }
            WindowFunctionType::Min => {
                if !input.is_null() {
                    *entry = entry.min(input);
                }
            }
            WindowFunctionType::Max => {
                if !input.is_null() {
                    *entry = entry.max(input);
                }
            }
            WindowFunctionType::Rank => {
                // For RANK the input carries the rank increment.
                *entry = entry.add(input);
            }
        }
    }

    fn output(&self, key: &AggregateKey) -> Value {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| Value::null(TypeId::Integer))
    }
}

pub struct WindowExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<WindowPlanNode>,
    child_executor: Box<ExecutorType>,
    output_tuples: Vec<Tuple>,
    cursor: usize,
}

impl WindowExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<WindowPlanNode>,
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

impl AbstractExecutor for WindowExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_tuples.is_empty() {
            return Ok(());
        }

        let child_schema = self.child_executor.get_output_schema().clone();
        let window_functions = self.plan.get_window_functions();
        let mut tables: HashMap<usize, SimpleWindowHashTable> = window_functions
            .iter()
            .map(|(idx, win)| (*idx, SimpleWindowHashTable::new(win.win_type)))
            .collect();

        let mut tuples = Vec::new();
        self.child_executor.init()?;
        while let Some((tuple, _)) = self.child_executor.next()? {
            tuples.push(tuple);
        }

        let order_bys = window_functions
            .values()
            .next()
            .map(|win| win.order_by.clone())
            .unwrap_or_default();

        if !order_bys.is_empty() {
            tuples.sort_by(|a, b| compare_by_order_bys(&order_bys, &child_schema, a, b));
        } else {
            // No ORDER BY: aggregate whole partitions up front.
            for tuple in &tuples {
                for (idx, win) in window_functions {
                    let key: AggregateKey = win
                        .partition_by
                        .iter()
                        .map(|e| e.evaluate(tuple, &child_schema))
                        .collect();
                    let input = win.function.evaluate(tuple, &child_schema);
                    tables.get_mut(idx).unwrap().insert_combine(&key, &input);
                }
            }
        }

        for tuple in &tuples {
            let mut values = Vec::with_capacity(self.plan.get_columns().len());
            for (idx, column) in self.plan.get_columns().iter().enumerate() {
                let Some(win) = window_functions.get(&idx) else {
                    values.push(column.evaluate(tuple, &child_schema));
                    continue;
                };

                let table = tables.get_mut(&idx).unwrap();
                let key: AggregateKey = win
                    .partition_by
                    .iter()
                    .map(|e| e.evaluate(tuple, &child_schema))
                    .collect();

                if !order_bys.is_empty() {
                    if win.win_type == WindowFunctionType::Rank {
                        let now_order: Vec<Value> = order_bys
                            .iter()
                            .map(|(_, e)| e.evaluate(tuple, &child_schema))
                            .collect();
                        let same_as_last = table
                            .last_order
                            .get(&key)
                            .map(|last| {
                                last.len() == now_order.len()
                                    && last
                                        .iter()
                                        .zip(&now_order)
                                        .all(|(a, b)| a.compare_equals(b).is_true())
                            })
                            .unwrap_or(false);

                        if same_as_last {
                            *table.last_order_count.entry(key.clone()).or_insert(0) += 1;
                        } else {
                            let tied = *table.last_order_count.get(&key).unwrap_or(&0);
                            let increase = if tied == 0 { 1 } else { tied };
                            table.insert_combine(&key, &Value::new(increase));
                            table.last_order.insert(key.clone(), now_order);
                            table.last_order_count.insert(key.clone(), 1);
                        }
                    } else {
                        let input = win.function.evaluate(tuple, &child_schema);
                        table.insert_combine(&key, &input);
                    }
                }
                values.push(table.output(&key));
            }
            self.output_tuples.push(Tuple::new(values));
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
