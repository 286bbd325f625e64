use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
use crate::execution::plans::aggregation_plan::{AggregationPlanNode, AggregationType};
use crate::storage::table::tuple::Tuple;
use crate::types::type_id::TypeId;
use crate::types::value::Value;

type AggregateKey = Vec<Value>;

/// Hash table combining one partial aggregate per aggregate expression,
/// keyed by the group-by vector.
struct SimpleAggregationHashTable {
    agg_types: Vec<AggregationType>,
    table: HashMap<AggregateKey, Vec<Value>>,
}

impl SimpleAggregationHashTable {
    fn new(agg_types: Vec<AggregationType>) -> Self {
        Self {
            agg_types,
            table: HashMap::new(),
        }
    }

    /// `COUNT(*)` starts at zero; every other aggregate starts as NULL.
    fn generate_initial_aggregate_value(&self) -> Vec<Value> {
        self.agg_types
            .iter()
            .map(|agg_type| match agg_type {
                AggregationType::CountStar => Value::new(0),
                _ => Value::null(TypeId::Integer),
            })
            .collect()
    }

    /// Folds one input row into the group's partial aggregates. NULL inputs
    /// are ignored by everything except `COUNT(*)`.
    fn insert_combine(&mut self, key: AggregateKey, inputs: Vec<Value>) {
        let initial = self.generate_initial_aggregate_value();
        let entry = self.table.entry(key).or_insert(initial);
        for (i, agg_type) in self.agg_types.iter().enumerate() {
            let input = &inputs[i];
            match agg_type {
                AggregationType::CountStar => {
                    entry[i] = entry[i].add(&Value::new(1));
                }
                AggregationType::Count => {
                    if !input.is_null() {
                        if entry[i].is_null() {
                            entry[i] = Value::new(0);
                        }
                        entry[i] = entry[i].add(&Value::new(1));
                    }
                }
                AggregationType::Sum => {
                    if !input.is_null() {
                        entry[i] = if entry[i].is_null() {
                            input.clone()
                        } else {
                            entry[i].add(input)
                        };
                    }
                }
                AggregationType::Min => {
                    if !input.is_null() {
                        entry[i] = entry[i].min(input);
                    }
                }
                AggregationType::Max => {
                    if !input.is_null() {
                        entry[i] = entry[i].max(input);
                    }
                }
            }
        }
    }

    /// Seeds the no-group-by empty-input case with a single initial row.
    fn insert_initial(&mut self, key: AggregateKey) {
        let initial = self.generate_initial_aggregate_value();
        self.table.entry(key).or_insert(initial);
    }

    fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn drain_entries(&mut self) -> Vec<(AggregateKey, Vec<Value>)> {
        self.table.drain().collect()
    }
}

/// Hash aggregation: `init()` drains the child into the hash table, `next()`
/// yields one row per group as group keys followed by aggregates.
pub struct AggregationExecutor {
    _context: Arc<ExecutorContext>,
    plan: Arc<AggregationPlanNode>,
    child_executor: Box<ExecutorType>,
    output_rows: Vec<(AggregateKey, Vec<Value>)>,
    cursor: usize,
}

impl AggregationExecutor {
    pub fn new(
        context: Arc<ExecutorContext>,
        plan: Arc<AggregationPlanNode>,
        child_executor: Box<ExecutorType>,
    ) -> Self {
        Self {
            _context: context,
            plan,
            child_executor,
            output_rows: Vec::new(),
            cursor: 0,
        }
    }
}

impl AbstractExecutor for AggregationExecutor {
    fn init(&mut self) -> Result<(), DBError> {
        self.cursor = 0;
        if !self.output_rows.is_empty() {
            return Ok(());
        }

        let child_schema = self.plan.get_child_plan().get_output_schema().clone();
        let mut aht = SimpleAggregationHashTable::new(self.plan.get_aggregate_types().to_vec());

        self.child_executor.init()?;
        while let Some((tuple, _)) = self.child_executor.next()? {
            let key: AggregateKey = self
                .plan
                .get_group_bys()
                .iter()
                .map(|e| e.evaluate(&tuple, &child_schema))
                .collect();
            let inputs: Vec<Value> = self
                .plan
                .get_aggregates()
                .iter()
                .map(|e| e.evaluate(&tuple, &child_schema))
                .collect();
            aht.insert_combine(key, inputs);
        }

        // An empty input with no GROUP BY still produces one row of initial
        // aggregate values.
        if aht.is_empty() && self.plan.get_group_bys().is_empty() {
            aht.insert_initial(Vec::new());
        }

        self.output_rows = aht.drain_entries();
        Ok(())
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        if self.cursor >= self.output_rows.len() {
            return Ok(None);
        }
        let (key, aggregates) = &self.output_rows[self.cursor];
        self.cursor += 1;

        let mut values = key.clone();
        values.extend(aggregates.iter().cloned());
        Ok(Some((Tuple::new(values), RID::default())))
    }

    fn get_output_schema(&self) -> &Schema {
        self.plan.get_output_schema()
    }
}
