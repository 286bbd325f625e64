//! The volcano executor interface and the closed dispatch enum.
//!
//! Every executor is a pull-based iterator: `init` resets state, `next`
//! yields one tuple at a time and `None` at the end. Executors compose by
//! owning their children; dispatch goes through the `ExecutorType` enum
//! rather than trait objects, keeping the operator set closed.

use crate::catalog::schema::Schema;
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::execution::executors::aggregation_executor::AggregationExecutor;
use crate::execution::executors::delete_executor::DeleteExecutor;
use crate::execution::executors::filter_executor::FilterExecutor;
use crate::execution::executors::hash_join_executor::HashJoinExecutor;
use crate::execution::executors::index_scan_executor::IndexScanExecutor;
use crate::execution::executors::insert_executor::InsertExecutor;
use crate::execution::executors::limit_executor::LimitExecutor;
use crate::execution::executors::nested_loop_join_executor::NestedLoopJoinExecutor;
use crate::execution::executors::seq_scan_executor::SeqScanExecutor;
use crate::execution::executors::sort_executor::SortExecutor;
use crate::execution::executors::topn_executor::TopNExecutor;
use crate::execution::executors::update_executor::UpdateExecutor;
use crate::execution::executors::values_executor::ValuesExecutor;
use crate::execution::executors::window_executor::WindowExecutor;
use crate::storage::table::tuple::Tuple;

pub trait AbstractExecutor {
    /// Must be called before the first `next()`.
    fn init(&mut self) -> Result<(), DBError>;

    /// Yields the next tuple, or `None` when exhausted.
    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError>;

    fn get_output_schema(&self) -> &Schema;
}

pub enum ExecutorType {
    SeqScan(SeqScanExecutor),
    IndexScan(IndexScanExecutor),
    Insert(InsertExecutor),
    Update(UpdateExecutor),
    Delete(DeleteExecutor),
    Values(ValuesExecutor),
    Filter(FilterExecutor),
    Limit(LimitExecutor),
    Sort(SortExecutor),
    TopN(TopNExecutor),
    Aggregation(AggregationExecutor),
    NestedLoopJoin(NestedLoopJoinExecutor),
    HashJoin(HashJoinExecutor),
    Window(WindowExecutor),
}

impl ExecutorType {
    fn as_executor(&self) -> &dyn AbstractExecutor {
        match self {
            ExecutorType::SeqScan(e) => e,
            ExecutorType::IndexScan(e) => e,
            ExecutorType::Insert(e) => e,
            ExecutorType::Update(e) => e,
            ExecutorType::Delete(e) => e,
            ExecutorType::Values(e) => e,
            ExecutorType::Filter(e) => e,
            ExecutorType::Limit(e) => e,
            ExecutorType::Sort(e) => e,
            ExecutorType::TopN(e) => e,
            ExecutorType::Aggregation(e) => e,
            ExecutorType::NestedLoopJoin(e) => e,
            ExecutorType::HashJoin(e) => e,
            ExecutorType::Window(e) => e,
        }
    }

    fn as_executor_mut(&mut self) -> &mut dyn AbstractExecutor {
        match self {
            ExecutorType::SeqScan(e) => e,
            ExecutorType::IndexScan(e) => e,
            ExecutorType::Insert(e) => e,
            ExecutorType::Update(e) => e,
            ExecutorType::Delete(e) => e,
            ExecutorType::Values(e) => e,
            ExecutorType::Filter(e) => e,
            ExecutorType::Limit(e) => e,
            ExecutorType::Sort(e) => e,
            ExecutorType::TopN(e) => e,
            ExecutorType::Aggregation(e) => e,
            ExecutorType::NestedLoopJoin(e) => e,
            ExecutorType::HashJoin(e) => e,
            ExecutorType::Window(e) => e,
        }
    }
}

impl AbstractExecutor for ExecutorType {
    fn init(&mut self) -> Result<(), DBError> {
        self.as_executor_mut().init()
    }

    fn next(&mut self) -> Result<Option<(Tuple, RID)>, DBError> {
        self.as_executor_mut().next()
    }

    fn get_output_schema(&self) -> &Schema {
        self.as_executor().get_output_schema()
    }
}
