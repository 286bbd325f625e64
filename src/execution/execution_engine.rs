//! Builds executor trees from plans and drives them to completion.

use log::debug;
use std::sync::Arc;

use crate::common::exception::DBError;
use crate::execution::executor_context::ExecutorContext;
use crate::execution::executors::abstract_executor::{AbstractExecutor, ExecutorType};
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
use crate::execution::plans::abstract_plan::{PlanNode, PlanNodeRef};
use crate::storage::table::tuple::Tuple;

pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Recursively builds the executor tree for a plan. Unsupported plan
    /// shapes (join types beyond INNER/LEFT) fail here, at construction.
    pub fn create_executor(
        context: &Arc<ExecutorContext>,
        plan: &PlanNodeRef,
    ) -> Result<ExecutorType, DBError> {
        match plan.as_ref() {
            PlanNode::SeqScan(n) => Ok(ExecutorType::SeqScan(SeqScanExecutor::new(
                Arc::clone(context),
                Arc::new(n.clone()),
            ))),
            PlanNode::IndexScan(n) => Ok(ExecutorType::IndexScan(IndexScanExecutor::new(
                Arc::clone(context),
                Arc::new(n.clone()),
            ))),
            PlanNode::Values(n) => Ok(ExecutorType::Values(ValuesExecutor::new(
                Arc::clone(context),
                Arc::new(n.clone()),
            ))),
            PlanNode::Insert(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Insert(InsertExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Update(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Update(UpdateExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Delete(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Delete(DeleteExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Filter(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Filter(FilterExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Limit(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Limit(LimitExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Sort(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Sort(SortExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::TopN(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::TopN(TopNExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::Aggregation(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Aggregation(AggregationExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
            PlanNode::NestedLoopJoin(n) => {
                let left = Self::create_executor(context, n.get_left_plan())?;
                let right = Self::create_executor(context, n.get_right_plan())?;
                Ok(ExecutorType::NestedLoopJoin(NestedLoopJoinExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(left),
                    Box::new(right),
                )?))
            }
            PlanNode::HashJoin(n) => {
                let left = Self::create_executor(context, n.get_left_plan())?;
                let right = Self::create_executor(context, n.get_right_plan())?;
                Ok(ExecutorType::HashJoin(HashJoinExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(left),
                    Box::new(right),
                )?))
            }
            PlanNode::Window(n) => {
                let child = Self::create_executor(context, n.get_child_plan())?;
                Ok(ExecutorType::Window(WindowExecutor::new(
                    Arc::clone(context),
                    Arc::new(n.clone()),
                    Box::new(child),
                )))
            }
        }
    }

    /// Pulls the root executor to completion and collects its output.
    pub fn execute(
        context: Arc<ExecutorContext>,
        plan: PlanNodeRef,
    ) -> Result<Vec<Tuple>, DBError> {
        let mut executor = Self::create_executor(&context, &plan)?;
        executor.init()?;

        let mut results = Vec::new();
        while let Some((tuple, _)) = executor.next()? {
            results.push(tuple);
        }
        debug!(
            "executed {:?} plan, {} row(s)",
            plan.get_type(),
            results.len()
        );
        Ok(results)
    }
}
