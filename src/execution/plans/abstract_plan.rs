//! Plan nodes: tagged algebraic variants over a closed operator set. Each
//! node owns its children; the optimizer rewrites trees by cloning nodes
//! with optimized children.

use std::sync::Arc;

use crate::catalog::schema::Schema;
use crate::execution::plans::aggregation_plan::AggregationPlanNode;
use crate::execution::plans::delete_plan::DeletePlanNode;
use crate::execution::plans::filter_plan::FilterPlanNode;
use crate::execution::plans::hash_join_plan::HashJoinPlanNode;
use crate::execution::plans::index_scan_plan::IndexScanPlanNode;
use crate::execution::plans::insert_plan::InsertPlanNode;
use crate::execution::plans::limit_plan::LimitPlanNode;
use crate::execution::plans::nested_loop_join_plan::NestedLoopJoinPlanNode;
use crate::execution::plans::seq_scan_plan::SeqScanPlanNode;
use crate::execution::plans::sort_plan::SortPlanNode;
use crate::execution::plans::topn_plan::TopNPlanNode;
use crate::execution::plans::update_plan::UpdatePlanNode;
use crate::execution::plans::values_plan::ValuesPlanNode;
use crate::execution::plans::window_plan::WindowPlanNode;

pub type PlanNodeRef = Arc<PlanNode>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanType {
    SeqScan,
    IndexScan,
    Insert,
    Update,
    Delete,
    Values,
    Filter,
    Limit,
    Sort,
    TopN,
    Aggregation,
    NestedLoopJoin,
    HashJoin,
    Window,
}

/// Direction of an ORDER BY entry; `Default` is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByType {
    Invalid,
    Default,
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Outer,
}

#[derive(Debug, Clone)]
pub enum PlanNode {
    SeqScan(SeqScanPlanNode),
    IndexScan(IndexScanPlanNode),
    Insert(InsertPlanNode),
    Update(UpdatePlanNode),
    Delete(DeletePlanNode),
    Values(ValuesPlanNode),
    Filter(FilterPlanNode),
    Limit(LimitPlanNode),
    Sort(SortPlanNode),
    TopN(TopNPlanNode),
    Aggregation(AggregationPlanNode),
    NestedLoopJoin(NestedLoopJoinPlanNode),
    HashJoin(HashJoinPlanNode),
    Window(WindowPlanNode),
}

impl PlanNode {
    pub fn get_type(&self) -> PlanType {
        match self {
            PlanNode::SeqScan(_) => PlanType::SeqScan,
            PlanNode::IndexScan(_) => PlanType::IndexScan,
            PlanNode::Insert(_) => PlanType::Insert,
            PlanNode::Update(_) => PlanType::Update,
            PlanNode::Delete(_) => PlanType::Delete,
            PlanNode::Values(_) => PlanType::Values,
            PlanNode::Filter(_) => PlanType::Filter,
            PlanNode::Limit(_) => PlanType::Limit,
            PlanNode::Sort(_) => PlanType::Sort,
            PlanNode::TopN(_) => PlanType::TopN,
            PlanNode::Aggregation(_) => PlanType::Aggregation,
            PlanNode::NestedLoopJoin(_) => PlanType::NestedLoopJoin,
            PlanNode::HashJoin(_) => PlanType::HashJoin,
            PlanNode::Window(_) => PlanType::Window,
        }
    }

    pub fn get_output_schema(&self) -> &Schema {
        match self {
            PlanNode::SeqScan(n) => n.get_output_schema(),
            PlanNode::IndexScan(n) => n.get_output_schema(),
            PlanNode::Insert(n) => n.get_output_schema(),
            PlanNode::Update(n) => n.get_output_schema(),
            PlanNode::Delete(n) => n.get_output_schema(),
            PlanNode::Values(n) => n.get_output_schema(),
            PlanNode::Filter(n) => n.get_output_schema(),
            PlanNode::Limit(n) => n.get_output_schema(),
            PlanNode::Sort(n) => n.get_output_schema(),
            PlanNode::TopN(n) => n.get_output_schema(),
            PlanNode::Aggregation(n) => n.get_output_schema(),
            PlanNode::NestedLoopJoin(n) => n.get_output_schema(),
            PlanNode::HashJoin(n) => n.get_output_schema(),
            PlanNode::Window(n) => n.get_output_schema(),
        }
    }

    pub fn get_children(&self) -> &[PlanNodeRef] {
        match self {
            PlanNode::SeqScan(n) => n.get_children(),
            PlanNode::IndexScan(n) => n.get_children(),
            PlanNode::Insert(n) => n.get_children(),
            PlanNode::Update(n) => n.get_children(),
            PlanNode::Delete(n) => n.get_children(),
            PlanNode::Values(n) => n.get_children(),
            PlanNode::Filter(n) => n.get_children(),
            PlanNode::Limit(n) => n.get_children(),
            PlanNode::Sort(n) => n.get_children(),
            PlanNode::TopN(n) => n.get_children(),
            PlanNode::Aggregation(n) => n.get_children(),
            PlanNode::NestedLoopJoin(n) => n.get_children(),
            PlanNode::HashJoin(n) => n.get_children(),
            PlanNode::Window(n) => n.get_children(),
        }
    }

    pub fn get_child_at(&self, idx: usize) -> &PlanNodeRef {
        &self.get_children()[idx]
    }

    /// Rebuilds this node over a new child list; used by the optimizer's
    /// bottom-up rewrites.
    pub fn clone_with_children(&self, children: Vec<PlanNodeRef>) -> PlanNode {
        match self {
            PlanNode::SeqScan(n) => PlanNode::SeqScan(n.clone()),
            PlanNode::IndexScan(n) => PlanNode::IndexScan(n.clone()),
            PlanNode::Insert(n) => PlanNode::Insert(n.with_children(children)),
            PlanNode::Update(n) => PlanNode::Update(n.with_children(children)),
            PlanNode::Delete(n) => PlanNode::Delete(n.with_children(children)),
            PlanNode::Values(n) => PlanNode::Values(n.clone()),
            PlanNode::Filter(n) => PlanNode::Filter(n.with_children(children)),
            PlanNode::Limit(n) => PlanNode::Limit(n.with_children(children)),
            PlanNode::Sort(n) => PlanNode::Sort(n.with_children(children)),
            PlanNode::TopN(n) => PlanNode::TopN(n.with_children(children)),
            PlanNode::Aggregation(n) => PlanNode::Aggregation(n.with_children(children)),
            PlanNode::NestedLoopJoin(n) => PlanNode::NestedLoopJoin(n.with_children(children)),
            PlanNode::HashJoin(n) => PlanNode::HashJoin(n.with_children(children)),
            PlanNode::Window(n) => PlanNode::Window(n.with_children(children)),
        }
    }
}
