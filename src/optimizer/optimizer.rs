//! Plan rewrites, applied bottom-up by cloning each node with optimized
//! children:
//!
//! - sequential scan with a `column = constant` predicate becomes an index
//!   scan when a single-key index covers that column;
//! - `Limit` directly over `Sort` becomes `TopN`;
//! - a nested loop join whose predicate is a conjunction of column-column
//!   equalities becomes a hash join.

use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::catalog::catalog::Catalog;
use crate::execution::expressions::abstract_expression::{Expression, ExpressionRef};
use crate::execution::expressions::comparison_expression::ComparisonType;
use crate::execution::expressions::logic_expression::LogicType;
use crate::execution::plans::abstract_plan::{PlanNode, PlanNodeRef, PlanType};
use crate::execution::plans::hash_join_plan::HashJoinPlanNode;
use crate::execution::plans::index_scan_plan::IndexScanPlanNode;
use crate::execution::plans::topn_plan::TopNPlanNode;

pub struct Optimizer {
    catalog: Arc<RwLock<Catalog>>,
}

impl Optimizer {
    pub fn new(catalog: Arc<RwLock<Catalog>>) -> Self {
        Self { catalog }
    }

    pub fn optimize(&self, plan: PlanNodeRef) -> PlanNodeRef {
        let plan = self.optimize_seq_scan_as_index_scan(plan);
        let plan = self.optimize_nlj_as_hash_join(plan);
        self.optimize_sort_limit_as_topn(plan)
    }

    fn optimize_children(
        &self,
        plan: &PlanNodeRef,
        rule: &dyn Fn(&Self, PlanNodeRef) -> PlanNodeRef,
    ) -> PlanNodeRef {
        let children: Vec<PlanNodeRef> = plan
            .get_children()
            .iter()
            .map(|child| rule(self, Arc::clone(child)))
            .collect();
        Arc::new(plan.clone_with_children(children))
    }

    /// SeqScan(col = const) -> IndexScan when an index keyed exactly on that
    /// column exists.
    pub fn optimize_seq_scan_as_index_scan(&self, plan: PlanNodeRef) -> PlanNodeRef {
        let optimized =
            self.optimize_children(&plan, &Self::optimize_seq_scan_as_index_scan_ref);

        let PlanNode::SeqScan(seq_scan) = optimized.as_ref() else {
            return optimized;
        };
        let Some(predicate) = seq_scan.get_filter_predicate() else {
            return optimized;
        };
        let Expression::Comparison(cmp) = predicate.as_ref() else {
            return optimized;
        };
        if cmp.get_comp_type() != ComparisonType::Equal {
            return optimized;
        }
        let Expression::ColumnValue(col_expr) = cmp.get_left().as_ref() else {
            return optimized;
        };
        let Expression::Constant(const_expr) = cmp.get_right().as_ref() else {
            return optimized;
        };

        let catalog = self.catalog.read();
        let Some(table_info) = catalog.get_table(seq_scan.get_table_oid()) else {
            return optimized;
        };
        for index_info in catalog.get_table_indexes(table_info.get_name()) {
            let key_attrs = index_info.get_key_attrs();
            if key_attrs.len() != 1 || key_attrs[0] != col_expr.get_col_idx() {
                continue;
            }
            debug!(
                "rewriting seq scan of '{}' to index scan over '{}'",
                table_info.get_name(),
                index_info.get_name()
            );
            return Arc::new(PlanNode::IndexScan(IndexScanPlanNode::new(
                seq_scan.get_output_schema().clone(),
                seq_scan.get_table_oid(),
                index_info.get_index_oid(),
                Some(Arc::clone(predicate)),
                const_expr.clone(),
            )));
        }
        optimized
    }

    fn optimize_seq_scan_as_index_scan_ref(&self, plan: PlanNodeRef) -> PlanNodeRef {
        self.optimize_seq_scan_as_index_scan(plan)
    }

    /// Limit(Sort(child)) -> TopN(child).
    pub fn optimize_sort_limit_as_topn(&self, plan: PlanNodeRef) -> PlanNodeRef {
        let optimized = self.optimize_children(&plan, &Self::optimize_sort_limit_as_topn_ref);

        let PlanNode::Limit(limit_plan) = optimized.as_ref() else {
            return optimized;
        };
        let PlanNode::Sort(sort_plan) = limit_plan.get_child_plan().as_ref() else {
            return optimized;
        };

        debug!(
            "rewriting limit({}) over sort to top-n",
            limit_plan.get_limit()
        );
        Arc::new(PlanNode::TopN(TopNPlanNode::new(
            limit_plan.get_output_schema().clone(),
            sort_plan.get_order_bys().to_vec(),
            limit_plan.get_limit(),
            Arc::clone(sort_plan.get_child_plan()),
        )))
    }

    fn optimize_sort_limit_as_topn_ref(&self, plan: PlanNodeRef) -> PlanNodeRef {
        self.optimize_sort_limit_as_topn(plan)
    }

    /// NestedLoopJoin with a conjunction of column-column equalities ->
    /// HashJoin with the extracted key lists.
    pub fn optimize_nlj_as_hash_join(&self, plan: PlanNodeRef) -> PlanNodeRef {
        let optimized = self.optimize_children(&plan, &Self::optimize_nlj_as_hash_join_ref);

        if optimized.get_type() != PlanType::NestedLoopJoin {
            return optimized;
        }
        let PlanNode::NestedLoopJoin(nlj_plan) = optimized.as_ref() else {
            return optimized;
        };

        let mut left_exprs = Vec::new();
        let mut right_exprs = Vec::new();
        if !extract_equi_keys(nlj_plan.get_predicate(), &mut left_exprs, &mut right_exprs) {
            return optimized;
        }

        debug!("rewriting nested loop join to hash join ({} key(s))", left_exprs.len());
        Arc::new(PlanNode::HashJoin(HashJoinPlanNode::new(
            nlj_plan.get_output_schema().clone(),
            Arc::clone(nlj_plan.get_left_plan()),
            Arc::clone(nlj_plan.get_right_plan()),
            left_exprs,
            right_exprs,
            nlj_plan.get_join_type(),
        )))
    }

    fn optimize_nlj_as_hash_join_ref(&self, plan: PlanNodeRef) -> PlanNodeRef {
        self.optimize_nlj_as_hash_join(plan)
    }
}

/// Walks a predicate tree of ANDs over column-column equalities, sorting
/// each equality's sides into left-keys and right-keys by tuple index.
/// Returns false for any other shape.
fn extract_equi_keys(
    expr: &ExpressionRef,
    left_exprs: &mut Vec<ExpressionRef>,
    right_exprs: &mut Vec<ExpressionRef>,
) -> bool {
    match expr.as_ref() {
        Expression::Comparison(cmp) => {
            if cmp.get_comp_type() != ComparisonType::Equal {
                return false;
            }
            let (Expression::ColumnValue(lhs), Expression::ColumnValue(rhs)) =
                (cmp.get_left().as_ref(), cmp.get_right().as_ref())
            else {
                return false;
            };

            if lhs.get_tuple_idx() == 0 {
                left_exprs.push(Arc::clone(cmp.get_left()));
            } else {
                right_exprs.push(Arc::clone(cmp.get_left()));
            }
            if rhs.get_tuple_idx() == 0 {
                left_exprs.push(Arc::clone(cmp.get_right()));
            } else {
                right_exprs.push(Arc::clone(cmp.get_right()));
            }
            true
        }
        Expression::Logic(logic) => {
            logic.get_logic_type() == LogicType::And
                && extract_equi_keys(logic.get_left(), left_exprs, right_exprs)
                && extract_equi_keys(logic.get_right(), left_exprs, right_exprs)
        }
        _ => false,
    }
}
