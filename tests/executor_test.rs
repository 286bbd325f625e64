//! End-to-end executor tests: plans built by hand, executed through the
//! execution engine under real transactions.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use quilldb::buffer::buffer_pool_manager::BufferPoolManager;
use quilldb::catalog::catalog::{Catalog, TableInfo};
use quilldb::catalog::column::Column;
use quilldb::catalog::schema::Schema;
use quilldb::common::logger::initialize_logger;
use quilldb::concurrency::transaction::{IsolationLevel, Transaction};
use quilldb::concurrency::transaction_manager::TransactionManager;
use quilldb::execution::execution_engine::ExecutionEngine;
use quilldb::execution::executor_context::ExecutorContext;
use quilldb::execution::expressions::abstract_expression::{Expression, ExpressionRef};
use quilldb::execution::expressions::column_value_expression::ColumnValueExpression;
use quilldb::execution::expressions::comparison_expression::{
    ComparisonExpression, ComparisonType,
};
use quilldb::execution::expressions::constant_value_expression::ConstantValueExpression;
use quilldb::execution::plans::abstract_plan::{JoinType, OrderByType, PlanNode, PlanNodeRef};
use quilldb::execution::plans::aggregation_plan::{AggregationPlanNode, AggregationType};
use quilldb::execution::plans::filter_plan::FilterPlanNode;
use quilldb::execution::plans::hash_join_plan::HashJoinPlanNode;
use quilldb::execution::plans::insert_plan::InsertPlanNode;
use quilldb::execution::plans::limit_plan::LimitPlanNode;
use quilldb::execution::plans::nested_loop_join_plan::NestedLoopJoinPlanNode;
use quilldb::execution::plans::seq_scan_plan::SeqScanPlanNode;
use quilldb::execution::plans::sort_plan::SortPlanNode;
use quilldb::execution::plans::topn_plan::TopNPlanNode;
use quilldb::execution::plans::update_plan::UpdatePlanNode;
use quilldb::execution::plans::values_plan::ValuesPlanNode;
use quilldb::execution::plans::window_plan::{WindowFunction, WindowFunctionType, WindowPlanNode};
use quilldb::storage::disk::disk_manager::MemoryDiskManager;
use quilldb::storage::disk::disk_scheduler::DiskScheduler;
use quilldb::storage::table::tuple::Tuple;
use quilldb::types::type_id::TypeId;
use quilldb::types::value::Value;

struct TestContext {
    bpm: Arc<BufferPoolManager>,
    catalog: Arc<RwLock<Catalog>>,
    txn_mgr: Arc<TransactionManager>,
}

impl TestContext {
    fn new() -> Self {
        initialize_logger();
        let disk_manager = Arc::new(MemoryDiskManager::new());
        let scheduler = Arc::new(DiskScheduler::new(disk_manager));
        let bpm = Arc::new(BufferPoolManager::new(128, scheduler, 2));
        let catalog = Arc::new(RwLock::new(Catalog::new(Arc::clone(&bpm))));
        let txn_mgr = Arc::new(TransactionManager::new(Arc::clone(&catalog)));
        Self {
            bpm,
            catalog,
            txn_mgr,
        }
    }

    fn exec_ctx(&self, txn: &Arc<Transaction>) -> Arc<ExecutorContext> {
        Arc::new(ExecutorContext::new(
            Arc::clone(&self.bpm),
            Arc::clone(&self.catalog),
            Arc::clone(txn),
            Arc::clone(&self.txn_mgr),
        ))
    }

    fn create_table(&self, name: &str, schema: Schema) -> Arc<TableInfo> {
        self.catalog.write().create_table(name, schema).unwrap()
    }

    fn begin(&self) -> Arc<Transaction> {
        self.txn_mgr.begin(IsolationLevel::SnapshotIsolation)
    }
}

fn two_int_schema() -> Schema {
    Schema::new(vec![
        Column::new("a", TypeId::Integer),
        Column::new("b", TypeId::Integer),
    ])
}

fn count_schema() -> Schema {
    Schema::new(vec![Column::new("count", TypeId::Integer)])
}

fn col(tuple_idx: usize, col_idx: usize) -> ExpressionRef {
    Arc::new(Expression::ColumnValue(ColumnValueExpression::new(
        tuple_idx, col_idx,
    )))
}

fn constant(v: i32) -> ExpressionRef {
    Arc::new(Expression::Constant(ConstantValueExpression::new(
        Value::new(v),
    )))
}

fn eq(left: ExpressionRef, right: ExpressionRef) -> ExpressionRef {
    Arc::new(Expression::Comparison(ComparisonExpression::new(
        ComparisonType::Equal,
        left,
        right,
    )))
}

fn values_plan(schema: Schema, rows: &[&[i32]]) -> PlanNodeRef {
    let values = rows
        .iter()
        .map(|row| row.iter().map(|v| constant(*v)).collect())
        .collect();
    Arc::new(PlanNode::Values(ValuesPlanNode::new(schema, values)))
}

/// Inserts `rows` into `table` under `txn` (left running).
fn insert_rows(ctx: &TestContext, txn: &Arc<Transaction>, table: &Arc<TableInfo>, rows: &[&[i32]]) {
    let child = values_plan(table.get_schema().clone(), rows);
    let plan = Arc::new(PlanNode::Insert(InsertPlanNode::new(
        count_schema(),
        table.get_table_oid(),
        child,
    )));
    let result = ExecutionEngine::execute(ctx.exec_ctx(txn), plan).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].get_value(0), &Value::new(rows.len() as i32));
}

fn seq_scan_plan(table: &Arc<TableInfo>, predicate: Option<ExpressionRef>) -> PlanNodeRef {
    Arc::new(PlanNode::SeqScan(SeqScanPlanNode::new(
        table.get_schema().clone(),
        table.get_table_oid(),
        table.get_name(),
        predicate,
    )))
}

fn scan_all(ctx: &TestContext, txn: &Arc<Transaction>, table: &Arc<TableInfo>) -> Vec<Tuple> {
    ExecutionEngine::execute(ctx.exec_ctx(txn), seq_scan_plan(table, None)).unwrap()
}

fn int_at(tuple: &Tuple, idx: usize) -> i32 {
    tuple.get_value(idx).as_i64().unwrap() as i32
}

#[test]
fn test_insert_then_scan() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[2, 20], &[3, 30]]);
    assert!(ctx.txn_mgr.commit(&txn));

    let reader = ctx.begin();
    let mut rows: Vec<(i32, i32)> = scan_all(&ctx, &reader, &table)
        .iter()
        .map(|t| (int_at(t, 0), int_at(t, 1)))
        .collect();
    rows.sort();
    assert_eq!(rows, vec![(1, 10), (2, 20), (3, 30)]);
}

#[test]
fn test_seq_scan_predicate_pushdown() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[2, 20], &[3, 30]]);
    ctx.txn_mgr.commit(&txn);

    let reader = ctx.begin();
    let predicate = eq(col(0, 0), constant(2));
    let rows =
        ExecutionEngine::execute(ctx.exec_ctx(&reader), seq_scan_plan(&table, Some(predicate)))
            .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(int_at(&rows[0], 1), 20);
}

#[test]
fn test_update_rewrites_rows() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[2, 20]]);
    ctx.txn_mgr.commit(&txn);

    // SET b = 99 for every row.
    let writer = ctx.begin();
    let update_plan = Arc::new(PlanNode::Update(UpdatePlanNode::new(
        count_schema(),
        table.get_table_oid(),
        vec![col(0, 0), constant(99)],
        seq_scan_plan(&table, None),
    )));
    let result = ExecutionEngine::execute(ctx.exec_ctx(&writer), update_plan).unwrap();
    assert_eq!(int_at(&result[0], 0), 2);

    // The writer sees its own updates before commit.
    let rows = scan_all(&ctx, &writer, &table);
    assert!(rows.iter().all(|t| int_at(t, 1) == 99));
    ctx.txn_mgr.commit(&writer);
}

#[test]
fn test_aggregation_with_group_by() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(
        &ctx,
        &txn,
        &table,
        &[&[1, 10], &[1, 20], &[2, 5], &[2, 7], &[2, 9]],
    );
    ctx.txn_mgr.commit(&txn);

    let agg_schema = Schema::new(vec![
        Column::new("a", TypeId::Integer),
        Column::new("count_star", TypeId::Integer),
        Column::new("sum_b", TypeId::Integer),
        Column::new("min_b", TypeId::Integer),
        Column::new("max_b", TypeId::Integer),
    ]);
    let plan = Arc::new(PlanNode::Aggregation(AggregationPlanNode::new(
        agg_schema,
        vec![col(0, 0)],
        vec![col(0, 1), col(0, 1), col(0, 1), col(0, 1)],
        vec![
            AggregationType::CountStar,
            AggregationType::Sum,
            AggregationType::Min,
            AggregationType::Max,
        ],
        seq_scan_plan(&table, None),
    )));

    let reader = ctx.begin();
    let mut rows: Vec<(i32, i32, i32, i32, i32)> =
        ExecutionEngine::execute(ctx.exec_ctx(&reader), plan)
            .unwrap()
            .iter()
            .map(|t| {
                (
                    int_at(t, 0),
                    int_at(t, 1),
                    int_at(t, 2),
                    int_at(t, 3),
                    int_at(t, 4),
                )
            })
            .collect();
    rows.sort();
    assert_eq!(rows, vec![(1, 2, 30, 10, 20), (2, 3, 21, 5, 9)]);
}

#[test]
fn test_aggregation_empty_input_without_group_by() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let agg_schema = Schema::new(vec![
        Column::new("count_star", TypeId::Integer),
        Column::new("sum_b", TypeId::Integer),
    ]);
    let plan = Arc::new(PlanNode::Aggregation(AggregationPlanNode::new(
        agg_schema,
        vec![],
        vec![col(0, 1), col(0, 1)],
        vec![AggregationType::CountStar, AggregationType::Sum],
        seq_scan_plan(&table, None),
    )));

    let reader = ctx.begin();
    let rows = ExecutionEngine::execute(ctx.exec_ctx(&reader), plan).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(int_at(&rows[0], 0), 0);
    assert!(rows[0].get_value(1).is_null());
}

#[test]
fn test_sort_topn_limit_agree() {
    let ctx = TestContext::new();
    let schema = Schema::new(vec![Column::new("v", TypeId::Integer)]);
    let table = ctx.create_table("t", schema.clone());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[5], &[2], &[8], &[1], &[9], &[3]]);
    ctx.txn_mgr.commit(&txn);

    let order_asc = vec![(OrderByType::Asc, col(0, 0))];
    let reader = ctx.begin();

    // Limit(3, Sort(ASC)).
    let sort = Arc::new(PlanNode::Sort(SortPlanNode::new(
        schema.clone(),
        order_asc.clone(),
        seq_scan_plan(&table, None),
    )));
    let limit = Arc::new(PlanNode::Limit(LimitPlanNode::new(schema.clone(), 3, sort)));
    let limit_rows: Vec<i32> = ExecutionEngine::execute(ctx.exec_ctx(&reader), limit)
        .unwrap()
        .iter()
        .map(|t| int_at(t, 0))
        .collect();
    assert_eq!(limit_rows, vec![1, 2, 3]);

    // TopN(3, ASC) produces the same rows.
    let topn = Arc::new(PlanNode::TopN(TopNPlanNode::new(
        schema.clone(),
        order_asc,
        3,
        seq_scan_plan(&table, None),
    )));
    let topn_rows: Vec<i32> = ExecutionEngine::execute(ctx.exec_ctx(&reader), topn)
        .unwrap()
        .iter()
        .map(|t| int_at(t, 0))
        .collect();
    assert_eq!(topn_rows, vec![1, 2, 3]);

    // TopN(2, DESC).
    let topn_desc = Arc::new(PlanNode::TopN(TopNPlanNode::new(
        schema.clone(),
        vec![(OrderByType::Desc, col(0, 0))],
        2,
        seq_scan_plan(&table, None),
    )));
    let desc_rows: Vec<i32> = ExecutionEngine::execute(ctx.exec_ctx(&reader), topn_desc)
        .unwrap()
        .iter()
        .map(|t| int_at(t, 0))
        .collect();
    assert_eq!(desc_rows, vec![9, 8]);
}

fn join_output_schema() -> Schema {
    Schema::new(vec![
        Column::new("l_a", TypeId::Integer),
        Column::new("l_b", TypeId::Integer),
        Column::new("r_a", TypeId::Integer),
        Column::new("r_b", TypeId::Integer),
    ])
}

#[test]
fn test_nested_loop_join_inner_and_left() {
    let ctx = TestContext::new();
    let left = ctx.create_table("l", two_int_schema());
    let right = ctx.create_table("r", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &left, &[&[1, 100], &[2, 200], &[3, 300]]);
    insert_rows(&ctx, &txn, &right, &[&[1, 11], &[2, 22], &[2, 23]]);
    ctx.txn_mgr.commit(&txn);

    let reader = ctx.begin();
    let predicate = eq(col(0, 0), col(1, 0));

    let inner = Arc::new(PlanNode::NestedLoopJoin(NestedLoopJoinPlanNode::new(
        join_output_schema(),
        seq_scan_plan(&left, None),
        seq_scan_plan(&right, None),
        predicate.clone(),
        JoinType::Inner,
    )));
    let mut inner_rows: Vec<(i32, i32)> = ExecutionEngine::execute(ctx.exec_ctx(&reader), inner)
        .unwrap()
        .iter()
        .map(|t| (int_at(t, 0), int_at(t, 3)))
        .collect();
    inner_rows.sort();
    assert_eq!(inner_rows, vec![(1, 11), (2, 22), (2, 23)]);

    let left_join = Arc::new(PlanNode::NestedLoopJoin(NestedLoopJoinPlanNode::new(
        join_output_schema(),
        seq_scan_plan(&left, None),
        seq_scan_plan(&right, None),
        predicate,
        JoinType::Left,
    )));
    let rows = ExecutionEngine::execute(ctx.exec_ctx(&reader), left_join).unwrap();
    assert_eq!(rows.len(), 4);
    // The unmatched left row (a = 3) pads the right side with NULLs.
    let unmatched: Vec<&Tuple> = rows.iter().filter(|t| int_at(t, 0) == 3).collect();
    assert_eq!(unmatched.len(), 1);
    assert!(unmatched[0].get_value(2).is_null());
    assert!(unmatched[0].get_value(3).is_null());
}

#[test]
fn test_filter_over_scan() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[2, 20], &[3, 30]]);
    ctx.txn_mgr.commit(&txn);

    let reader = ctx.begin();
    let plan = Arc::new(PlanNode::Filter(FilterPlanNode::new(
        table.get_schema().clone(),
        eq(col(0, 0), constant(3)),
        seq_scan_plan(&table, None),
    )));
    let rows = ExecutionEngine::execute(ctx.exec_ctx(&reader), plan).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(int_at(&rows[0], 1), 30);
}

#[test]
fn test_hash_join_left_outer() {
    let ctx = TestContext::new();
    let left = ctx.create_table("l", two_int_schema());
    let right = ctx.create_table("r", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &left, &[&[1, 100], &[2, 200], &[4, 400]]);
    insert_rows(&ctx, &txn, &right, &[&[1, 11], &[2, 22], &[3, 33]]);
    ctx.txn_mgr.commit(&txn);

    let reader = ctx.begin();
    let hash_join = Arc::new(PlanNode::HashJoin(HashJoinPlanNode::new(
        join_output_schema(),
        seq_scan_plan(&left, None),
        seq_scan_plan(&right, None),
        vec![col(0, 0)],
        vec![col(1, 0)],
        JoinType::Left,
    )));
    let mut hash_rows: Vec<(i32, Option<i32>)> =
        ExecutionEngine::execute(ctx.exec_ctx(&reader), hash_join)
            .unwrap()
            .iter()
            .map(|t| {
                let r = t.get_value(3);
                (int_at(t, 0), r.as_i64().map(|v| v as i32))
            })
            .collect();
    hash_rows.sort();
    assert_eq!(
        hash_rows,
        vec![(1, Some(11)), (2, Some(22)), (4, None)]
    );
}

#[test]
fn test_window_rank_with_ties() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    // Scores with a tie at 20.
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[2, 20], &[3, 20], &[4, 30]]);
    ctx.txn_mgr.commit(&txn);

    let window_schema = Schema::new(vec![
        Column::new("b", TypeId::Integer),
        Column::new("rank", TypeId::Integer),
    ]);
    let mut window_functions = HashMap::new();
    window_functions.insert(
        1,
        WindowFunction {
            function: col(0, 1),
            win_type: WindowFunctionType::Rank,
            partition_by: vec![],
            order_by: vec![(OrderByType::Asc, col(0, 1))],
        },
    );
    let plan = Arc::new(PlanNode::Window(WindowPlanNode::new(
        window_schema,
        vec![col(0, 1), col(0, 1)],
        window_functions,
        seq_scan_plan(&table, None),
    )));

    let reader = ctx.begin();
    let rows: Vec<(i32, i32)> = ExecutionEngine::execute(ctx.exec_ctx(&reader), plan)
        .unwrap()
        .iter()
        .map(|t| (int_at(t, 0), int_at(t, 1)))
        .collect();
    assert_eq!(rows, vec![(10, 1), (20, 2), (20, 2), (30, 4)]);
}

#[test]
fn test_window_partition_aggregate_without_order_by() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t", two_int_schema());

    let txn = ctx.begin();
    insert_rows(&ctx, &txn, &table, &[&[1, 10], &[1, 20], &[2, 5]]);
    ctx.txn_mgr.commit(&txn);

    let window_schema = Schema::new(vec![
        Column::new("a", TypeId::Integer),
        Column::new("sum_b", TypeId::Integer),
    ]);
    let mut window_functions = HashMap::new();
    window_functions.insert(
        1,
        WindowFunction {
            function: col(0, 1),
            win_type: WindowFunctionType::Sum,
            partition_by: vec![col(0, 0)],
            order_by: vec![],
        },
    );
    let plan = Arc::new(PlanNode::Window(WindowPlanNode::new(
        window_schema,
        vec![col(0, 0), col(0, 1)],
        window_functions,
        seq_scan_plan(&table, None),
    )));

    let reader = ctx.begin();
    let mut rows: Vec<(i32, i32)> = ExecutionEngine::execute(ctx.exec_ctx(&reader), plan)
        .unwrap()
        .iter()
        .map(|t| (int_at(t, 0), int_at(t, 1)))
        .collect();
    rows.sort();
    // Every row observes its whole partition's sum.
    assert_eq!(rows, vec![(1, 30), (1, 30), (2, 5)]);
}
