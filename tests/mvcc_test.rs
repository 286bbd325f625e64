//! Snapshot isolation scenarios: visibility across concurrent transactions,
//! write-write conflicts, undo-chain reconstruction, watermark movement, and
//! garbage collection.

use std::sync::Arc;

use parking_lot::RwLock;

use quilldb::buffer::buffer_pool_manager::BufferPoolManager;
use quilldb::catalog::catalog::{Catalog, TableInfo};
use quilldb::catalog::column::Column;
use quilldb::catalog::schema::Schema;
use quilldb::common::exception::DBError;
use quilldb::common::logger::initialize_logger;
use quilldb::concurrency::transaction::{IsolationLevel, Transaction, TransactionState};
use quilldb::concurrency::transaction_manager::TransactionManager;
use quilldb::execution::execution_engine::ExecutionEngine;
use quilldb::execution::executor_context::ExecutorContext;
use quilldb::execution::expressions::abstract_expression::{Expression, ExpressionRef};
use quilldb::execution::expressions::column_value_expression::ColumnValueExpression;
use quilldb::execution::expressions::comparison_expression::{
    ComparisonExpression, ComparisonType,
};
use quilldb::execution::expressions::constant_value_expression::ConstantValueExpression;
use quilldb::execution::plans::abstract_plan::{PlanNode, PlanNodeRef};
use quilldb::execution::plans::delete_plan::DeletePlanNode;
use quilldb::execution::plans::insert_plan::InsertPlanNode;
use quilldb::execution::plans::seq_scan_plan::SeqScanPlanNode;
use quilldb::execution::plans::update_plan::UpdatePlanNode;
use quilldb::execution::plans::values_plan::ValuesPlanNode;
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
        let bpm = Arc::new(BufferPoolManager::new(64, scheduler, 2));
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

    fn create_table(&self, name: &str) -> Arc<TableInfo> {
        let schema = Schema::new(vec![
            Column::new("id", TypeId::Integer),
            Column::new("v", TypeId::Integer),
        ]);
        self.catalog.write().create_table(name, schema).unwrap()
    }

    fn begin(&self) -> Arc<Transaction> {
        self.txn_mgr.begin(IsolationLevel::SnapshotIsolation)
    }
}

fn col(col_idx: usize) -> ExpressionRef {
    Arc::new(Expression::ColumnValue(ColumnValueExpression::new(
        0, col_idx,
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

fn count_schema() -> Schema {
    Schema::new(vec![Column::new("count", TypeId::Integer)])
}

fn seq_scan_plan(table: &Arc<TableInfo>, predicate: Option<ExpressionRef>) -> PlanNodeRef {
    Arc::new(PlanNode::SeqScan(SeqScanPlanNode::new(
        table.get_schema().clone(),
        table.get_table_oid(),
        table.get_name(),
        predicate,
    )))
}

fn insert(ctx: &TestContext, txn: &Arc<Transaction>, table: &Arc<TableInfo>, rows: &[(i32, i32)]) {
    let values = rows
        .iter()
        .map(|(a, b)| vec![constant(*a), constant(*b)])
        .collect();
    let child = Arc::new(PlanNode::Values(ValuesPlanNode::new(
        table.get_schema().clone(),
        values,
    )));
    let plan = Arc::new(PlanNode::Insert(InsertPlanNode::new(
        count_schema(),
        table.get_table_oid(),
        child,
    )));
    ExecutionEngine::execute(ctx.exec_ctx(txn), plan).unwrap();
}

/// UPDATE t SET v = <new_v> WHERE id = <id>.
fn update_v(
    ctx: &TestContext,
    txn: &Arc<Transaction>,
    table: &Arc<TableInfo>,
    id: i32,
    new_v: i32,
) -> Result<Vec<Tuple>, DBError> {
    let scan = seq_scan_plan(table, Some(eq(col(0), constant(id))));
    let plan = Arc::new(PlanNode::Update(UpdatePlanNode::new(
        count_schema(),
        table.get_table_oid(),
        vec![col(0), constant(new_v)],
        scan,
    )));
    ExecutionEngine::execute(ctx.exec_ctx(txn), plan)
}

fn delete_id(
    ctx: &TestContext,
    txn: &Arc<Transaction>,
    table: &Arc<TableInfo>,
    id: i32,
) -> Result<Vec<Tuple>, DBError> {
    let scan = seq_scan_plan(table, Some(eq(col(0), constant(id))));
    let plan = Arc::new(PlanNode::Delete(DeletePlanNode::new(
        count_schema(),
        table.get_table_oid(),
        scan,
    )));
    ExecutionEngine::execute(ctx.exec_ctx(txn), plan)
}

fn scan(ctx: &TestContext, txn: &Arc<Transaction>, table: &Arc<TableInfo>) -> Vec<(i32, i32)> {
    let mut rows: Vec<(i32, i32)> =
        ExecutionEngine::execute(ctx.exec_ctx(txn), seq_scan_plan(table, None))
            .unwrap()
            .iter()
            .map(|t| {
                (
                    t.get_value(0).as_i64().unwrap() as i32,
                    t.get_value(1).as_i64().unwrap() as i32,
                )
            })
            .collect();
    rows.sort();
    rows
}

#[test]
fn test_snapshot_isolation_insert_visibility() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let t1 = ctx.begin();
    let t2 = ctx.begin();
    assert_eq!(t1.get_read_ts(), 0);
    assert_eq!(t2.get_read_ts(), 0);

    insert(&ctx, &t2, &table, &[(1, 100)]);
    assert!(ctx.txn_mgr.commit(&t2));
    assert_eq!(t2.get_commit_ts(), 1);

    // T1 began before T2 committed: its snapshot holds zero rows.
    assert_eq!(scan(&ctx, &t1, &table), vec![]);

    // A fresh transaction sees the committed row.
    let t3 = ctx.begin();
    assert_eq!(t3.get_read_ts(), 1);
    assert_eq!(scan(&ctx, &t3, &table), vec![(1, 100)]);
}

#[test]
fn test_old_snapshot_reads_through_undo_chain() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let setup = ctx.begin();
    insert(&ctx, &setup, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&setup);

    let old_reader = ctx.begin();

    let writer = ctx.begin();
    update_v(&ctx, &writer, &table, 1, 200).unwrap();
    ctx.txn_mgr.commit(&writer);

    // The old reader reconstructs the pre-update version from the undo log.
    assert_eq!(scan(&ctx, &old_reader, &table), vec![(1, 100)]);
    let new_reader = ctx.begin();
    assert_eq!(scan(&ctx, &new_reader, &table), vec![(1, 200)]);
}

#[test]
fn test_write_write_conflict_taints_transaction() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let setup = ctx.begin();
    insert(&ctx, &setup, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&setup);

    let t1 = ctx.begin();
    let t2 = ctx.begin();

    update_v(&ctx, &t1, &table, 1, 200).unwrap();
    ctx.txn_mgr.commit(&t1);

    // T2 started before T1 committed; its update must conflict.
    let result = update_v(&ctx, &t2, &table, 1, 300);
    assert!(matches!(result, Err(DBError::WriteWriteConflict { .. })));
    assert_eq!(t2.get_state(), TransactionState::Tainted);

    // A tainted transaction refuses further writes; only abort is legal.
    let again = update_v(&ctx, &t2, &table, 1, 400);
    assert!(matches!(again, Err(DBError::TxnTainted(_))));
    ctx.txn_mgr.abort(&t2);
    assert_eq!(t2.get_state(), TransactionState::Aborted);

    // T1's update survives.
    let reader = ctx.begin();
    assert_eq!(scan(&ctx, &reader, &table), vec![(1, 200)]);
}

#[test]
fn test_conflict_with_uncommitted_writer() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let setup = ctx.begin();
    insert(&ctx, &setup, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&setup);

    let t1 = ctx.begin();
    let t2 = ctx.begin();
    update_v(&ctx, &t1, &table, 1, 200).unwrap();

    // T1 still running: its temporary timestamp is newer than T2's snapshot.
    let result = update_v(&ctx, &t2, &table, 1, 300);
    assert!(matches!(result, Err(DBError::WriteWriteConflict { .. })));
    ctx.txn_mgr.abort(&t2);
    ctx.txn_mgr.commit(&t1);
}

#[test]
fn test_delete_visibility_across_snapshots() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let setup = ctx.begin();
    insert(&ctx, &setup, &table, &[(1, 100), (2, 200)]);
    ctx.txn_mgr.commit(&setup);

    let old_reader = ctx.begin();

    let deleter = ctx.begin();
    let result = delete_id(&ctx, &deleter, &table, 1).unwrap();
    assert_eq!(result[0].get_value(0), &Value::new(1));
    // The deleter no longer sees the row.
    assert_eq!(scan(&ctx, &deleter, &table), vec![(2, 200)]);
    ctx.txn_mgr.commit(&deleter);

    // The old snapshot still reconstructs the deleted row.
    assert_eq!(scan(&ctx, &old_reader, &table), vec![(1, 100), (2, 200)]);
    let new_reader = ctx.begin();
    assert_eq!(scan(&ctx, &new_reader, &table), vec![(2, 200)]);
}

#[test]
fn test_self_update_covers_undo_log() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let setup = ctx.begin();
    insert(&ctx, &setup, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&setup);

    let old_reader = ctx.begin();

    // Two updates by the same transaction: the undo log must keep the
    // pre-transaction image, not the intermediate one.
    let writer = ctx.begin();
    update_v(&ctx, &writer, &table, 1, 200).unwrap();
    update_v(&ctx, &writer, &table, 1, 300).unwrap();
    assert_eq!(scan(&ctx, &writer, &table), vec![(1, 300)]);
    ctx.txn_mgr.commit(&writer);

    assert_eq!(scan(&ctx, &old_reader, &table), vec![(1, 100)]);
    let new_reader = ctx.begin();
    assert_eq!(scan(&ctx, &new_reader, &table), vec![(1, 300)]);
}

#[test]
fn test_watermark_tracks_live_transactions() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    assert_eq!(ctx.txn_mgr.get_watermark(), 0);

    let t1 = ctx.begin();
    insert(&ctx, &t1, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&t1);
    assert_eq!(ctx.txn_mgr.get_watermark(), 1);

    // A live reader pins the watermark at its read timestamp.
    let reader = ctx.begin();
    let t2 = ctx.begin();
    update_v(&ctx, &t2, &table, 1, 200).unwrap();
    ctx.txn_mgr.commit(&t2);
    assert_eq!(ctx.txn_mgr.get_watermark(), 1);

    ctx.txn_mgr.abort(&reader);
    assert_eq!(ctx.txn_mgr.get_watermark(), 2);
}

#[test]
fn test_garbage_collection_reclaims_invisible_logs() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let t0 = ctx.begin();
    insert(&ctx, &t0, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&t0);
    let t0_id = t0.get_txn_id();

    let t1 = ctx.begin();
    update_v(&ctx, &t1, &table, 1, 200).unwrap();
    ctx.txn_mgr.commit(&t1);
    let t1_id = t1.get_txn_id();
    assert_eq!(t1.get_undo_log_num(), 1);

    // With no live readers below the latest commit, every undo log is
    // invisible and both finished transactions can be dropped.
    ctx.txn_mgr.garbage_collection();
    assert!(ctx.txn_mgr.get_txn(t0_id).is_none());
    assert!(ctx.txn_mgr.get_txn(t1_id).is_none());

    // The base version is untouched.
    let reader = ctx.begin();
    assert_eq!(scan(&ctx, &reader, &table), vec![(1, 200)]);
}

#[test]
fn test_garbage_collection_spares_reachable_logs() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let t0 = ctx.begin();
    insert(&ctx, &t0, &table, &[(1, 100)]);
    ctx.txn_mgr.commit(&t0);

    // The old reader still needs the pre-update version.
    let old_reader = ctx.begin();

    let t1 = ctx.begin();
    update_v(&ctx, &t1, &table, 1, 200).unwrap();
    ctx.txn_mgr.commit(&t1);
    let t1_id = t1.get_txn_id();

    ctx.txn_mgr.garbage_collection();
    assert!(ctx.txn_mgr.get_txn(t1_id).is_some());
    assert_eq!(scan(&ctx, &old_reader, &table), vec![(1, 100)]);

    // Once the reader finishes, the log becomes reclaimable.
    ctx.txn_mgr.abort(&old_reader);
    ctx.txn_mgr.garbage_collection();
    assert!(ctx.txn_mgr.get_txn(t1_id).is_none());
}

#[test]
#[should_panic(expected = "running state")]
fn test_commit_twice_panics() {
    let ctx = TestContext::new();
    let txn = ctx.begin();
    assert!(ctx.txn_mgr.commit(&txn));
    ctx.txn_mgr.commit(&txn);
}

#[test]
fn test_commit_timestamps_strictly_increase() {
    let ctx = TestContext::new();
    let table = ctx.create_table("t");

    let mut last_commit_ts = 0;
    for i in 0..5 {
        let txn = ctx.begin();
        insert(&ctx, &txn, &table, &[(i, i)]);
        assert!(ctx.txn_mgr.commit(&txn));
        assert!(txn.get_commit_ts() > last_commit_ts);
        last_commit_ts = txn.get_commit_ts();
    }
    assert_eq!(last_commit_ts, 5);
}
