//! Transaction manager: timestamp-ordered snapshot isolation.
//!
//! Commits are totally ordered by `commit_mutex`, so commit timestamps are
//! strictly increasing. A transaction's read timestamp is the last commit
//! timestamp observed at `begin`; its uncommitted writes carry its temporary
//! timestamp (the txn id, drawn from the reserved range above
//! `TXN_START_ID`) until commit restamps them.

use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::catalog::catalog::Catalog;
use crate::common::config::{PageId, SlotId, Timestamp, TxnId, TXN_START_ID};
use crate::common::rid::RID;
use crate::concurrency::transaction::{
    IsolationLevel, Transaction, TransactionState, UndoLink, UndoLog,
};
use crate::concurrency::watermark::Watermark;
use crate::storage::table::tuple::TupleMeta;

/// Per-page map from slot to the head of that tuple's version chain.
struct PageVersionInfo {
    prev_link: HashMap<SlotId, UndoLink>,
}

pub struct TransactionManager {
    next_txn_id: AtomicU64,
    txn_map: RwLock<HashMap<TxnId, Arc<Transaction>>>,
    running_txns: Mutex<Watermark>,
    last_commit_ts: AtomicU64,
    commit_mutex: Mutex<()>,
    catalog: Arc<RwLock<Catalog>>,
    version_info: RwLock<HashMap<PageId, Arc<Mutex<PageVersionInfo>>>>,
}

impl TransactionManager {
    pub fn new(catalog: Arc<RwLock<Catalog>>) -> Self {
        Self {
            next_txn_id: AtomicU64::new(TXN_START_ID),
            txn_map: RwLock::new(HashMap::new()),
            running_txns: Mutex::new(Watermark::new(0)),
            last_commit_ts: AtomicU64::new(0),
            commit_mutex: Mutex::new(()),
            catalog,
            version_info: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_catalog(&self) -> Arc<RwLock<Catalog>> {
        Arc::clone(&self.catalog)
    }

    /// Starts a transaction whose snapshot is the current last commit
    /// timestamp.
    pub fn begin(&self, isolation_level: IsolationLevel) -> Arc<Transaction> {
        let mut txn_map = self.txn_map.write();
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        let txn = Arc::new(Transaction::new(txn_id, isolation_level));
        txn.set_read_ts(self.last_commit_ts.load(Ordering::SeqCst));
        txn_map.insert(txn_id, Arc::clone(&txn));

        self.running_txns.lock().add_txn(txn.get_read_ts());
        debug!(
            "txn{} began at read ts {}",
            txn.txn_id_human_readable(),
            txn.get_read_ts()
        );
        txn
    }

    /// Serializable validation hook. Always accepts; kept as the extension
    /// point the commit path calls for SERIALIZABLE transactions.
    fn verify_txn(&self, _txn: &Transaction) -> bool {
        true
    }

    /// Commits a transaction: restamps every written tuple with the new
    /// commit timestamp and publishes it atomically with respect to other
    /// commits. Panics if the transaction is not RUNNING.
    pub fn commit(&self, txn: &Arc<Transaction>) -> bool {
        let commit_lock = self.commit_mutex.lock();
        let commit_ts = self.last_commit_ts.load(Ordering::SeqCst) + 1;

        if txn.get_state() != TransactionState::Running {
            panic!("txn not in running state");
        }

        if txn.get_isolation_level() == IsolationLevel::Serializable && !self.verify_txn(txn) {
            drop(commit_lock);
            self.abort(txn);
            return false;
        }

        {
            let _txn_map = self.txn_map.write();
            let catalog = self.catalog.read();
            for (table_oid, rids) in txn.get_write_sets() {
                let Some(table_info) = catalog.get_table(table_oid) else {
                    continue;
                };
                let table_heap = table_info.get_table_heap();
                for rid in rids {
                    if let Some((base_meta, base_tuple)) = table_heap.get_tuple(rid) {
                        table_heap.update_tuple_in_place(
                            TupleMeta::new(commit_ts, base_meta.is_deleted()),
                            base_tuple,
                            rid,
                        );
                    }
                }
            }

            self.last_commit_ts.fetch_add(1, Ordering::SeqCst);
            txn.set_commit_ts(commit_ts);
            txn.set_state(TransactionState::Committed);

            let mut running_txns = self.running_txns.lock();
            running_txns.update_commit_ts(commit_ts);
            running_txns.remove_txn(txn.get_read_ts());
        }

        debug!(
            "txn{} committed at ts {}",
            txn.txn_id_human_readable(),
            commit_ts
        );
        true
    }

    /// Aborts a RUNNING or TAINTED transaction. Its undo logs stay in place
    /// until garbage collection reclaims the transaction.
    pub fn abort(&self, txn: &Arc<Transaction>) {
        if txn.get_state() != TransactionState::Running
            && txn.get_state() != TransactionState::Tainted
        {
            panic!("txn not in running / tainted state");
        }

        let _txn_map = self.txn_map.write();
        txn.set_state(TransactionState::Aborted);
        self.running_txns.lock().remove_txn(txn.get_read_ts());
        debug!("txn{} aborted", txn.txn_id_human_readable());
    }

    /// Lowest read timestamp still needed by any live transaction.
    pub fn get_watermark(&self) -> Timestamp {
        self.running_txns.lock().get_watermark()
    }

    pub fn get_last_commit_ts(&self) -> Timestamp {
        self.last_commit_ts.load(Ordering::SeqCst)
    }

    pub fn get_txn(&self, txn_id: TxnId) -> Option<Arc<Transaction>> {
        self.txn_map.read().get(&txn_id).cloned()
    }

    /// Updates the head undo link of a tuple's version chain. `check`, when
    /// given, validates the currently installed link before the swap.
    pub fn update_undo_link(
        &self,
        rid: RID,
        prev_link: Option<UndoLink>,
        check: Option<Box<dyn Fn(Option<UndoLink>) -> bool>>,
    ) -> bool {
        let page_info = {
            let mut version_info = self.version_info.write();
            Arc::clone(
                version_info
                    .entry(rid.get_page_id())
                    .or_insert_with(|| {
                        Arc::new(Mutex::new(PageVersionInfo {
                            prev_link: HashMap::new(),
                        }))
                    }),
            )
        };

        let mut page_info = page_info.lock();
        if let Some(check) = check {
            let current = page_info.prev_link.get(&rid.get_slot_num()).copied();
            if !check(current) {
                return false;
            }
        }
        match prev_link {
            Some(link) => {
                page_info.prev_link.insert(rid.get_slot_num(), link);
            }
            None => {
                page_info.prev_link.remove(&rid.get_slot_num());
            }
        }
        true
    }

    /// Head of the version chain for `rid`, if any.
    pub fn get_undo_link(&self, rid: RID) -> Option<UndoLink> {
        let version_info = self.version_info.read();
        let page_info = version_info.get(&rid.get_page_id())?;
        let page_info = page_info.lock();
        page_info.prev_link.get(&rid.get_slot_num()).copied()
    }

    /// Resolves an undo link against its owning transaction's log buffer.
    /// Returns `None` when the transaction was already garbage collected.
    pub fn get_undo_log_optional(&self, link: UndoLink) -> Option<UndoLog> {
        let txn = self.get_txn(link.prev_txn)?;
        txn.get_undo_log(link.prev_log_idx)
    }

    pub fn get_undo_log(&self, link: UndoLink) -> UndoLog {
        self.get_undo_log_optional(link)
            .unwrap_or_else(|| panic!("undo log {:?} not found", link))
    }

    /// Drops every COMMITTED or ABORTED transaction all of whose undo logs
    /// have become invisible below the watermark.
    ///
    /// A log is invisible once the walk down its RID's version chain has
    /// already produced a version with `ts <= watermark`: no snapshot at or
    /// above the watermark can ever need anything older.
    pub fn garbage_collection(&self) {
        let watermark = self.get_watermark();
        let txns: Vec<(TxnId, Arc<Transaction>)> = {
            let txn_map = self.txn_map.read();
            txn_map.iter().map(|(id, txn)| (*id, Arc::clone(txn))).collect()
        };
        let catalog = self.catalog.read();

        let mut to_remove = Vec::new();
        for (txn_id, txn) in txns {
            let state = txn.get_state();
            if state != TransactionState::Committed && state != TransactionState::Aborted {
                continue;
            }

            let undo_log_num = txn.get_undo_log_num();
            let mut invisible = 0usize;
            for (table_oid, rids) in txn.get_write_sets() {
                let Some(table_info) = catalog.get_table(table_oid) else {
                    continue;
                };
                let table_heap = table_info.get_table_heap();
                for rid in rids {
                    let mut found_visible = table_heap
                        .get_tuple_meta(rid)
                        .map(|meta| meta.ts() <= watermark)
                        .unwrap_or(false);

                    let mut link = self.get_undo_link(rid);
                    while let Some(current) = link.filter(UndoLink::is_valid) {
                        let Some(undo_log) = self.get_undo_log_optional(current) else {
                            break;
                        };
                        if undo_log.ts <= watermark {
                            if !found_visible {
                                found_visible = true;
                            } else if current.prev_txn == txn_id {
                                invisible += 1;
                                break;
                            }
                        }
                        link = Some(undo_log.prev_version);
                    }
                }
            }

            if invisible == undo_log_num {
                to_remove.push(txn_id);
            }
        }
        drop(catalog);

        if !to_remove.is_empty() {
            let mut txn_map = self.txn_map.write();
            for txn_id in &to_remove {
                txn_map.remove(txn_id);
            }
            debug!("garbage collected {} transaction(s)", to_remove.len());
        }
    }
}
