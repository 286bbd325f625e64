//! Transactions and their undo history.
//!
//! Undo logs live inside the owning transaction's append-only vector, so an
//! `UndoLink` `(txn_id, log_index)` is a stable, copyable reference that
//! cannot dangle until garbage collection drops the whole transaction, which
//! only happens once no live reader can reach any of its logs.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::common::config::{TableOid, Timestamp, TxnId, INVALID_TXN_ID, TXN_START_ID};
use crate::common::rid::RID;
use crate::storage::table::tuple::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Running,
    Tainted,
    Committed,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IsolationLevel {
    SnapshotIsolation,
    Serializable,
}

/// Reference to a previous tuple version: which transaction holds it and at
/// which index in that transaction's undo log vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UndoLink {
    pub prev_txn: TxnId,
    pub prev_log_idx: usize,
}

impl UndoLink {
    pub const INVALID: UndoLink = UndoLink {
        prev_txn: INVALID_TXN_ID,
        prev_log_idx: 0,
    };

    pub fn new(prev_txn: TxnId, prev_log_idx: usize) -> Self {
        Self {
            prev_txn,
            prev_log_idx,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.prev_txn != INVALID_TXN_ID
    }
}

/// One recorded prior version of a tuple.
#[derive(Debug, Clone)]
pub struct UndoLog {
    /// True when the version this log restores is a deletion.
    pub is_deleted: bool,
    /// One flag per column: whether this log carries the column's pre-image.
    pub modified_fields: Vec<bool>,
    /// Partial tuple holding only the modified columns, in column order.
    pub tuple: Tuple,
    /// Timestamp of the version this log restores.
    pub ts: Timestamp,
    /// Next-older version in the chain.
    pub prev_version: UndoLink,
}

pub struct Transaction {
    txn_id: TxnId,
    isolation_level: IsolationLevel,

    state: RwLock<TransactionState>,
    read_ts: RwLock<Timestamp>,
    commit_ts: RwLock<Timestamp>,
    undo_logs: Mutex<Vec<UndoLog>>,
    write_set: Mutex<HashMap<TableOid, HashSet<RID>>>,
}

impl Transaction {
    pub fn new(txn_id: TxnId, isolation_level: IsolationLevel) -> Self {
        Self {
            txn_id,
            isolation_level,
            state: RwLock::new(TransactionState::Running),
            read_ts: RwLock::new(0),
            commit_ts: RwLock::new(0),
            undo_logs: Mutex::new(Vec::new()),
            write_set: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_txn_id(&self) -> TxnId {
        self.txn_id
    }

    /// Transaction id with the reserved high bit stripped; debugging only.
    pub fn txn_id_human_readable(&self) -> TxnId {
        self.txn_id ^ TXN_START_ID
    }

    /// The temporary timestamp stamped on this transaction's uncommitted
    /// writes.
    pub fn temp_ts(&self) -> Timestamp {
        self.txn_id
    }

    pub fn get_isolation_level(&self) -> IsolationLevel {
        self.isolation_level
    }

    pub fn get_state(&self) -> TransactionState {
        *self.state.read()
    }

    pub fn set_state(&self, state: TransactionState) {
        *self.state.write() = state;
    }

    /// Poisons the transaction after an irrecoverable conflict; every
    /// subsequent mutating call must refuse to operate.
    pub fn set_tainted(&self) {
        *self.state.write() = TransactionState::Tainted;
    }

    pub fn get_read_ts(&self) -> Timestamp {
        *self.read_ts.read()
    }

    pub fn set_read_ts(&self, ts: Timestamp) {
        *self.read_ts.write() = ts;
    }

    pub fn get_commit_ts(&self) -> Timestamp {
        *self.commit_ts.read()
    }

    pub fn set_commit_ts(&self, ts: Timestamp) {
        *self.commit_ts.write() = ts;
    }

    /// Appends an undo log and returns the stable link to it.
    pub fn append_undo_log(&self, log: UndoLog) -> UndoLink {
        let mut logs = self.undo_logs.lock();
        logs.push(log);
        UndoLink::new(self.txn_id, logs.len() - 1)
    }

    /// Replaces an existing undo log (used when a later self-modification
    /// widens the log's column coverage).
    pub fn modify_undo_log(&self, log_idx: usize, log: UndoLog) {
        let mut logs = self.undo_logs.lock();
        logs[log_idx] = log;
    }

    pub fn get_undo_log(&self, log_idx: usize) -> Option<UndoLog> {
        self.undo_logs.lock().get(log_idx).cloned()
    }

    pub fn get_undo_log_num(&self) -> usize {
        self.undo_logs.lock().len()
    }

    pub fn append_write_set(&self, table_oid: TableOid, rid: RID) {
        self.write_set
            .lock()
            .entry(table_oid)
            .or_default()
            .insert(rid);
    }

    pub fn get_write_sets(&self) -> HashMap<TableOid, HashSet<RID>> {
        self.write_set.lock().clone()
    }
}
