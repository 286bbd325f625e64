use thiserror::Error;

use crate::common::config::TxnId;
use crate::common::rid::RID;

/// Error type surfaced by the fallible operations of the engine.
///
/// Sentinel failures (page not resident, key absent, pool exhausted) are
/// reported through `Option` / `bool` returns instead; only conditions the
/// caller must react to become a `DBError`.
#[derive(Error, Debug)]
pub enum DBError {
    #[error("execution error: {0}")]
    Execution(String),

    #[error("write-write conflict: txn {txn_id} on {rid}")]
    WriteWriteConflict { txn_id: TxnId, rid: RID },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("transaction {0} is tainted; only abort is legal")]
    TxnTainted(TxnId),

    #[error("catalog error: {0}")]
    Catalog(String),
}
