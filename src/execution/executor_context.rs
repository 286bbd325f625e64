use parking_lot::RwLock;
use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::catalog::catalog::Catalog;
use crate::concurrency::transaction::Transaction;
use crate::concurrency::transaction_manager::TransactionManager;

/// Everything an executor needs at runtime: the catalog, the buffer pool,
/// the transaction it runs under, and the transaction manager for version
/// chain access.
pub struct ExecutorContext {
    bpm: Arc<BufferPoolManager>,
    catalog: Arc<RwLock<Catalog>>,
    txn: Arc<Transaction>,
    txn_manager: Arc<TransactionManager>,
}

impl ExecutorContext {
    pub fn new(
        bpm: Arc<BufferPoolManager>,
        catalog: Arc<RwLock<Catalog>>,
        txn: Arc<Transaction>,
        txn_manager: Arc<TransactionManager>,
    ) -> Self {
        Self {
            bpm,
            catalog,
            txn,
            txn_manager,
        }
    }

    pub fn get_buffer_pool_manager(&self) -> Arc<BufferPoolManager> {
        Arc::clone(&self.bpm)
    }

    pub fn get_catalog(&self) -> Arc<RwLock<Catalog>> {
        Arc::clone(&self.catalog)
    }

    pub fn get_transaction(&self) -> Arc<Transaction> {
        Arc::clone(&self.txn)
    }

    pub fn get_transaction_manager(&self) -> Arc<TransactionManager> {
        Arc::clone(&self.txn_manager)
    }
}
