//! RAII page guards.
//!
//! A guard pins its page for its own lifetime and unpins on drop. The read
//! and write variants additionally hold the page latch (shared / exclusive)
//! for their lifetime; the latch is released before the unpin so that no
//! thread ever acquires the buffer pool latch while holding a page latch.
//! Guards are move-only; moving out leaves nothing behind to drop twice.

use parking_lot::{ArcRwLockReadGuard, ArcRwLockWriteGuard, RawRwLock};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::buffer::lru_k_replacer::AccessType;
use crate::common::config::{PageId, DB_PAGE_SIZE};
use crate::storage::page::page::Page;

type PageData = Box<[u8; DB_PAGE_SIZE]>;

/// Pins a page without holding its latch. Upgrade to a read or write guard
/// to access the content.
pub struct BasicPageGuard {
    bpm: Arc<BufferPoolManager>,
    page: Option<Arc<Page>>,
    is_dirty: bool,
}

impl BasicPageGuard {
    pub(crate) fn new(bpm: Arc<BufferPoolManager>, page: Arc<Page>) -> Self {
        Self {
            bpm,
            page: Some(page),
            is_dirty: false,
        }
    }

    pub fn get_page_id(&self) -> PageId {
        self.page.as_ref().expect("guard already dropped").get_page_id()
    }

    /// Unpins early instead of waiting for scope exit.
    pub fn drop_guard(&mut self) {
        if let Some(page) = self.page.take() {
            self.bpm
                .unpin_page(page.get_page_id(), self.is_dirty, AccessType::Unknown);
        }
    }

    /// Takes the shared page latch, consuming this guard.
    pub fn upgrade_read(mut self) -> ReadPageGuard {
        let page = self.page.take().expect("guard already dropped");
        let latch = parking_lot::RwLock::read_arc(page.data());
        ReadPageGuard {
            bpm: Arc::clone(&self.bpm),
            page_id: page.get_page_id(),
            latch: Some(latch),
        }
    }

    /// Takes the exclusive page latch, consuming this guard.
    pub fn upgrade_write(mut self) -> WritePageGuard {
        let page = self.page.take().expect("guard already dropped");
        let latch = parking_lot::RwLock::write_arc(page.data());
        WritePageGuard {
            bpm: Arc::clone(&self.bpm),
            page_id: page.get_page_id(),
            latch: Some(latch),
        }
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Holds the shared page latch for its lifetime; unpins clean on drop.
pub struct ReadPageGuard {
    bpm: Arc<BufferPoolManager>,
    page_id: PageId,
    latch: Option<ArcRwLockReadGuard<RawRwLock, PageData>>,
}

impl ReadPageGuard {
    pub fn get_page_id(&self) -> PageId {
        self.page_id
    }

    pub fn drop_guard(&mut self) {
        if self.latch.take().is_some() {
            self.bpm
                .unpin_page(self.page_id, false, AccessType::Unknown);
        }
    }
}

impl Deref for ReadPageGuard {
    type Target = [u8; DB_PAGE_SIZE];

    fn deref(&self) -> &Self::Target {
        let latch = self.latch.as_ref().expect("guard already dropped");
        &***latch
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Holds the exclusive page latch for its lifetime; unpins dirty on drop.
pub struct WritePageGuard {
    bpm: Arc<BufferPoolManager>,
    page_id: PageId,
    latch: Option<ArcRwLockWriteGuard<RawRwLock, PageData>>,
}

impl WritePageGuard {
    pub fn get_page_id(&self) -> PageId {
        self.page_id
    }

    pub fn drop_guard(&mut self) {
        if self.latch.take().is_some() {
            self.bpm.unpin_page(self.page_id, true, AccessType::Unknown);
        }
    }
}

impl Deref for WritePageGuard {
    type Target = [u8; DB_PAGE_SIZE];

    fn deref(&self) -> &Self::Target {
        let latch = self.latch.as_ref().expect("guard already dropped");
        &***latch
    }
}

impl DerefMut for WritePageGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        let latch = self.latch.as_mut().expect("guard already dropped");
        &mut ***latch
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        self.drop_guard();
    }
}
