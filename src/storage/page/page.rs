use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::common::config::{PageId, DB_PAGE_SIZE, INVALID_PAGE_ID};

/// Page is the basic unit of storage: a fixed-size byte block resident in a
/// buffer pool frame, plus the book-keeping the buffer pool manager needs
/// (page id, pin count, dirty flag).
///
/// The `RwLock` around the data buffer is the page latch. Pin count, dirty
/// flag, and page id are atomics maintained under the buffer pool's metadata
/// latch, so the page latch guards content only.
pub struct Page {
    page_id: AtomicU64,
    pin_count: AtomicI32,
    is_dirty: AtomicBool,
    data: Arc<RwLock<Box<[u8; DB_PAGE_SIZE]>>>,
}

impl Page {
    pub fn new() -> Self {
        Self {
            page_id: AtomicU64::new(INVALID_PAGE_ID),
            pin_count: AtomicI32::new(0),
            is_dirty: AtomicBool::new(false),
            data: Arc::new(RwLock::new(Box::new([0; DB_PAGE_SIZE]))),
        }
    }

    pub fn get_page_id(&self) -> PageId {
        self.page_id.load(Ordering::SeqCst)
    }

    pub fn set_page_id(&self, page_id: PageId) {
        self.page_id.store(page_id, Ordering::SeqCst);
    }

    pub fn get_pin_count(&self) -> i32 {
        self.pin_count.load(Ordering::SeqCst)
    }

    pub fn set_pin_count(&self, pin_count: i32) {
        self.pin_count.store(pin_count, Ordering::SeqCst);
    }

    pub fn increment_pin_count(&self) {
        self.pin_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn decrement_pin_count(&self) {
        self.pin_count.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::SeqCst)
    }

    pub fn set_dirty(&self, is_dirty: bool) {
        self.is_dirty.store(is_dirty, Ordering::SeqCst);
    }

    /// The page latch protecting the data buffer.
    pub fn data(&self) -> &Arc<RwLock<Box<[u8; DB_PAGE_SIZE]>>> {
        &self.data
    }

    /// Copies the current page content out; used for scheduling writes.
    pub fn copy_data(&self) -> Box<[u8; DB_PAGE_SIZE]> {
        Box::new(**self.data.read())
    }

    /// Overwrites the page content; used after a scheduled read completes.
    pub fn fill_data(&self, src: &[u8; DB_PAGE_SIZE]) {
        self.data.write().copy_from_slice(src);
    }

    /// Zeroes out the data held within the page.
    pub fn reset_memory(&self) {
        self.data.write().fill(0);
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
