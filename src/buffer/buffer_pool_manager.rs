//! Buffer pool manager: a fixed-size cache of disk pages.
//!
//! One metadata latch covers the page table, the free list, and the LRU-K
//! replacer. Page content is guarded separately by per-page latches (the
//! `RwLock` inside [`Page`]), which are only taken after the metadata latch
//! has been released; the sole blocking operation permitted under the
//! metadata latch is waiting on a disk scheduler completion handle.

use log::{debug, trace};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::buffer::lru_k_replacer::{AccessType, LRUKReplacer};
use crate::common::config::{FrameId, PageId, INVALID_PAGE_ID};
use crate::storage::disk::disk_scheduler::DiskScheduler;
use crate::storage::page::page::Page;
use crate::storage::page::page_guard::{BasicPageGuard, ReadPageGuard, WritePageGuard};

struct BufferPoolCore {
    /// Authoritative mapping of resident pages to frames.
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    replacer: LRUKReplacer,
}

pub struct BufferPoolManager {
    pool_size: usize,
    next_page_id: AtomicU64,
    pages: Vec<Arc<Page>>,
    latch: Mutex<BufferPoolCore>,
    disk_scheduler: Arc<DiskScheduler>,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk_scheduler: Arc<DiskScheduler>, replacer_k: usize) -> Self {
        let pages = (0..pool_size).map(|_| Arc::new(Page::new())).collect();
        let free_list = (0..pool_size).collect();

        Self {
            pool_size,
            next_page_id: AtomicU64::new(0),
            pages,
            latch: Mutex::new(BufferPoolCore {
                page_table: HashMap::new(),
                free_list,
                replacer: LRUKReplacer::new(pool_size, replacer_k),
            }),
            disk_scheduler,
        }
    }

    pub fn get_pool_size(&self) -> usize {
        self.pool_size
    }

    /// Creates a new page in the buffer pool, pinned. Returns `None` when
    /// every frame is in use and none is evictable.
    pub fn new_page(&self) -> Option<Arc<Page>> {
        let mut core = self.latch.lock();
        let frame_id = self.acquire_victim_frame(&mut core)?;

        let page_id = self.allocate_page();
        let page = &self.pages[frame_id];
        page.set_page_id(page_id);
        page.set_dirty(false);
        page.set_pin_count(1);
        page.reset_memory();

        core.page_table.insert(page_id, frame_id);
        core.replacer.record_access(frame_id, AccessType::Lookup);
        core.replacer.set_evictable(frame_id, false);

        trace!("created page {} in frame {}", page_id, frame_id);
        Some(Arc::clone(page))
    }

    /// Fetches the requested page, loading it from disk if absent. Returns
    /// `None` when the page would have to be loaded but no frame is
    /// obtainable.
    pub fn fetch_page(&self, page_id: PageId) -> Option<Arc<Page>> {
        let mut core = self.latch.lock();

        if let Some(&frame_id) = core.page_table.get(&page_id) {
            let page = &self.pages[frame_id];
            page.increment_pin_count();
            core.replacer.record_access(frame_id, AccessType::Lookup);
            core.replacer.set_evictable(frame_id, false);
            return Some(Arc::clone(page));
        }

        let frame_id = self.acquire_victim_frame(&mut core)?;
        let page = &self.pages[frame_id];
        page.set_page_id(page_id);
        page.set_dirty(false);
        page.set_pin_count(1);

        // Load the content through the scheduler before publishing the
        // mapping; the pin keeps the frame from being stolen meanwhile.
        let buffer = Arc::new(parking_lot::Mutex::new(Box::new([0u8; crate::common::config::DB_PAGE_SIZE])));
        let future = self
            .disk_scheduler
            .schedule_io(false, Arc::clone(&buffer), page_id);
        if !future.wait() {
            panic!("read of page {} failed", page_id);
        }
        page.fill_data(&buffer.lock());

        core.page_table.insert(page_id, frame_id);
        core.replacer.record_access(frame_id, AccessType::Lookup);
        core.replacer.set_evictable(frame_id, false);

        trace!("fetched page {} into frame {}", page_id, frame_id);
        Some(Arc::clone(page))
    }

    /// Unpins a page, optionally marking it dirty. Returns false when the
    /// page is not resident or its pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        let mut core = self.latch.lock();
        let Some(&frame_id) = core.page_table.get(&page_id) else {
            return false;
        };
        let page = &self.pages[frame_id];
        if page.get_pin_count() <= 0 {
            return false;
        }
        if is_dirty {
            page.set_dirty(true);
        }
        page.decrement_pin_count();
        if page.get_pin_count() == 0 {
            core.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Writes the page to disk regardless of its dirty state and clears the
    /// dirty flag. Returns false when the page is not resident.
    ///
    /// Must not be called while holding a write guard on the same page.
    pub fn flush_page(&self, page_id: PageId) -> bool {
        // Pin under the metadata latch, then release it before touching the
        // page latch; page latches are never taken under the metadata latch
        // on a page that may be latched by someone else.
        let page = {
            let mut core = self.latch.lock();
            let Some(&frame_id) = core.page_table.get(&page_id) else {
                return false;
            };
            let page = Arc::clone(&self.pages[frame_id]);
            page.increment_pin_count();
            core.replacer.set_evictable(frame_id, false);
            page
        };

        let buffer = Arc::new(parking_lot::Mutex::new(page.copy_data()));
        let future = self.disk_scheduler.schedule_io(true, buffer, page_id);
        if !future.wait() {
            panic!("flush of page {} failed", page_id);
        }
        page.set_dirty(false);

        self.unpin_page(page_id, false, AccessType::Unknown);
        true
    }

    /// Flushes every page resident in the pool.
    pub fn flush_all_pages(&self) {
        let page_ids: Vec<PageId> = {
            let core = self.latch.lock();
            core.page_table.keys().copied().collect()
        };
        for page_id in page_ids {
            self.flush_page(page_id);
        }
    }

    /// Removes a page from the pool. Returns false when the page is pinned;
    /// returns true when the page is absent (nothing to do) or was deleted.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut core = self.latch.lock();
        let Some(&frame_id) = core.page_table.get(&page_id) else {
            return true;
        };
        let page = &self.pages[frame_id];
        if page.get_pin_count() > 0 {
            return false;
        }
        core.page_table.remove(&page_id);
        core.replacer.remove(frame_id);
        core.free_list.push_back(frame_id);
        page.reset_memory();
        page.set_page_id(INVALID_PAGE_ID);
        page.set_dirty(false);
        page.set_pin_count(0);
        self.deallocate_page(page_id);
        debug!("deleted page {}", page_id);
        true
    }

    pub fn allocate_page(&self) -> PageId {
        self.next_page_id.fetch_add(1, Ordering::SeqCst)
    }

    fn deallocate_page(&self, _page_id: PageId) {
        // No bookkeeping beyond the monotonic allocator.
    }

    /// Picks a frame for reuse: the free list first, otherwise an eviction
    /// victim (written back through the scheduler if dirty).
    fn acquire_victim_frame(&self, core: &mut BufferPoolCore) -> Option<FrameId> {
        if let Some(frame_id) = core.free_list.pop_front() {
            return Some(frame_id);
        }
        let frame_id = core.replacer.evict()?;

        let victim = &self.pages[frame_id];
        let old_page_id = victim.get_page_id();
        if victim.is_dirty() {
            let buffer = Arc::new(parking_lot::Mutex::new(victim.copy_data()));
            let future = self.disk_scheduler.schedule_io(true, buffer, old_page_id);
            if !future.wait() {
                panic!("write-back of evicted page {} failed", old_page_id);
            }
            trace!("wrote back dirty victim page {}", old_page_id);
        }
        core.page_table.remove(&old_page_id);
        victim.reset_memory();
        Some(frame_id)
    }

    // Guarded variants.

    pub fn new_page_guarded(self: &Arc<Self>) -> Option<BasicPageGuard> {
        let page = self.new_page()?;
        Some(BasicPageGuard::new(Arc::clone(self), page))
    }

    pub fn fetch_page_basic(self: &Arc<Self>, page_id: PageId) -> Option<BasicPageGuard> {
        let page = self.fetch_page(page_id)?;
        Some(BasicPageGuard::new(Arc::clone(self), page))
    }

    pub fn fetch_page_read(self: &Arc<Self>, page_id: PageId) -> Option<ReadPageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_read())
    }

    pub fn fetch_page_write(self: &Arc<Self>, page_id: PageId) -> Option<WritePageGuard> {
        Some(self.fetch_page_basic(page_id)?.upgrade_write())
    }

    #[cfg(test)]
    pub(crate) fn pin_count_of(&self, page_id: PageId) -> Option<i32> {
        let core = self.latch.lock();
        core.page_table
            .get(&page_id)
            .map(|&fid| self.pages[fid].get_pin_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::disk::disk_manager::MemoryDiskManager;
    use tempfile::TempDir;

    use crate::common::logger::initialize_logger;
    use crate::storage::disk::disk_manager::FileDiskManager;

    fn make_bpm(pool_size: usize) -> Arc<BufferPoolManager> {
        initialize_logger();
        let disk_manager = Arc::new(MemoryDiskManager::new());
        let scheduler = Arc::new(DiskScheduler::new(disk_manager));
        Arc::new(BufferPoolManager::new(pool_size, scheduler, 2))
    }

    #[test]
    fn test_eviction_prefers_unpinned_page() {
        let bpm = make_bpm(3);

        let p0 = bpm.new_page().unwrap();
        let p1 = bpm.new_page().unwrap();
        let p2 = bpm.new_page().unwrap();
        assert_eq!(p0.get_page_id(), 0);
        assert_eq!(p1.get_pin_count(), 1);

        // Pool full and everything pinned.
        assert!(bpm.new_page().is_none());

        assert!(bpm.unpin_page(p0.get_page_id(), false, AccessType::Unknown));
        let p3 = bpm.new_page().unwrap();
        assert_eq!(p3.get_page_id(), 3);

        // p0 was evicted clean; fetching it re-reads zeroes from disk.
        assert!(bpm.unpin_page(p3.get_page_id(), false, AccessType::Unknown));
        let p0_again = bpm.fetch_page(0).unwrap();
        assert!(p0_again.copy_data().iter().all(|&b| b == 0));

        drop(p2);
    }

    #[test]
    fn test_dirty_page_survives_eviction() {
        initialize_logger();
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("bpm.db");
        let disk_manager = Arc::new(FileDiskManager::new(db_path.to_str().unwrap()));
        let scheduler = Arc::new(DiskScheduler::new(disk_manager));
        let bpm = Arc::new(BufferPoolManager::new(2, scheduler, 2));

        let p0 = bpm.new_page().unwrap();
        let p0_id = p0.get_page_id();
        p0.data().write()[..5].copy_from_slice(b"hello");
        assert!(bpm.unpin_page(p0_id, true, AccessType::Unknown));

        // Force p0 out of the pool.
        for _ in 0..2 {
            let p = bpm.new_page().unwrap();
            assert!(bpm.unpin_page(p.get_page_id(), false, AccessType::Unknown));
        }

        let p0_again = bpm.fetch_page(p0_id).unwrap();
        assert_eq!(&p0_again.copy_data()[..5], b"hello");
    }

    #[test]
    fn test_unpin_below_zero_fails() {
        let bpm = make_bpm(2);
        let p0 = bpm.new_page().unwrap();
        let p0_id = p0.get_page_id();

        assert!(bpm.unpin_page(p0_id, false, AccessType::Unknown));
        assert!(!bpm.unpin_page(p0_id, false, AccessType::Unknown));
        assert!(!bpm.unpin_page(999, false, AccessType::Unknown));
    }

    #[test]
    fn test_flush_page_is_idempotent() {
        let bpm = make_bpm(2);
        let p0 = bpm.new_page().unwrap();
        let p0_id = p0.get_page_id();
        p0.data().write()[0] = 7;
        p0.set_dirty(true);

        assert!(bpm.flush_page(p0_id));
        assert!(!p0.is_dirty());
        // Second flush observes a clean page and succeeds all the same.
        assert!(bpm.flush_page(p0_id));
        assert!(!p0.is_dirty());

        assert!(!bpm.flush_page(12345));
    }

    #[test]
    fn test_delete_page() {
        let bpm = make_bpm(2);
        let p0 = bpm.new_page().unwrap();
        let p0_id = p0.get_page_id();

        // Pinned pages cannot be deleted.
        assert!(!bpm.delete_page(p0_id));
        assert!(bpm.unpin_page(p0_id, false, AccessType::Unknown));
        assert!(bpm.delete_page(p0_id));
        // Deleting an absent page is trivially fine.
        assert!(bpm.delete_page(p0_id));
    }

    #[test]
    fn test_page_guards_unpin_on_drop() {
        let bpm = make_bpm(2);
        let page_id = {
            let guard = bpm.new_page_guarded().unwrap();
            assert_eq!(bpm.pin_count_of(guard.get_page_id()), Some(1));
            guard.get_page_id()
        };
        assert_eq!(bpm.pin_count_of(page_id), Some(0));

        {
            let mut write = bpm.fetch_page_write(page_id).unwrap();
            write[0] = 9;
        }
        // The write guard marked the page dirty on drop.
        let read = bpm.fetch_page_read(page_id).unwrap();
        assert_eq!(read[0], 9);
    }

    #[test]
    fn test_concurrent_readers_share_latch() {
        let bpm = make_bpm(2);
        let guard = bpm.new_page_guarded().unwrap();
        let page_id = guard.get_page_id();
        drop(guard);

        let r1 = bpm.fetch_page_read(page_id).unwrap();
        let r2 = bpm.fetch_page_read(page_id).unwrap();
        assert_eq!(r1[0], r2[0]);
        assert_eq!(bpm.pin_count_of(page_id), Some(2));
    }
}
