//! Table heap: slotted storage for a table's tuples.
//!
//! Pages hold a fixed number of slots; a tuple's RID `(page_id, slot_num)`
//! is assigned at insert and stays stable for its lifetime. Deletes are
//! soft (the tuple meta carries the marker), so slots are never reused and
//! RIDs stored in indexes and undo links never dangle.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::common::config::{PageId, SlotId};
use crate::common::rid::RID;
use crate::storage::table::table_iterator::TableIterator;
use crate::storage::table::tuple::{Tuple, TupleMeta};

/// Slots per table heap page.
pub const TABLE_PAGE_SLOT_CAPACITY: usize = 32;

struct TableHeapPage {
    tuples: Vec<(TupleMeta, Tuple)>,
}

impl TableHeapPage {
    fn new() -> Self {
        Self {
            tuples: Vec::with_capacity(TABLE_PAGE_SLOT_CAPACITY),
        }
    }

    fn is_full(&self) -> bool {
        self.tuples.len() >= TABLE_PAGE_SLOT_CAPACITY
    }
}

pub struct TableHeap {
    pages: RwLock<Vec<TableHeapPage>>,
}

impl TableHeap {
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(vec![TableHeapPage::new()]),
        }
    }

    pub fn get_first_page_id(&self) -> PageId {
        0
    }

    /// Appends a tuple, returning its assigned RID. Returns `None` only if
    /// the heap cannot grow (never the case for this in-memory layout, but
    /// callers treat insertion as fallible per the storage contract).
    pub fn insert_tuple(&self, meta: TupleMeta, mut tuple: Tuple) -> Option<RID> {
        let mut pages = self.pages.write();
        if pages.last().unwrap().is_full() {
            pages.push(TableHeapPage::new());
        }
        let page_id = (pages.len() - 1) as PageId;
        let page = pages.last_mut().unwrap();
        let slot = page.tuples.len() as SlotId;
        let rid = RID::new(page_id, slot);
        tuple.set_rid(rid);
        page.tuples.push((meta, tuple));
        Some(rid)
    }

    pub fn get_tuple(&self, rid: RID) -> Option<(TupleMeta, Tuple)> {
        let pages = self.pages.read();
        let page = pages.get(rid.get_page_id() as usize)?;
        page.tuples.get(rid.get_slot_num() as usize).cloned()
    }

    pub fn get_tuple_meta(&self, rid: RID) -> Option<TupleMeta> {
        let pages = self.pages.read();
        let page = pages.get(rid.get_page_id() as usize)?;
        page.tuples.get(rid.get_slot_num() as usize).map(|(m, _)| *m)
    }

    /// Overwrites the tuple value and meta at `rid` in place.
    pub fn update_tuple_in_place(&self, meta: TupleMeta, mut tuple: Tuple, rid: RID) -> bool {
        let mut pages = self.pages.write();
        let Some(page) = pages.get_mut(rid.get_page_id() as usize) else {
            return false;
        };
        let Some(slot) = page.tuples.get_mut(rid.get_slot_num() as usize) else {
            return false;
        };
        tuple.set_rid(rid);
        *slot = (meta, tuple);
        true
    }

    /// Rewrites only the tuple meta at `rid`.
    pub fn update_tuple_meta(&self, meta: TupleMeta, rid: RID) -> bool {
        let mut pages = self.pages.write();
        let Some(page) = pages.get_mut(rid.get_page_id() as usize) else {
            return false;
        };
        let Some(slot) = page.tuples.get_mut(rid.get_slot_num() as usize) else {
            return false;
        };
        slot.0 = meta;
        true
    }

    pub fn make_iterator(self: &Arc<Self>) -> TableIterator {
        TableIterator::new(Arc::clone(self))
    }

    /// The RID one past the last slot currently in the heap; iteration stops
    /// there even if concurrent inserts extend the heap afterwards.
    pub(crate) fn end_rid(&self) -> RID {
        let pages = self.pages.read();
        let last_page = pages.len() - 1;
        RID::new(last_page as PageId, pages[last_page].tuples.len() as SlotId)
    }

    pub(crate) fn next_rid(&self, rid: RID) -> RID {
        let pages = self.pages.read();
        let page_idx = rid.get_page_id() as usize;
        let next_slot = rid.get_slot_num() as usize + 1;
        if next_slot < pages[page_idx].tuples.len() || page_idx + 1 >= pages.len() {
            RID::new(rid.get_page_id(), next_slot as SlotId)
        } else {
            RID::new((page_idx + 1) as PageId, 0)
        }
    }
}

impl Default for TableHeap {
    fn default() -> Self {
        Self::new()
    }
}
