use std::sync::Arc;

use crate::common::rid::RID;
use crate::storage::table::table_heap::TableHeap;
use crate::storage::table::tuple::{Tuple, TupleMeta};

/// Iterates a table heap in RID order. The end position is fixed when the
/// iterator is created, so a scan never chases tuples inserted behind it
/// (including its own transaction's inserts).
pub struct TableIterator {
    table_heap: Arc<TableHeap>,
    current: RID,
    end: RID,
}

impl TableIterator {
    pub fn new(table_heap: Arc<TableHeap>) -> Self {
        let current = RID::new(table_heap.get_first_page_id(), 0);
        let end = table_heap.end_rid();
        Self {
            table_heap,
            current,
            end,
        }
    }

    pub fn is_end(&self) -> bool {
        self.current >= self.end
    }

    pub fn get_rid(&self) -> RID {
        self.current
    }
}

impl Iterator for TableIterator {
    type Item = (TupleMeta, Tuple);

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }
        let item = self.table_heap.get_tuple(self.current)?;
        self.current = self.table_heap.next_rid(self.current);
        Some(item)
    }
}
