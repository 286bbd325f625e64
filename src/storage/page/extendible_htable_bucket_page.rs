//! Bucket page of the extendible hash table.
//!
//! Stores up to `max_size` fixed-width `(key, value)` entries. On-page
//! layout (little endian):
//!
//! ```text
//! offset 0: max_size (u32)
//! offset 4: size (u32)
//! offset 8: entries, each K::SIZE + V::SIZE bytes
//! ```

use crate::common::config::{PageId, SlotId, DB_PAGE_SIZE};
use crate::common::rid::RID;

const ENTRIES_OFFSET: usize = 8;

/// Fixed-width byte encoding for bucket keys and values.
pub trait FixedBytes: Copy + PartialEq + std::fmt::Debug {
    const SIZE: usize;
    fn write_to(&self, dst: &mut [u8]);
    fn read_from(src: &[u8]) -> Self;
}

impl FixedBytes for u32 {
    const SIZE: usize = 4;

    fn write_to(&self, dst: &mut [u8]) {
        dst[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(src: &[u8]) -> Self {
        u32::from_le_bytes(src[..4].try_into().unwrap())
    }
}

impl FixedBytes for u64 {
    const SIZE: usize = 8;

    fn write_to(&self, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(src: &[u8]) -> Self {
        u64::from_le_bytes(src[..8].try_into().unwrap())
    }
}

impl FixedBytes for i64 {
    const SIZE: usize = 8;

    fn write_to(&self, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&self.to_le_bytes());
    }

    fn read_from(src: &[u8]) -> Self {
        i64::from_le_bytes(src[..8].try_into().unwrap())
    }
}

impl FixedBytes for RID {
    const SIZE: usize = 12;

    fn write_to(&self, dst: &mut [u8]) {
        dst[..8].copy_from_slice(&self.get_page_id().to_le_bytes());
        dst[8..12].copy_from_slice(&self.get_slot_num().to_le_bytes());
    }

    fn read_from(src: &[u8]) -> Self {
        let page_id = PageId::from_le_bytes(src[..8].try_into().unwrap());
        let slot_num = SlotId::from_le_bytes(src[8..12].try_into().unwrap());
        RID::new(page_id, slot_num)
    }
}

#[derive(Debug, Clone)]
pub struct ExtendibleHTableBucketPage<K: FixedBytes, V: FixedBytes> {
    max_size: u32,
    entries: Vec<(K, V)>,
}

impl<K: FixedBytes, V: FixedBytes> ExtendibleHTableBucketPage<K, V> {
    fn entry_stride() -> usize {
        K::SIZE + V::SIZE
    }

    /// Largest entry count a page of this key/value shape can hold.
    pub fn page_capacity() -> u32 {
        ((DB_PAGE_SIZE - ENTRIES_OFFSET) / Self::entry_stride()) as u32
    }

    pub fn init(max_size: u32) -> Self {
        assert!(
            max_size <= Self::page_capacity(),
            "bucket max size {} exceeds page capacity {}",
            max_size,
            Self::page_capacity()
        );
        Self {
            max_size,
            entries: Vec::new(),
        }
    }

    pub fn from_bytes(data: &[u8; DB_PAGE_SIZE]) -> Self {
        let max_size = u32::from_le_bytes(data[0..4].try_into().unwrap());
        let size = u32::from_le_bytes(data[4..8].try_into().unwrap());
        let stride = Self::entry_stride();

        let mut entries = Vec::with_capacity(size as usize);
        for i in 0..size as usize {
            let off = ENTRIES_OFFSET + i * stride;
            let key = K::read_from(&data[off..off + K::SIZE]);
            let value = V::read_from(&data[off + K::SIZE..off + stride]);
            entries.push((key, value));
        }
        Self { max_size, entries }
    }

    pub fn save(&self, data: &mut [u8; DB_PAGE_SIZE]) {
        data[0..4].copy_from_slice(&self.max_size.to_le_bytes());
        data[4..8].copy_from_slice(&(self.entries.len() as u32).to_le_bytes());
        let stride = Self::entry_stride();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            let off = ENTRIES_OFFSET + i * stride;
            key.write_to(&mut data[off..off + K::SIZE]);
            value.write_to(&mut data[off + K::SIZE..off + stride]);
        }
    }

    pub fn lookup(&self, key: &K) -> Option<V> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Inserts a pair. Rejects duplicates and a full bucket.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.is_full() || self.lookup(&key).is_some() {
            return false;
        }
        self.entries.push((key, value));
        true
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn key_at(&self, idx: usize) -> K {
        self.entries[idx].0
    }

    pub fn value_at(&self, idx: usize) -> V {
        self.entries[idx].1
    }

    /// Drains all entries, leaving an empty bucket; used when rehashing
    /// during a split.
    pub fn take_entries(&mut self) -> Vec<(K, V)> {
        std::mem::take(&mut self.entries)
    }

    pub fn size(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() as u32 >= self.max_size
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup_remove() {
        let mut bucket: ExtendibleHTableBucketPage<u32, u32> = ExtendibleHTableBucketPage::init(4);
        assert!(bucket.insert(1, 100));
        assert!(bucket.insert(2, 200));
        assert_eq!(bucket.lookup(&1), Some(100));
        assert_eq!(bucket.lookup(&3), None);

        assert!(bucket.remove(&1));
        assert!(!bucket.remove(&1));
        assert_eq!(bucket.lookup(&1), None);
    }

    #[test]
    fn test_duplicate_and_full_rejection() {
        let mut bucket: ExtendibleHTableBucketPage<u32, u32> = ExtendibleHTableBucketPage::init(2);
        assert!(bucket.insert(1, 100));
        assert!(!bucket.insert(1, 999));
        assert!(bucket.insert(2, 200));
        assert!(bucket.is_full());
        assert!(!bucket.insert(3, 300));
    }

    #[test]
    fn test_byte_roundtrip_with_rid_values() {
        let mut bucket: ExtendibleHTableBucketPage<i64, RID> = ExtendibleHTableBucketPage::init(8);
        assert!(bucket.insert(-5, RID::new(3, 1)));
        assert!(bucket.insert(17, RID::new(4, 2)));

        let mut data = [0u8; DB_PAGE_SIZE];
        bucket.save(&mut data);
        let restored: ExtendibleHTableBucketPage<i64, RID> =
            ExtendibleHTableBucketPage::from_bytes(&data);
        assert_eq!(restored.size(), 2);
        assert_eq!(restored.lookup(&-5), Some(RID::new(3, 1)));
        assert_eq!(restored.lookup(&17), Some(RID::new(4, 2)));
    }
}
