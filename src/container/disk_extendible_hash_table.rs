//! Disk-resident extendible hash table.
//!
//! Three page levels, all persisted through the buffer pool: a header page
//! routing by the high bits of the hash, directory pages routing by the low
//! bits, and bucket pages storing the entries. Read paths descend with read
//! guards, mutating paths with write guards; a parent guard is dropped as
//! soon as the child page id has been resolved.

use log::debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::common::config::{PageId, INVALID_PAGE_ID};
use crate::common::exception::DBError;
use crate::container::hash_function::HashFunction;
use crate::storage::page::extendible_htable_bucket_page::{ExtendibleHTableBucketPage, FixedBytes};
use crate::storage::page::extendible_htable_directory_page::ExtendibleHTableDirectoryPage;
use crate::storage::page::extendible_htable_header_page::ExtendibleHTableHeaderPage;
use crate::storage::page::page_guard::WritePageGuard;

enum InsertOutcome {
    Done(bool),
    Retry,
}

pub struct DiskExtendibleHashTable<K, V>
where
    K: FixedBytes + Hash,
    V: FixedBytes,
{
    index_name: String,
    bpm: Arc<BufferPoolManager>,
    hash_fn: HashFunction<K>,
    directory_max_depth: u32,
    bucket_max_size: u32,
    header_page_id: PageId,
    _marker: std::marker::PhantomData<V>,
}

impl<K, V> DiskExtendibleHashTable<K, V>
where
    K: FixedBytes + Hash,
    V: FixedBytes,
{
    pub fn new(
        name: &str,
        bpm: Arc<BufferPoolManager>,
        hash_fn: HashFunction<K>,
        header_max_depth: u32,
        directory_max_depth: u32,
        bucket_max_size: u32,
    ) -> Result<Self, DBError> {
        let mut header_guard = bpm
            .new_page_guarded()
            .ok_or_else(|| DBError::Execution("failed to create hash table header page".into()))?
            .upgrade_write();
        let header_page_id = header_guard.get_page_id();

        let header = ExtendibleHTableHeaderPage::init(header_max_depth);
        header.save(&mut header_guard);
        drop(header_guard);

        debug!(
            "created hash table '{}' with header page {}",
            name, header_page_id
        );
        Ok(Self {
            index_name: name.to_string(),
            bpm,
            hash_fn,
            directory_max_depth,
            bucket_max_size,
            header_page_id,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn get_index_name(&self) -> &str {
        &self.index_name
    }

    pub fn get_header_page_id(&self) -> PageId {
        self.header_page_id
    }

    fn hash(&self, key: &K) -> u32 {
        self.hash_fn.get_hash(key) as u32
    }

    /// Looks up the value stored under `key`.
    pub fn get_value(&self, key: &K) -> Option<V> {
        let hash = self.hash(key);

        let header_guard = self.bpm.fetch_page_read(self.header_page_id)?;
        let header = ExtendibleHTableHeaderPage::from_bytes(&header_guard);
        let directory_page_id =
            header.get_directory_page_id(header.hash_to_directory_index(hash));
        drop(header_guard);
        if directory_page_id == INVALID_PAGE_ID {
            return None;
        }

        let directory_guard = self.bpm.fetch_page_read(directory_page_id)?;
        let directory = ExtendibleHTableDirectoryPage::from_bytes(&directory_guard);
        let bucket_page_id = directory.get_bucket_page_id(directory.hash_to_bucket_index(hash));
        drop(directory_guard);
        if bucket_page_id == INVALID_PAGE_ID {
            return None;
        }

        let bucket_guard = self.bpm.fetch_page_read(bucket_page_id)?;
        let bucket: ExtendibleHTableBucketPage<K, V> =
            ExtendibleHTableBucketPage::from_bytes(&bucket_guard);
        bucket.lookup(key)
    }

    /// Inserts a key/value pair. Fails on duplicate keys and when the
    /// directory cannot grow past its max depth to make room.
    pub fn insert(&self, key: K, value: V) -> bool {
        let hash = self.hash(&key);
        loop {
            match self.try_insert(hash, key, value) {
                InsertOutcome::Done(ok) => return ok,
                InsertOutcome::Retry => continue,
            }
        }
    }

    fn try_insert(&self, hash: u32, key: K, value: V) -> InsertOutcome {
        let Some(mut header_guard) = self.bpm.fetch_page_write(self.header_page_id) else {
            return InsertOutcome::Done(false);
        };
        let mut header = ExtendibleHTableHeaderPage::from_bytes(&header_guard);
        let directory_idx = header.hash_to_directory_index(hash);
        let directory_page_id = header.get_directory_page_id(directory_idx);

        if directory_page_id == INVALID_PAGE_ID {
            let ok = self.insert_to_new_directory(
                &mut header,
                &mut header_guard,
                directory_idx,
                hash,
                key,
                value,
            );
            return InsertOutcome::Done(ok);
        }
        drop(header_guard);

        let Some(mut directory_guard) = self.bpm.fetch_page_write(directory_page_id) else {
            return InsertOutcome::Done(false);
        };
        let mut directory = ExtendibleHTableDirectoryPage::from_bytes(&directory_guard);
        let bucket_idx = directory.hash_to_bucket_index(hash);
        let bucket_page_id = directory.get_bucket_page_id(bucket_idx);

        if bucket_page_id == INVALID_PAGE_ID {
            let ok = self.insert_to_new_bucket(
                &mut directory,
                &mut directory_guard,
                bucket_idx,
                key,
                value,
            );
            return InsertOutcome::Done(ok);
        }

        let Some(mut bucket_guard) = self.bpm.fetch_page_write(bucket_page_id) else {
            return InsertOutcome::Done(false);
        };
        let mut bucket: ExtendibleHTableBucketPage<K, V> =
            ExtendibleHTableBucketPage::from_bytes(&bucket_guard);

        if bucket.lookup(&key).is_some() {
            return InsertOutcome::Done(false);
        }
        if !bucket.is_full() {
            bucket.insert(key, value);
            bucket.save(&mut bucket_guard);
            return InsertOutcome::Done(true);
        }

        // Full bucket: split it, then retry the insert from the top. The
        // retry may split again until the key fits or the directory is
        // exhausted.
        let local_depth = directory.get_local_depth(bucket_idx);
        if local_depth == directory.get_global_depth() {
            if directory.get_global_depth() == directory.get_max_depth() {
                debug!(
                    "hash table '{}': directory at max depth, insert fails",
                    self.index_name
                );
                return InsertOutcome::Done(false);
            }
            directory.incr_global_depth();
        }
        directory.incr_local_depth(bucket_idx);
        let new_local_depth = directory.get_local_depth(bucket_idx);
        let split_image_idx = directory.get_split_image_index(bucket_idx);

        let Some(split_basic) = self.bpm.new_page_guarded() else {
            return InsertOutcome::Done(false);
        };
        let mut split_guard = split_basic.upgrade_write();
        let split_page_id = split_guard.get_page_id();
        let mut split_bucket: ExtendibleHTableBucketPage<K, V> =
            ExtendibleHTableBucketPage::init(self.bucket_max_size);

        // Repoint every directory slot of the two groups and stamp the new
        // local depth.
        let mask = (1usize << new_local_depth) - 1;
        let bucket_pattern = bucket_idx & mask;
        let split_pattern = split_image_idx & mask;
        for i in 0..directory.size() {
            if i & mask == bucket_pattern {
                directory.set_bucket_page_id(i, bucket_page_id);
                directory.set_local_depth(i, new_local_depth as u8);
            } else if i & mask == split_pattern {
                directory.set_bucket_page_id(i, split_page_id);
                directory.set_local_depth(i, new_local_depth as u8);
            }
        }

        // Rehash: entries whose low bits now select the split image move.
        for (k, v) in bucket.take_entries() {
            let h = self.hash(&k) as usize;
            if h & mask == split_pattern {
                split_bucket.insert(k, v);
            } else {
                bucket.insert(k, v);
            }
        }

        bucket.save(&mut bucket_guard);
        split_bucket.save(&mut split_guard);
        directory.save(&mut directory_guard);
        debug!(
            "hash table '{}': split bucket {} (new image {}), local depth now {}",
            self.index_name, bucket_page_id, split_page_id, new_local_depth
        );
        InsertOutcome::Retry
    }

    fn insert_to_new_directory(
        &self,
        header: &mut ExtendibleHTableHeaderPage,
        header_guard: &mut WritePageGuard,
        directory_idx: usize,
        hash: u32,
        key: K,
        value: V,
    ) -> bool {
        let Some(directory_basic) = self.bpm.new_page_guarded() else {
            return false;
        };
        let mut directory_guard = directory_basic.upgrade_write();
        let directory_page_id = directory_guard.get_page_id();
        let mut directory = ExtendibleHTableDirectoryPage::init(self.directory_max_depth);

        let bucket_idx = directory.hash_to_bucket_index(hash);
        if !self.insert_to_new_bucket(&mut directory, &mut directory_guard, bucket_idx, key, value)
        {
            return false;
        }

        header.set_directory_page_id(directory_idx, directory_page_id);
        header.save(header_guard);
        debug!(
            "hash table '{}': created directory page {} at header slot {}",
            self.index_name, directory_page_id, directory_idx
        );
        true
    }

    fn insert_to_new_bucket(
        &self,
        directory: &mut ExtendibleHTableDirectoryPage,
        directory_guard: &mut WritePageGuard,
        bucket_idx: usize,
        key: K,
        value: V,
    ) -> bool {
        let Some(bucket_basic) = self.bpm.new_page_guarded() else {
            return false;
        };
        let mut bucket_guard = bucket_basic.upgrade_write();
        let bucket_page_id = bucket_guard.get_page_id();

        let mut bucket: ExtendibleHTableBucketPage<K, V> =
            ExtendibleHTableBucketPage::init(self.bucket_max_size);
        bucket.insert(key, value);
        bucket.save(&mut bucket_guard);

        directory.set_bucket_page_id(bucket_idx, bucket_page_id);
        directory.save(directory_guard);
        true
    }

    /// Removes a key. An emptied bucket is merged with its split image when
    /// both sit at the same local depth, recursively; afterwards the
    /// directory shrinks while every local depth is below the global depth.
    pub fn remove(&self, key: &K) -> bool {
        let hash = self.hash(key);

        let Some(header_guard) = self.bpm.fetch_page_read(self.header_page_id) else {
            return false;
        };
        let header = ExtendibleHTableHeaderPage::from_bytes(&header_guard);
        let directory_page_id =
            header.get_directory_page_id(header.hash_to_directory_index(hash));
        drop(header_guard);
        if directory_page_id == INVALID_PAGE_ID {
            return false;
        }

        let Some(mut directory_guard) = self.bpm.fetch_page_write(directory_page_id) else {
            return false;
        };
        let mut directory = ExtendibleHTableDirectoryPage::from_bytes(&directory_guard);
        let mut bucket_idx = directory.hash_to_bucket_index(hash);
        let mut bucket_page_id = directory.get_bucket_page_id(bucket_idx);
        if bucket_page_id == INVALID_PAGE_ID {
            return false;
        }

        let Some(mut bucket_guard) = self.bpm.fetch_page_write(bucket_page_id) else {
            return false;
        };
        let mut bucket: ExtendibleHTableBucketPage<K, V> =
            ExtendibleHTableBucketPage::from_bytes(&bucket_guard);
        if !bucket.remove(key) {
            return false;
        }
        bucket.save(&mut bucket_guard);

        let mut bucket_empty = bucket.is_empty();
        let mut held_guard = Some(bucket_guard);

        while bucket_empty {
            let local_depth = directory.get_local_depth(bucket_idx);
            if local_depth == 0 {
                break;
            }
            let split_image_idx = directory.get_split_image_index(bucket_idx);
            if split_image_idx >= directory.size() || split_image_idx == bucket_idx {
                break;
            }
            let split_image_page_id = directory.get_bucket_page_id(split_image_idx);
            if split_image_page_id == bucket_page_id {
                break;
            }

            if local_depth == directory.get_local_depth(split_image_idx) {
                // Merge: every slot of the vacated group points at the image
                // and both groups drop one bit of local depth.
                let mask = (1usize << local_depth) - 1;
                for i in 0..directory.size() {
                    if i & mask == bucket_idx & mask {
                        directory.set_bucket_page_id(i, split_image_page_id);
                        directory.decr_local_depth(i);
                    } else if i & mask == split_image_idx & mask {
                        directory.decr_local_depth(i);
                    }
                }
                directory.save(&mut directory_guard);

                if let Some(mut guard) = held_guard.take() {
                    guard.drop_guard();
                }
                self.bpm.delete_page(bucket_page_id);
                debug!(
                    "hash table '{}': merged bucket {} into {}",
                    self.index_name, bucket_page_id, split_image_page_id
                );
            } else if let Some(mut guard) = held_guard.take() {
                guard.drop_guard();
            }

            // The image may itself be empty now; keep merging from there.
            let Some(image_guard) = self.bpm.fetch_page_write(split_image_page_id) else {
                break;
            };
            let image: ExtendibleHTableBucketPage<K, V> =
                ExtendibleHTableBucketPage::from_bytes(&image_guard);
            if image.is_empty() {
                bucket_idx = split_image_idx;
                bucket_page_id = split_image_page_id;
                held_guard = Some(image_guard);
                bucket_empty = true;
                continue;
            }
            drop(image_guard);

            if directory.can_shrink() {
                // Before halving, adopt any empty bucket in the half about
                // to be orphaned as the next merge target.
                let mut adopted = false;
                for idx in directory.size() / 2..directory.size() {
                    let page_id = directory.get_bucket_page_id(idx);
                    if page_id == INVALID_PAGE_ID {
                        continue;
                    }
                    let Some(candidate_guard) = self.bpm.fetch_page_write(page_id) else {
                        continue;
                    };
                    let candidate: ExtendibleHTableBucketPage<K, V> =
                        ExtendibleHTableBucketPage::from_bytes(&candidate_guard);
                    if candidate.is_empty() {
                        bucket_idx = idx;
                        bucket_page_id = page_id;
                        held_guard = Some(candidate_guard);
                        adopted = true;
                        break;
                    }
                    drop(candidate_guard);
                }
                if adopted {
                    bucket_empty = true;
                    continue;
                }
                while directory.can_shrink() {
                    directory.decr_global_depth();
                }
                directory.save(&mut directory_guard);
                debug!(
                    "hash table '{}': directory shrank to global depth {}",
                    self.index_name,
                    directory.get_global_depth()
                );
            }
            break;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::logger::initialize_logger;
    use crate::storage::disk::disk_manager::MemoryDiskManager;
    use crate::storage::disk::disk_scheduler::DiskScheduler;

    fn make_bpm(pool_size: usize) -> Arc<BufferPoolManager> {
        initialize_logger();
        let disk_manager = Arc::new(MemoryDiskManager::new());
        let scheduler = Arc::new(DiskScheduler::new(disk_manager));
        Arc::new(BufferPoolManager::new(pool_size, scheduler, 2))
    }

    fn identity_table(
        bpm: Arc<BufferPoolManager>,
        header_depth: u32,
        directory_depth: u32,
        bucket_size: u32,
    ) -> DiskExtendibleHashTable<u32, u32> {
        DiskExtendibleHashTable::new(
            "test_index",
            bpm,
            HashFunction::identity(),
            header_depth,
            directory_depth,
            bucket_size,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let bpm = make_bpm(16);
        let ht: DiskExtendibleHashTable<u32, u32> = DiskExtendibleHashTable::new(
            "test_index",
            bpm,
            HashFunction::new(),
            2,
            4,
            8,
        )
        .unwrap();

        for i in 0..64 {
            assert!(ht.insert(i, i * 10), "failed to insert key {}", i);
        }
        for i in 0..64 {
            assert_eq!(ht.get_value(&i), Some(i * 10));
        }
        assert_eq!(ht.get_value(&1000), None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let bpm = make_bpm(8);
        let ht = identity_table(bpm, 0, 2, 4);
        assert!(ht.insert(1, 100));
        assert!(!ht.insert(1, 200));
        assert_eq!(ht.get_value(&1), Some(100));
    }

    #[test]
    fn test_split_raises_global_depth() {
        let bpm = make_bpm(8);
        let ht = identity_table(bpm, 0, 2, 2);

        // Two keys with low bits 0b00 fill bucket 0; the third key (0b01)
        // forces a split that raises the global depth to 1.
        assert!(ht.insert(0b00, 1));
        assert!(ht.insert(0b100, 2));
        assert!(ht.insert(0b01, 3));

        assert_eq!(ht.get_value(&0b00), Some(1));
        assert_eq!(ht.get_value(&0b100), Some(2));
        assert_eq!(ht.get_value(&0b01), Some(3));
    }

    #[test]
    fn test_insert_fails_when_directory_is_full() {
        let bpm = make_bpm(16);
        let ht = identity_table(bpm, 0, 1, 1);

        assert!(ht.insert(0, 10));
        assert!(ht.insert(1, 11));
        // Both buckets are at local depth 1 == max depth; another key with
        // low bit 0 cannot split further.
        assert!(!ht.insert(2, 12));

        assert_eq!(ht.get_value(&0), Some(10));
        assert_eq!(ht.get_value(&1), Some(11));
    }

    #[test]
    fn test_remove_round_trip() {
        let bpm = make_bpm(16);
        let ht: DiskExtendibleHashTable<u32, u32> = DiskExtendibleHashTable::new(
            "test_index",
            bpm,
            HashFunction::new(),
            1,
            4,
            4,
        )
        .unwrap();

        for i in 0..32 {
            assert!(ht.insert(i, i));
        }
        for i in 0..32 {
            assert!(ht.remove(&i), "failed to remove key {}", i);
            assert_eq!(ht.get_value(&i), None);
        }
        assert!(!ht.remove(&0));
    }

    #[test]
    fn test_merge_and_shrink_after_remove() {
        let bpm = make_bpm(16);
        let ht = identity_table(bpm, 0, 2, 2);

        // Grow to global depth 1.
        assert!(ht.insert(0, 1));
        assert!(ht.insert(4, 2));
        assert!(ht.insert(1, 3));

        // Empty the odd bucket; it merges back and the directory shrinks.
        assert!(ht.remove(&1));
        assert_eq!(ht.get_value(&0), Some(1));
        assert_eq!(ht.get_value(&4), Some(2));
        assert_eq!(ht.get_value(&1), None);

        // The table keeps working after the merge.
        assert!(ht.insert(1, 30));
        assert_eq!(ht.get_value(&1), Some(30));
    }

    #[test]
    fn test_grow_and_shrink_many() {
        let bpm = make_bpm(64);
        let ht = identity_table(bpm, 0, 6, 2);

        for i in 0..128u32 {
            assert!(ht.insert(i, i + 1));
        }
        for i in 0..128u32 {
            assert_eq!(ht.get_value(&i), Some(i + 1), "missing key {}", i);
        }
        for i in 0..128u32 {
            assert!(ht.remove(&i));
        }
        for i in 0..128u32 {
            assert_eq!(ht.get_value(&i), None);
        }
    }
}
