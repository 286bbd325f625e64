//! Index facade over the disk extendible hash table.
//!
//! Keys are single integer-typed columns encoded as `i64` into the hash
//! table's fixed-width key slot; values are RIDs. Keys are unique, so a
//! probe yields at most one RID.

use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::catalog::schema::Schema;
use crate::common::config::{HTABLE_DIRECTORY_MAX_DEPTH, HTABLE_HEADER_MAX_DEPTH};
use crate::common::exception::DBError;
use crate::common::rid::RID;
use crate::container::disk_extendible_hash_table::DiskExtendibleHashTable;
use crate::container::hash_function::HashFunction;
use crate::storage::table::tuple::Tuple;

/// Default bucket capacity for index hash tables.
const INDEX_BUCKET_MAX_SIZE: u32 = 64;

pub struct ExtendibleHashTableIndex {
    name: String,
    key_schema: Schema,
    key_attrs: Vec<usize>,
    container: DiskExtendibleHashTable<i64, RID>,
}

impl ExtendibleHashTableIndex {
    pub fn new(
        name: &str,
        key_schema: Schema,
        key_attrs: Vec<usize>,
        bpm: Arc<BufferPoolManager>,
    ) -> Result<Self, DBError> {
        if key_attrs.len() != 1 {
            return Err(DBError::NotImplemented(
                "hash indexes support exactly one key column".into(),
            ));
        }
        let container = DiskExtendibleHashTable::new(
            name,
            bpm,
            HashFunction::new(),
            HTABLE_HEADER_MAX_DEPTH,
            HTABLE_DIRECTORY_MAX_DEPTH,
            INDEX_BUCKET_MAX_SIZE,
        )?;
        Ok(Self {
            name: name.to_string(),
            key_schema,
            key_attrs,
            container,
        })
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_key_schema(&self) -> &Schema {
        &self.key_schema
    }

    pub fn get_key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    fn encode_key(&self, key: &Tuple) -> Option<i64> {
        key.get_value(0).as_i64()
    }

    pub fn insert_entry(&self, key: &Tuple, rid: RID) -> bool {
        match self.encode_key(key) {
            Some(k) => self.container.insert(k, rid),
            None => false,
        }
    }

    pub fn delete_entry(&self, key: &Tuple, _rid: RID) -> bool {
        match self.encode_key(key) {
            Some(k) => self.container.remove(&k),
            None => false,
        }
    }

    /// Appends every RID stored under `key` (zero or one, keys are unique).
    pub fn scan_key(&self, key: &Tuple, result: &mut Vec<RID>) {
        if let Some(k) = self.encode_key(key) {
            if let Some(rid) = self.container.get_value(&k) {
                result.push(rid);
            }
        }
    }
}
