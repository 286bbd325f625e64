//! Catalog: registry of tables and indexes.

use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use crate::buffer::buffer_pool_manager::BufferPoolManager;
use crate::catalog::schema::Schema;
use crate::common::config::{IndexOid, TableOid};
use crate::common::exception::DBError;
use crate::storage::index::extendible_hash_table_index::ExtendibleHashTableIndex;
use crate::storage::table::table_heap::TableHeap;

pub struct TableInfo {
    schema: Schema,
    name: String,
    table: Arc<TableHeap>,
    oid: TableOid,
}

impl TableInfo {
    pub fn get_schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_table_heap(&self) -> Arc<TableHeap> {
        Arc::clone(&self.table)
    }

    pub fn get_table_oid(&self) -> TableOid {
        self.oid
    }
}

pub struct IndexInfo {
    key_schema: Schema,
    name: String,
    index: Arc<ExtendibleHashTableIndex>,
    index_oid: IndexOid,
    table_name: String,
    key_attrs: Vec<usize>,
}

impl IndexInfo {
    pub fn get_key_schema(&self) -> &Schema {
        &self.key_schema
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_index(&self) -> Arc<ExtendibleHashTableIndex> {
        Arc::clone(&self.index)
    }

    pub fn get_index_oid(&self) -> IndexOid {
        self.index_oid
    }

    pub fn get_table_name(&self) -> &str {
        &self.table_name
    }

    pub fn get_key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }
}

pub struct Catalog {
    bpm: Arc<BufferPoolManager>,
    tables: HashMap<TableOid, Arc<TableInfo>>,
    table_names: HashMap<String, TableOid>,
    next_table_oid: TableOid,
    indexes: HashMap<IndexOid, Arc<IndexInfo>>,
    /// table name -> index name -> index oid
    index_names: HashMap<String, HashMap<String, IndexOid>>,
    next_index_oid: IndexOid,
}

impl Catalog {
    pub fn new(bpm: Arc<BufferPoolManager>) -> Self {
        Self {
            bpm,
            tables: HashMap::new(),
            table_names: HashMap::new(),
            next_table_oid: 0,
            indexes: HashMap::new(),
            index_names: HashMap::new(),
            next_index_oid: 0,
        }
    }

    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<Arc<TableInfo>, DBError> {
        if self.table_names.contains_key(name) {
            return Err(DBError::Catalog(format!("table {} already exists", name)));
        }
        let oid = self.next_table_oid;
        self.next_table_oid += 1;

        let info = Arc::new(TableInfo {
            schema,
            name: name.to_string(),
            table: Arc::new(TableHeap::new()),
            oid,
        });
        self.tables.insert(oid, Arc::clone(&info));
        self.table_names.insert(name.to_string(), oid);
        self.index_names.entry(name.to_string()).or_default();
        debug!("created table '{}' with oid {}", name, oid);
        Ok(info)
    }

    /// Creates a hash index over a single key column of an existing table.
    /// Existing tuples are not back-filled; the caller populates the index.
    pub fn create_index(
        &mut self,
        index_name: &str,
        table_name: &str,
        key_attrs: Vec<usize>,
    ) -> Result<Arc<IndexInfo>, DBError> {
        let table = self
            .get_table_by_name(table_name)
            .ok_or_else(|| DBError::Catalog(format!("table {} does not exist", table_name)))?;
        let table_indexes = self.index_names.entry(table_name.to_string()).or_default();
        if table_indexes.contains_key(index_name) {
            return Err(DBError::Catalog(format!(
                "index {} already exists on {}",
                index_name, table_name
            )));
        }

        let key_schema = Schema::copy_schema(table.get_schema(), &key_attrs);
        let index = Arc::new(ExtendibleHashTableIndex::new(
            index_name,
            key_schema.clone(),
            key_attrs.clone(),
            Arc::clone(&self.bpm),
        )?);

        let index_oid = self.next_index_oid;
        self.next_index_oid += 1;
        let info = Arc::new(IndexInfo {
            key_schema,
            name: index_name.to_string(),
            index,
            index_oid,
            table_name: table_name.to_string(),
            key_attrs,
        });
        self.indexes.insert(index_oid, Arc::clone(&info));
        self.index_names
            .get_mut(table_name)
            .unwrap()
            .insert(index_name.to_string(), index_oid);
        debug!(
            "created index '{}' on table '{}' with oid {}",
            index_name, table_name, index_oid
        );
        Ok(info)
    }

    pub fn get_table(&self, oid: TableOid) -> Option<Arc<TableInfo>> {
        self.tables.get(&oid).cloned()
    }

    pub fn get_table_by_name(&self, name: &str) -> Option<Arc<TableInfo>> {
        let oid = self.table_names.get(name)?;
        self.tables.get(oid).cloned()
    }

    pub fn get_index(&self, oid: IndexOid) -> Option<Arc<IndexInfo>> {
        self.indexes.get(&oid).cloned()
    }

    pub fn get_table_indexes(&self, table_name: &str) -> Vec<Arc<IndexInfo>> {
        match self.index_names.get(table_name) {
            Some(names) => names
                .values()
                .filter_map(|oid| self.indexes.get(oid).cloned())
                .collect(),
            None => Vec::new(),
        }
    }
}
