//! Catalog - the table directory.
//!
//! Maps a table identifier to its heap file and record layout. The buffer
//! pool consults it to find the page store behind a `PageId`; operators
//! consult it to type-check tuples they route into a table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::common::{Error, Result};
use crate::storage::heap_file::HeapFile;
use crate::storage::tuple::Schema;

struct TableInfo {
    name: String,
    file: Arc<HeapFile>,
}

/// Directory of all tables known to one storage engine instance.
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<u32, TableInfo>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under `name`. A table with the same id is replaced.
    pub fn add_table(&self, name: &str, file: Arc<HeapFile>) {
        let mut tables = self.tables.write();
        tables.insert(
            file.table_id(),
            TableInfo {
                name: name.to_string(),
                file,
            },
        );
    }

    /// The heap file backing `table_id`.
    pub fn file(&self, table_id: u32) -> Result<Arc<HeapFile>> {
        self.tables
            .read()
            .get(&table_id)
            .map(|t| Arc::clone(&t.file))
            .ok_or(Error::UnknownTable(table_id))
    }

    /// The record layout of `table_id`.
    pub fn schema(&self, table_id: u32) -> Result<Schema> {
        Ok(self.file(table_id)?.schema().clone())
    }

    /// The name `table_id` was registered under.
    pub fn table_name(&self, table_id: u32) -> Result<String> {
        self.tables
            .read()
            .get(&table_id)
            .map(|t| t.name.clone())
            .ok_or(Error::UnknownTable(table_id))
    }

    /// Look a table up by name.
    pub fn table_id(&self, name: &str) -> Option<u32> {
        self.tables
            .read()
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| *id)
    }

    /// Identifiers of all registered tables.
    pub fn table_ids(&self) -> Vec<u32> {
        self.tables.read().keys().copied().collect()
    }
}
