//! The table-agnostic store contract.
//!
//! Every component that persists data receives a [`Store`] (usually as
//! `Arc<dyn Store>`), so the SQLite backend and the in-memory backend are
//! interchangeable. Each operation is independently transactional at the
//! table level; [`Store::import_all`] is the only multi-table operation and
//! it applies all or nothing.
//!
//! ## Usage
//!
//! ```rust
//! use kelasdb::db::{memory::MemoryStore, record::fields, store::Store, tables::Table};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.ensure_schema()?;
//! let siswa = store.insert(Table::Siswa, fields(json!({"nama": "Ani"})))?;
//! let found = store.select_by_id(Table::Siswa, &siswa.id)?;
//! assert_eq!(found, Some(siswa));
//! # Ok::<(), kelasdb::db::store::StoreError>(())
//! ```

use super::record::{Fields, Record};
use super::tables::Table;
use crate::libs::messages::Message;
use crate::msg_warning;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// In-memory predicate applied to each record of a table.
pub type Filter<'a> = &'a dyn Fn(&Record) -> bool;

/// Every table's records, keyed by table.
pub type Snapshot = BTreeMap<Table, Vec<Record>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record '{id}' not found in table '{table}'")]
    NotFound { table: Table, id: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("table '{0}' does not exist, schema was not initialised")]
    TableMissing(Table),

    #[error("malformed record data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid record for table '{table}': {reason}")]
    InvalidRecord { table: Table, reason: String },

    #[error("import failed at '{table}' record '{record_id}', nothing was applied: {reason}")]
    ImportFailed {
        table: Table,
        record_id: String,
        reason: String,
    },

    #[error("unknown table '{0}'")]
    UnknownTable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub per_table: BTreeMap<Table, usize>,
}

impl ImportSummary {
    pub fn tables(&self) -> usize {
        self.per_table.len()
    }

    pub fn records(&self) -> usize {
        self.per_table.values().sum()
    }
}

pub trait Store: Send + Sync {
    /// Creates any missing table. Safe to call on every start.
    fn ensure_schema(&self) -> StoreResult<()>;

    /// All records of `table` matching `filter`, in no particular order.
    fn select(&self, table: Table, filter: Option<Filter<'_>>) -> StoreResult<Vec<Record>>;

    fn select_by_id(&self, table: Table, id: &str) -> StoreResult<Option<Record>>;

    /// Stores `fields` under a fresh id. Caller-supplied `id`, `created_at`
    /// and `updated_at` keys are discarded.
    fn insert(&self, table: Table, fields: Fields) -> StoreResult<Record>;

    /// Overlays `patch` onto the stored record and stamps `updated_at`.
    fn update(&self, table: Table, id: &str, patch: Fields) -> StoreResult<Record>;

    /// Removes the record; removing an absent id succeeds.
    fn delete(&self, table: Table, id: &str) -> StoreResult<()>;

    fn clear(&self, table: Table) -> StoreResult<()>;

    /// Writes `record` as-is, replacing any record with the same id.
    fn put(&self, table: Table, record: Record) -> StoreResult<()>;

    /// Atomically updates the first record whose `field` equals `value`, or
    /// inserts `patch` plus `field = value` when none matches.
    fn upsert_by_field(&self, table: Table, field: &str, value: &Value, patch: Fields) -> StoreResult<Record>;

    /// Puts every record of every listed table in one unit of work.
    fn import_all(&self, data: &Snapshot) -> StoreResult<ImportSummary>;

    /// Like [`Store::select`] but a read failure is logged and reported as no records.
    fn select_lenient(&self, table: Table, filter: Option<Filter<'_>>) -> Vec<Record> {
        match self.select(table, filter) {
            Ok(records) => records,
            Err(e) => {
                msg_warning!(Message::ReadDegraded(table.to_string(), e.to_string()));
                Vec::new()
            }
        }
    }

    fn count(&self, table: Table, filter: Option<Filter<'_>>) -> StoreResult<usize> {
        Ok(self.select(table, filter)?.len())
    }

    /// Snapshot of every table, empty tables included.
    fn export_all(&self) -> StoreResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        for table in Table::ALL {
            snapshot.insert(table, self.select(table, None)?);
        }
        Ok(snapshot)
    }
}

/// Rejects records that cannot be stored as-is during an import.
pub(crate) fn validate_import_record(table: Table, record: &Record) -> StoreResult<()> {
    if record.id.is_empty() {
        return Err(StoreError::ImportFailed {
            table,
            record_id: String::new(),
            reason: "record id is empty".to_string(),
        });
    }
    if record.created_at.is_empty() {
        return Err(StoreError::ImportFailed {
            table,
            record_id: record.id.clone(),
            reason: "created_at is empty".to_string(),
        });
    }
    Ok(())
}
