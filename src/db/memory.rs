//! In-memory backend for the [`Store`] contract.
//!
//! Behaves like [`super::sqlite::SqliteStore`] without touching disk: tables
//! must be created by `ensure_schema` first, and `import_all` stages its
//! writes on a copy that is swapped in only when every record succeeded.

use super::record::{now_timestamp, strip_reserved, Fields, Record};
use super::store::{validate_import_record, Filter, ImportSummary, Snapshot, Store, StoreError, StoreResult};
use super::tables::Table;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;

type Rows = BTreeMap<String, Record>;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<Table, Rows>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn rows_mut(tables: &mut BTreeMap<Table, Rows>, table: Table) -> StoreResult<&mut Rows> {
    tables.get_mut(&table).ok_or(StoreError::TableMissing(table))
}

impl Store for MemoryStore {
    fn ensure_schema(&self) -> StoreResult<()> {
        let mut tables = self.tables.write();
        for table in Table::ALL {
            tables.entry(table).or_default();
        }
        Ok(())
    }

    fn select(&self, table: Table, filter: Option<Filter<'_>>) -> StoreResult<Vec<Record>> {
        let tables = self.tables.read();
        let rows = tables.get(&table).ok_or(StoreError::TableMissing(table))?;
        Ok(rows
            .values()
            .filter(|record| filter.map_or(true, |keep| keep(*record)))
            .cloned()
            .collect())
    }

    fn select_by_id(&self, table: Table, id: &str) -> StoreResult<Option<Record>> {
        let tables = self.tables.read();
        let rows = tables.get(&table).ok_or(StoreError::TableMissing(table))?;
        Ok(rows.get(id).cloned())
    }

    fn insert(&self, table: Table, fields: Fields) -> StoreResult<Record> {
        let mut tables = self.tables.write();
        let rows = rows_mut(&mut tables, table)?;
        let record = Record::new(fields);
        rows.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, table: Table, id: &str, patch: Fields) -> StoreResult<Record> {
        let mut tables = self.tables.write();
        let rows = rows_mut(&mut tables, table)?;
        let record = rows.get_mut(id).ok_or_else(|| StoreError::NotFound {
            table,
            id: id.to_string(),
        })?;
        record.merge(patch);
        record.updated_at = Some(now_timestamp());
        Ok(record.clone())
    }

    fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        rows_mut(&mut tables, table)?.remove(id);
        Ok(())
    }

    fn clear(&self, table: Table) -> StoreResult<()> {
        let mut tables = self.tables.write();
        rows_mut(&mut tables, table)?.clear();
        Ok(())
    }

    fn put(&self, table: Table, record: Record) -> StoreResult<()> {
        let mut tables = self.tables.write();
        rows_mut(&mut tables, table)?.insert(record.id.clone(), record);
        Ok(())
    }

    fn upsert_by_field(&self, table: Table, field: &str, value: &Value, mut patch: Fields) -> StoreResult<Record> {
        strip_reserved(&mut patch);
        patch.insert(field.to_string(), value.clone());

        let mut tables = self.tables.write();
        let rows = rows_mut(&mut tables, table)?;
        if let Some(record) = rows.values_mut().find(|record| record.get(field) == Some(value)) {
            record.merge(patch);
            record.updated_at = Some(now_timestamp());
            return Ok(record.clone());
        }
        let record = Record::new(patch);
        rows.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn import_all(&self, data: &Snapshot) -> StoreResult<ImportSummary> {
        let mut tables = self.tables.write();
        let mut staged = tables.clone();
        let mut summary = ImportSummary::default();
        for (&table, records) in data {
            let rows = staged.get_mut(&table).ok_or_else(|| StoreError::ImportFailed {
                table,
                record_id: records.first().map(|r| r.id.clone()).unwrap_or_default(),
                reason: StoreError::TableMissing(table).to_string(),
            })?;
            for record in records {
                validate_import_record(table, record)?;
                rows.insert(record.id.clone(), record.clone());
            }
            summary.per_table.insert(table, records.len());
        }
        *tables = staged;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::record::fields;
    use serde_json::json;

    #[test]
    fn operations_before_schema_fail() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.insert(Table::Guru, Fields::new()),
            Err(StoreError::TableMissing(Table::Guru))
        ));
        assert!(store.select_lenient(Table::Guru, None).is_empty());
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let store = MemoryStore::new();
        store.ensure_schema().unwrap();
        let existing = store.insert(Table::Kelas, fields(json!({"nama": "VII-A"}))).unwrap();

        let mut replacement = existing.clone();
        replacement.merge(fields(json!({"nama": "VII-B"})));
        let mut broken = Record::new(Fields::new());
        broken.created_at.clear();

        let mut data = Snapshot::new();
        data.insert(Table::Kelas, vec![replacement]);
        data.insert(Table::Siswa, vec![broken]);

        assert!(store.import_all(&data).is_err());
        let kept = store.select_by_id(Table::Kelas, &existing.id).unwrap().unwrap();
        assert_eq!(kept.str_field("nama"), Some("VII-A"));
    }
}
