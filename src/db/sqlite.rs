//! SQLite backend for the [`Store`] contract.
//!
//! Each [`Table`] becomes one SQL table holding the store-owned columns and
//! the table-specific fields as a JSON document:
//!
//! ```text
//! id TEXT PRIMARY KEY | created_at TEXT | updated_at TEXT | data TEXT (JSON object)
//! ```
//!
//! The connection sits behind a mutex, so one `SqliteStore` can be shared
//! across threads through an `Arc`. Read-merge-write operations (`update`,
//! `upsert_by_field`) run inside a single transaction while holding the lock.

use super::record::{now_timestamp, strip_reserved, Fields, Record};
use super::store::{validate_import_record, Filter, ImportSummary, Snapshot, Store, StoreError, StoreResult};
use super::tables::Table;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn schema_sql(table: Table) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
    id TEXT NOT NULL PRIMARY KEY,
    created_at TEXT NOT NULL,
    updated_at TEXT,
    data TEXT NOT NULL DEFAULT '{{}}'
);
CREATE INDEX IF NOT EXISTS \"idx_{table}_created_at\" ON \"{table}\"(created_at);"
    )
}

fn select_sql(table: Table) -> String {
    format!("SELECT id, created_at, updated_at, data FROM \"{table}\"")
}

fn select_by_id_sql(table: Table) -> String {
    format!("SELECT id, created_at, updated_at, data FROM \"{table}\" WHERE id = ?1")
}

fn insert_sql(table: Table) -> String {
    format!("INSERT INTO \"{table}\" (id, created_at, updated_at, data) VALUES (?1, ?2, ?3, ?4)")
}

fn put_sql(table: Table) -> String {
    format!("INSERT OR REPLACE INTO \"{table}\" (id, created_at, updated_at, data) VALUES (?1, ?2, ?3, ?4)")
}

fn update_sql(table: Table) -> String {
    format!("UPDATE \"{table}\" SET updated_at = ?2, data = ?3 WHERE id = ?1")
}

fn delete_sql(table: Table) -> String {
    format!("DELETE FROM \"{table}\" WHERE id = ?1")
}

fn clear_sql(table: Table) -> String {
    format!("DELETE FROM \"{table}\"")
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path, busy_timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Names of the tables that currently exist in the database file.
    pub fn existing_tables(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?.collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Raw columns of one row; the JSON is decoded outside the rusqlite callback.
struct RawRow {
    id: String,
    created_at: String,
    updated_at: Option<String>,
    data: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            updated_at: row.get(2)?,
            data: row.get(3)?,
        })
    }

    fn into_record(self) -> StoreResult<Record> {
        let fields: Fields = serde_json::from_str(&self.data)?;
        Ok(Record {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields,
        })
    }
}

fn fetch_all(conn: &Connection, table: Table) -> StoreResult<Vec<Record>> {
    let mut stmt = conn.prepare(&select_sql(table))?;
    let rows = stmt.query_map([], RawRow::from_row)?.collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(RawRow::into_record).collect()
}

fn fetch_one(conn: &Connection, table: Table, id: &str) -> StoreResult<Option<Record>> {
    conn.query_row(&select_by_id_sql(table), params![id], RawRow::from_row)
        .optional()?
        .map(RawRow::into_record)
        .transpose()
}

/// Maps SQLite's "no such table" failure onto [`StoreError::TableMissing`].
fn missing_table<E: Into<StoreError>>(table: Table) -> impl Fn(E) -> StoreError {
    move |e| match e.into() {
        StoreError::StorageUnavailable(rusqlite::Error::SqliteFailure(_, Some(message)))
            if message.starts_with("no such table") =>
        {
            StoreError::TableMissing(table)
        }
        other => other,
    }
}

fn write_record(conn: &Connection, sql: &str, record: &Record) -> StoreResult<()> {
    let data = serde_json::to_string(&record.fields)?;
    conn.execute(sql, params![record.id, record.created_at, record.updated_at, data])?;
    Ok(())
}

fn write_update(conn: &Connection, table: Table, record: &Record) -> StoreResult<()> {
    let data = serde_json::to_string(&record.fields)?;
    conn.execute(&update_sql(table), params![record.id, record.updated_at, data])?;
    Ok(())
}

impl Store for SqliteStore {
    fn ensure_schema(&self) -> StoreResult<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for table in Table::ALL {
            tx.execute_batch(&schema_sql(table))?;
        }
        tx.commit()?;
        Ok(())
    }

    fn select(&self, table: Table, filter: Option<Filter<'_>>) -> StoreResult<Vec<Record>> {
        let records = {
            let conn = self.conn.lock();
            fetch_all(&conn, table).map_err(missing_table(table))?
        };
        Ok(match filter {
            Some(filter) => records.into_iter().filter(|record| filter(record)).collect(),
            None => records,
        })
    }

    fn select_by_id(&self, table: Table, id: &str) -> StoreResult<Option<Record>> {
        let conn = self.conn.lock();
        fetch_one(&conn, table, id).map_err(missing_table(table))
    }

    fn insert(&self, table: Table, fields: Fields) -> StoreResult<Record> {
        let record = Record::new(fields);
        let conn = self.conn.lock();
        write_record(&conn, &insert_sql(table), &record).map_err(missing_table(table))?;
        Ok(record)
    }

    fn update(&self, table: Table, id: &str, patch: Fields) -> StoreResult<Record> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut record = fetch_one(&tx, table, id)
            .map_err(missing_table(table))?
            .ok_or_else(|| StoreError::NotFound {
            table,
            id: id.to_string(),
        })?;
        record.merge(patch);
        record.updated_at = Some(now_timestamp());
        write_update(&tx, table, &record)?;
        tx.commit()?;
        Ok(record)
    }

    fn delete(&self, table: Table, id: &str) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(&delete_sql(table), params![id])
            .map_err(missing_table(table))?;
        Ok(())
    }

    fn clear(&self, table: Table) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(&clear_sql(table), []).map_err(missing_table(table))?;
        Ok(())
    }

    fn put(&self, table: Table, record: Record) -> StoreResult<()> {
        let conn = self.conn.lock();
        write_record(&conn, &put_sql(table), &record).map_err(missing_table(table))
    }

    fn upsert_by_field(&self, table: Table, field: &str, value: &Value, mut patch: Fields) -> StoreResult<Record> {
        strip_reserved(&mut patch);
        patch.insert(field.to_string(), value.clone());

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let existing = fetch_all(&tx, table)
            .map_err(missing_table(table))?
            .into_iter()
            .find(|record| record.get(field) == Some(value));
        let record = match existing {
            Some(mut record) => {
                record.merge(patch);
                record.updated_at = Some(now_timestamp());
                write_update(&tx, table, &record)?;
                record
            }
            None => {
                let record = Record::new(patch);
                write_record(&tx, &insert_sql(table), &record)?;
                record
            }
        };
        tx.commit()?;
        Ok(record)
    }

    fn import_all(&self, data: &Snapshot) -> StoreResult<ImportSummary> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut summary = ImportSummary::default();
        for (&table, records) in data {
            let sql = put_sql(table);
            for record in records {
                validate_import_record(table, record)?;
                write_record(&tx, &sql, record).map_err(|e| StoreError::ImportFailed {
                    table,
                    record_id: record.id.clone(),
                    reason: e.to_string(),
                })?;
            }
            summary.per_table.insert(table, records.len());
        }
        tx.commit()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::record::fields;
    use serde_json::json;

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
    }

    #[test]
    fn ensure_schema_creates_every_table_once() {
        let store = store();
        store.ensure_schema().unwrap();
        let names = store.existing_tables().unwrap();
        for table in Table::ALL {
            assert!(names.iter().any(|name| name == table.as_str()), "missing {table}");
        }
    }

    #[test]
    fn select_without_schema_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.select(Table::Kelas, None),
            Err(StoreError::TableMissing(Table::Kelas))
        ));
        assert!(matches!(
            store.delete(Table::Kelas, "k1"),
            Err(StoreError::TableMissing(Table::Kelas))
        ));
        assert!(matches!(
            store.upsert_by_field(Table::AppSettings, "setting_key", &json!("a"), Fields::new()),
            Err(StoreError::TableMissing(Table::AppSettings))
        ));
        assert!(store.select_lenient(Table::Kelas, None).is_empty());
    }

    #[test]
    fn corrupt_data_column_surfaces_as_serialization_error() {
        let store = store();
        {
            let conn = store.conn.lock();
            conn.execute(
                "INSERT INTO \"kelas\" (id, created_at, data) VALUES ('k1', '2024-01-01T00:00:00Z', 'not json')",
                [],
            )
            .unwrap();
        }
        assert!(matches!(store.select(Table::Kelas, None), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn import_rolls_back_every_table_on_failure() {
        let store = store();
        let good = Record::new(fields(json!({"nama": "X-A"})));
        let mut bad = Record::new(fields(json!({"nama": "Ani"})));
        bad.id.clear();

        let mut data = Snapshot::new();
        data.insert(Table::Kelas, vec![good]);
        data.insert(Table::Siswa, vec![bad]);

        let err = store.import_all(&data).unwrap_err();
        assert!(matches!(err, StoreError::ImportFailed { table: Table::Siswa, .. }));
        assert_eq!(store.count(Table::Kelas, None).unwrap(), 0);
    }
}
