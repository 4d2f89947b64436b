//! One-time import from the legacy key/value storage area.
//!
//! Before the table store existed every table was kept as one JSON array
//! under the key `kelasdb_<table>` in a flat key/value area. The importer
//! moves that data into the store exactly once:
//!
//! 1. [`LegacyImporter::is_migration_needed`] reports whether any legacy table
//!    has data while its store table is still empty.
//! 2. [`LegacyImporter::migrate_data`] snapshots every legacy blob into the
//!    `legacy_storage_backup` setting, then imports the tables whose store
//!    counterpart is empty. Tables that already hold records are never touched.
//! 3. [`LegacyImporter::clear_legacy_data`] removes the legacy blobs. It is a
//!    separate, explicit step; [`LegacyImporter::restore_from_backup`] puts
//!    them back from the snapshot.
//!
//! Malformed blobs are logged and treated as empty lists.

use super::record::{new_id, now_timestamp, value_as_id, Fields, Record};
use super::settings::{keys, Settings};
use super::store::{Snapshot, Store};
use super::tables::Table;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_info, msg_success, msg_warning};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LEGACY_PREFIX: &str = "kelasdb_";

/// Tables that existed in the legacy storage layout.
pub const LEGACY_TABLES: [Table; 13] = [
    Table::Users,
    Table::Guru,
    Table::MataPelajaran,
    Table::Kelas,
    Table::Siswa,
    Table::JenisKegiatan,
    Table::Jurnal,
    Table::Kehadiran,
    Table::JenisPenilaian,
    Table::NilaiSiswa,
    Table::JamPelajaran,
    Table::JadwalPelajaran,
    Table::Pengaturan,
];

pub fn legacy_key(table: Table) -> String {
    format!("{}{}", LEGACY_PREFIX, table)
}

/// A flat string key/value area.
pub trait LegacyStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Legacy storage backed by one JSON object file of string values.
pub struct JsonFileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStorage {
    /// Opens `path`. A missing file is an empty storage; an unreadable one is
    /// logged and also treated as empty, without being overwritten until the
    /// next write.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    msg_warning!(Message::LegacyStorageUnreadable(path.display().to_string(), e.to_string()));
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path).with_context(|| format!("write {}", self.path.display()))?;
        Ok(())
    }
}

impl LegacyStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryLegacyStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryLegacyStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LegacyStorage for MemoryLegacyStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

/// Snapshot of the legacy area taken before an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyBackup {
    pub created_at: String,
    pub data: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyReport {
    pub imported: BTreeMap<Table, usize>,
    /// Tables left alone because the store already had records.
    pub skipped: Vec<Table>,
    /// Tables whose blob could not be parsed.
    pub malformed: Vec<Table>,
    pub backup_created_at: Option<String>,
}

impl LegacyReport {
    pub fn records(&self) -> usize {
        self.imported.values().sum()
    }
}

pub struct LegacyImporter<'a> {
    settings: &'a Settings,
    legacy: &'a dyn LegacyStorage,
}

/// Parsed legacy blob for one table.
enum Blob {
    Absent,
    Malformed,
    Rows(Vec<Value>),
}

impl<'a> LegacyImporter<'a> {
    pub fn new(settings: &'a Settings, legacy: &'a dyn LegacyStorage) -> Self {
        Self { settings, legacy }
    }

    fn store(&self) -> &dyn Store {
        self.settings.store()
    }

    fn read_blob(&self, table: Table) -> Result<Blob> {
        let key = legacy_key(table);
        let Some(raw) = self.legacy.get(&key)? else {
            return Ok(Blob::Absent);
        };
        match serde_json::from_str::<Vec<Value>>(&raw) {
            Ok(rows) => Ok(Blob::Rows(rows)),
            Err(e) => {
                msg_warning!(Message::LegacyBlobMalformed(key, e.to_string()));
                Ok(Blob::Malformed)
            }
        }
    }

    fn read_rows(&self, table: Table) -> Result<Vec<Value>> {
        Ok(match self.read_blob(table)? {
            Blob::Rows(rows) => rows,
            Blob::Absent | Blob::Malformed => Vec::new(),
        })
    }

    /// True when some legacy table has data and its store table is empty.
    pub fn is_migration_needed(&self) -> Result<bool> {
        for table in LEGACY_TABLES {
            if self.read_rows(table)?.is_empty() {
                continue;
            }
            if self.store().count(table, None)? == 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Legacy tables with data whose store table already has records, with
    /// that record count. An import leaves these tables alone.
    pub fn overlapping_tables(&self) -> Result<Vec<(Table, usize)>> {
        let mut overlapping = Vec::new();
        for table in LEGACY_TABLES {
            if self.read_rows(table)?.is_empty() {
                continue;
            }
            let existing = self.store().count(table, None)?;
            if existing > 0 {
                overlapping.push((table, existing));
            }
        }
        Ok(overlapping)
    }

    /// True once an import has written its snapshot.
    pub fn has_backup(&self) -> Result<bool> {
        Ok(self.settings.get(keys::LEGACY_BACKUP)?.is_some())
    }

    /// Writes a timestamped copy of every legacy table into the settings table.
    pub fn create_backup(&self) -> Result<LegacyBackup> {
        let mut data = BTreeMap::new();
        for table in LEGACY_TABLES {
            let rows = self.read_rows(table)?;
            if !rows.is_empty() {
                data.insert(table.to_string(), rows);
            }
        }
        let backup = LegacyBackup {
            created_at: now_timestamp(),
            data,
        };
        self.settings
            .set(keys::LEGACY_BACKUP, &backup, Some("Legacy storage snapshot taken before import"))?;
        msg_info!(Message::LegacyBackupCreated(backup.created_at.clone()));
        Ok(backup)
    }

    /// Imports every legacy table whose store table is empty.
    pub fn migrate_data(&self) -> Result<LegacyReport> {
        let mut report = LegacyReport::default();
        let mut snapshot = Snapshot::new();

        for table in LEGACY_TABLES {
            let rows = match self.read_blob(table)? {
                Blob::Absent => continue,
                Blob::Malformed => {
                    report.malformed.push(table);
                    continue;
                }
                Blob::Rows(rows) if rows.is_empty() => continue,
                Blob::Rows(rows) => rows,
            };

            let existing = self.store().count(table, None)?;
            if existing > 0 {
                msg_warning!(Message::LegacyTableSkipped(table.to_string(), existing));
                report.skipped.push(table);
                continue;
            }

            let records: Vec<Record> = rows.into_iter().filter_map(|row| normalize(table, row)).collect();
            snapshot.insert(table, records);
        }

        if snapshot.is_empty() {
            msg_info!(Message::LegacyNothingToMigrate);
            return Ok(report);
        }

        let backup = self.create_backup()?;
        report.backup_created_at = Some(backup.created_at);

        let summary = self.store().import_all(&snapshot).context("import legacy data")?;
        report.imported = summary.per_table;
        msg_success!(Message::LegacyMigrated(report.records()));
        Ok(report)
    }

    /// Writes the snapshot back into legacy storage. Returns the number of tables restored.
    pub fn restore_from_backup(&self) -> Result<usize> {
        let Some(value) = self.settings.get(keys::LEGACY_BACKUP)? else {
            msg_bail_anyhow!(Message::LegacyBackupMissing);
        };
        let backup: LegacyBackup = serde_json::from_value(value).context("parse legacy backup")?;
        for (table, rows) in &backup.data {
            let table: Table = table.parse()?;
            self.legacy.set(&legacy_key(table), &serde_json::to_string(rows)?)?;
        }
        msg_success!(Message::LegacyRestored(backup.data.len()));
        Ok(backup.data.len())
    }

    /// Removes every legacy blob. Returns how many keys were removed.
    pub fn clear_legacy_data(&self) -> Result<usize> {
        let present = self.legacy.keys()?;
        let mut removed = 0;
        for table in LEGACY_TABLES {
            let key = legacy_key(table);
            if present.contains(&key) {
                self.legacy.remove(&key)?;
                removed += 1;
            }
        }
        msg_success!(Message::LegacyCleared(removed));
        Ok(removed)
    }
}

/// Converts one legacy row into a record, keeping its id when it has one.
///
/// Numeric ids become strings, missing ids get a fresh one and a missing
/// `created_at` becomes now. Rows that are not objects are dropped.
pub fn normalize(table: Table, row: Value) -> Option<Record> {
    let Value::Object(mut object) = row else {
        msg_warning!(Message::LegacyRecordDropped(table.to_string()));
        return None;
    };
    let id = object.remove("id").as_ref().and_then(value_as_id).unwrap_or_else(new_id);
    let created_at = match object.remove("created_at") {
        Some(Value::String(created_at)) if !created_at.is_empty() => created_at,
        _ => now_timestamp(),
    };
    let updated_at = match object.remove("updated_at") {
        Some(Value::String(updated_at)) if !updated_at.is_empty() => Some(updated_at),
        _ => None,
    };
    let fields: Fields = object;
    Some(Record {
        id,
        created_at,
        updated_at,
        fields,
    })
}
