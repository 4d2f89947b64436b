//! Named one-shot data migrations with a persisted ledger.
//!
//! A data migration backfills a field that newer code expects on records
//! created by older versions. Each migration runs at most once per install:
//! after its body succeeds its name is appended to the ledger, an ordered
//! list stored in the `schema_migrations` setting.
//!
//! The ledger is not the only guard. Every body only touches records that
//! still lack the field, so re-running a migration whose ledger write was lost
//! is a cheap no-op scan instead of a double write.
//!
//! ## Failure handling
//!
//! A failing body is logged and left out of the ledger so the next start
//! retries it. Other pending migrations still run and startup continues.
//!
//! ## Usage
//!
//! ```rust
//! use kelasdb::db::{memory::MemoryStore, migrations::MigrationManager, settings::Settings, store::Store};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.ensure_schema()?;
//! let settings = Settings::new(store);
//! let manager = MigrationManager::new();
//! let report = manager.run_migrations(&settings);
//! assert!(report.failed.is_empty());
//! assert!(!manager.needs_migration(&settings)?);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::record::{now_timestamp, Fields, Record};
use super::settings::{keys, Settings};
use super::store::{Store, StoreError};
use super::tables::Table;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error, msg_info, msg_success, msg_warning};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Used when a student's `created_at` cannot be read as a date.
pub const DEFAULT_TANGGAL_MASUK: &str = "2024-07-15";

/// Used when no related record or setting provides an academic year.
pub const DEFAULT_TAHUN_AJARAN: &str = "2024/2025";

pub const DEFAULT_STATUS_ANGGOTA: &str = "aktif";

/// Body of a migration; returns the number of records it modified.
pub type MigrationFn = fn(&dyn Store, &Settings) -> Result<usize>;

#[derive(Debug, Clone)]
pub struct Migration {
    /// Position in the run order.
    pub version: u32,
    /// Ledger identifier; never rename a shipped migration.
    pub name: &'static str,
    pub up: MigrationFn,
}

/// One applied migration as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// `(name, records modified)` for every migration applied in this run.
    pub applied: Vec<(String, usize)>,
    /// `(name, error)` for every migration that failed and stays pending.
    pub failed: Vec<(String, String)>,
}

pub struct MigrationManager {
    migrations: Vec<Migration>,
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationManager {
    /// Manager with every shipped migration registered.
    pub fn new() -> Self {
        let mut manager = Self { migrations: Vec::new() };
        manager.register_migrations();
        manager
    }

    /// Manager running only `migrations`, in version order.
    pub fn with_migrations(mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self { migrations }
    }

    fn register_migrations(&mut self) {
        // Version 1: students gained an enrolment date
        self.add_migration(1, "siswa_tanggal_masuk", |store, _| {
            backfill(store, Table::Siswa, "tanggal_masuk", |record| {
                Value::String(enrolment_date(&record.created_at))
            })
        });

        // Version 2: grades are tagged with the academic year they belong to
        self.add_migration(2, "nilai_siswa_tahun_ajaran", |store, settings| {
            let kelas_years: HashMap<String, String> = store
                .select(Table::Kelas, None)?
                .into_iter()
                .filter_map(|kelas| {
                    let year = kelas.str_field("tahun_ajaran").filter(|y| !y.is_empty())?.to_string();
                    Some((kelas.id, year))
                })
                .collect();
            let siswa_kelas: HashMap<String, String> = store
                .select(Table::Siswa, None)?
                .into_iter()
                .filter_map(|siswa| Some((siswa.id.clone(), siswa.ref_id("kelas_id")?)))
                .collect();
            let active_year = settings
                .get(keys::ACTIVE_ACADEMIC_YEAR)?
                .and_then(|value| value.as_str().map(str::to_string))
                .filter(|year| !year.is_empty())
                .unwrap_or_else(|| DEFAULT_TAHUN_AJARAN.to_string());

            let year_of = |kelas_id: Option<String>| kelas_id.and_then(|id| kelas_years.get(&id).cloned());

            backfill(store, Table::NilaiSiswa, "tahun_ajaran", |nilai| {
                let year = year_of(nilai.ref_id("kelas_id"))
                    .or_else(|| year_of(nilai.ref_id("siswa_id").and_then(|id| siswa_kelas.get(&id).cloned())))
                    .unwrap_or_else(|| active_year.clone());
                Value::String(year)
            })
        });

        // Version 3: extracurricular memberships track an active/inactive status
        self.add_migration(3, "anggota_eskul_status", |store, _| {
            backfill(store, Table::AnggotaEskul, "status", |_| {
                Value::String(DEFAULT_STATUS_ANGGOTA.to_string())
            })
        });
    }

    fn add_migration(&mut self, version: u32, name: &'static str, up: MigrationFn) {
        self.migrations.push(Migration { version, name, up });
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Registered migrations not yet recorded in the ledger, in run order.
    pub fn pending(&self, settings: &Settings) -> Result<Vec<&Migration>> {
        let ledger = load_ledger(settings)?;
        Ok(self
            .migrations
            .iter()
            .filter(|m| !ledger.iter().any(|entry| entry.name == m.name))
            .collect())
    }

    /// Runs every pending migration. Never fails: problems are reported and
    /// the affected migrations stay pending for the next start.
    pub fn run_migrations(&self, settings: &Settings) -> MigrationReport {
        let mut report = MigrationReport::default();

        let mut ledger = match load_ledger(settings) {
            Ok(ledger) => ledger,
            Err(e) => {
                msg_warning!(Message::MigrationLedgerUnreadable(e.to_string()));
                Vec::new()
            }
        };

        let pending: Vec<&Migration> = self
            .migrations
            .iter()
            .filter(|m| !ledger.iter().any(|entry| entry.name == m.name))
            .collect();

        if pending.is_empty() {
            msg_debug!(Message::DatabaseUpToDate);
            return report;
        }

        msg_info!(Message::MigrationsFound(pending.len()));

        for migration in pending {
            msg_info!(Message::RunningMigration(migration.version, migration.name.to_string()));

            let outcome = (migration.up)(settings.store(), settings).and_then(|modified| {
                ledger.push(LedgerEntry {
                    name: migration.name.to_string(),
                    applied_at: Some(now_timestamp()),
                });
                save_ledger(settings, &ledger)
                    .with_context(|| format!("record migration {} in ledger", migration.name))?;
                Ok(modified)
            });

            match outcome {
                Ok(modified) => {
                    msg_success!(Message::MigrationCompleted(migration.version, modified));
                    report.applied.push((migration.name.to_string(), modified));
                }
                Err(e) => {
                    ledger.retain(|entry| entry.name != migration.name);
                    msg_error!(Message::MigrationFailed(migration.version, format!("{:#}", e)));
                    report.failed.push((migration.name.to_string(), format!("{:#}", e)));
                }
            }
        }

        if report.failed.is_empty() {
            msg_success!(Message::AllMigrationsCompleted);
        } else {
            msg_warning!(Message::MigrationsFinishedWithErrors(report.failed.len()));
        }

        report
    }

    pub fn is_migration_applied(&self, settings: &Settings, name: &str) -> Result<bool> {
        Ok(load_ledger(settings)?.iter().any(|entry| entry.name == name))
    }

    /// Applied migrations in ledger order as `(version, name, applied_at)`.
    ///
    /// Names no longer registered report version 0.
    pub fn get_migration_history(&self, settings: &Settings) -> Result<Vec<(u32, String, String)>> {
        Ok(load_ledger(settings)?
            .into_iter()
            .map(|entry| {
                let version = self
                    .migrations
                    .iter()
                    .find(|m| m.name == entry.name)
                    .map(|m| m.version)
                    .unwrap_or(0);
                (version, entry.name, entry.applied_at.unwrap_or_else(|| "-".to_string()))
            })
            .collect())
    }

    pub fn needs_migration(&self, settings: &Settings) -> Result<bool> {
        Ok(!self.pending(settings)?.is_empty())
    }

    /// Drops ledger entries for `version` and later so they run again (debug builds only).
    ///
    /// Data is not reverted; the bodies' field checks decide what is rewritten.
    #[cfg(debug_assertions)]
    pub fn rollback_to(&self, settings: &Settings, version: u32) -> Result<()> {
        let ledger = load_ledger(settings)?;
        let kept: Vec<LedgerEntry> = ledger
            .iter()
            .filter(|entry| {
                self.migrations
                    .iter()
                    .find(|m| m.name == entry.name)
                    .map_or(true, |m| m.version < version)
            })
            .cloned()
            .collect();

        if kept.len() == ledger.len() {
            msg_info!(Message::NothingToRollback);
            return Ok(());
        }

        save_ledger(settings, &kept)?;
        msg_success!(Message::RollbackCompleted(version));
        Ok(())
    }
}

/// Reads the ledger. The older `{ name: bool }` object form is accepted and
/// converted; only `true` entries count as applied.
pub fn load_ledger(settings: &Settings) -> Result<Vec<LedgerEntry>> {
    let ledger = match settings.get(keys::MIGRATION_LEDGER)? {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => {
            serde_json::from_value(Value::Array(entries)).context("parse migration ledger")?
        }
        Some(Value::Object(flags)) => flags
            .into_iter()
            .filter(|(_, done)| done.as_bool() == Some(true))
            .map(|(name, _)| LedgerEntry { name, applied_at: None })
            .collect(),
        Some(other) => anyhow::bail!("migration ledger has unexpected shape: {}", other),
    };
    Ok(ledger)
}

pub fn save_ledger(settings: &Settings, ledger: &[LedgerEntry]) -> Result<()> {
    settings.set(keys::MIGRATION_LEDGER, ledger, Some("Applied data migrations"))?;
    Ok(())
}

/// Sets `field` on every record of `table` that lacks it. Returns the number
/// of records written; records deleted mid-scan are skipped.
pub fn backfill(
    store: &dyn Store,
    table: Table,
    field: &str,
    mut compute: impl FnMut(&Record) -> Value,
) -> Result<usize> {
    let missing = store.select(table, Some(&|record: &Record| !record.has_field(field)))?;
    let mut modified = 0;
    for record in missing {
        let mut patch = Fields::new();
        patch.insert(field.to_string(), compute(&record));
        match store.update(table, &record.id, patch) {
            Ok(_) => modified += 1,
            Err(StoreError::NotFound { .. }) => continue,
            Err(e) => return Err(e).with_context(|| format!("backfill {}.{} for {}", table, field, record.id)),
        }
    }
    Ok(modified)
}

/// Date part of an RFC 3339 timestamp, or the fallback enrolment date.
pub fn enrolment_date(created_at: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(created_at) {
        return parsed.date_naive().format("%Y-%m-%d").to_string();
    }
    created_at
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| DEFAULT_TANGGAL_MASUK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrolment_date_uses_timestamp_date() {
        assert_eq!(enrolment_date("2023-07-17T08:30:00.000Z"), "2023-07-17");
        assert_eq!(enrolment_date("2023-07-17T23:30:00+07:00"), "2023-07-17");
        assert_eq!(enrolment_date("2022-01-03 10:00:00"), "2022-01-03");
        assert_eq!(enrolment_date("kemarin"), DEFAULT_TANGGAL_MASUK);
    }

    #[test]
    fn registered_versions_are_ascending_and_unique() {
        let manager = MigrationManager::new();
        let versions: Vec<u32> = manager.migrations().iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }
}
