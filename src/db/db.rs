//! Opening the store and bringing it up to date.
//!
//! `Db::bootstrap` is the single startup path shared by the CLI and tests:
//!
//! 1. create missing tables (a failure here is fatal),
//! 2. seed the reference tables when they are empty,
//! 3. load settings into the cache,
//! 4. run pending data migrations (failures are reported, not returned),
//! 5. check whether legacy storage still holds data to import, and which of
//!    its tables an import would skip.

use super::legacy::{JsonFileStorage, LegacyImporter, LegacyStorage};
use super::memory::MemoryStore;
use super::migrations::{MigrationManager, MigrationReport};
use super::seed::seed_defaults;
use super::settings::Settings;
use super::sqlite::SqliteStore;
use super::store::Store;
use super::tables::Table;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_error, msg_info, msg_warning};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// What happened while opening a [`Db`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    pub seeded: usize,
    pub settings_cached: usize,
    pub migrations: MigrationReport,
    /// Legacy storage has data whose tables are still empty.
    pub legacy_pending: bool,
    /// Legacy tables that an import would skip because the store table
    /// already has records, typically the seeded reference tables. Only
    /// filled before the first import.
    pub legacy_skipped: Vec<Table>,
}

pub struct Db {
    store: Arc<dyn Store>,
    settings: Settings,
    report: StartupReport,
}

impl Db {
    /// Opens the configured SQLite file in the data directory and checks the
    /// configured legacy storage file.
    pub fn new() -> Result<Db> {
        let config = Config::read()?;
        let path = config.database_path()?;
        let store = SqliteStore::open(&path, config.database().busy_timeout())
            .with_context(|| format!("open database {}", path.display()))?;
        let legacy = JsonFileStorage::open(&config.legacy_path()?)?;
        Self::from_store(Arc::new(store), Some(&legacy))
    }

    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Db> {
        let store = SqliteStore::open(path, busy_timeout).with_context(|| format!("open database {}", path.display()))?;
        Self::from_store(Arc::new(store), None)
    }

    pub fn in_memory() -> Result<Db> {
        Self::from_store(Arc::new(MemoryStore::new()), None)
    }

    /// Bootstraps an already opened store. `legacy` is only inspected, never imported.
    pub fn from_store(store: Arc<dyn Store>, legacy: Option<&dyn LegacyStorage>) -> Result<Db> {
        let settings = Settings::new(Arc::clone(&store));
        let mut db = Db {
            store,
            settings,
            report: StartupReport::default(),
        };
        db.report = db.bootstrap(legacy)?;
        Ok(db)
    }

    fn bootstrap(&self, legacy: Option<&dyn LegacyStorage>) -> Result<StartupReport> {
        let mut report = StartupReport::default();

        if let Err(e) = self.store.ensure_schema() {
            msg_error!(Message::SchemaCreateFailed(e.to_string()));
            return Err(e).context("create database schema");
        }
        msg_debug!(Message::SchemaReady(Table::ALL.len()));

        report.seeded = seed_defaults(self.store.as_ref()).context("seed default data")?;

        report.settings_cached = match self.settings.warm() {
            Ok(count) => count,
            Err(e) => {
                msg_warning!(Message::ReadDegraded(Table::AppSettings.to_string(), e.to_string()));
                0
            }
        };

        report.migrations = MigrationManager::new().run_migrations(&self.settings);

        if let Some(legacy) = legacy {
            if let Err(e) = self.check_legacy(legacy, &mut report) {
                msg_warning!(Message::LegacyStorageUnreadable("legacy".to_string(), format!("{:#}", e)));
            }
        }

        Ok(report)
    }

    fn check_legacy(&self, legacy: &dyn LegacyStorage, report: &mut StartupReport) -> Result<()> {
        let importer = LegacyImporter::new(&self.settings, legacy);
        if importer.is_migration_needed()? {
            msg_info!(Message::LegacyDataFound);
            report.legacy_pending = true;
        }
        if !importer.has_backup()? {
            for (table, existing) in importer.overlapping_tables()? {
                msg_warning!(Message::LegacyTableSkipped(table.to_string(), existing));
                report.legacy_skipped.push(table);
            }
        }
        Ok(())
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn report(&self) -> &StartupReport {
        &self.report
    }
}
