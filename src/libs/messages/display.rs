//! Display implementation for kelasdb messages.
//!
//! All user-facing wording is kept here so store, migration and import code
//! only ever deals with structured [`Message`] values.

use super::types::Message;
use std::fmt;

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            // === STORE MESSAGES ===
            Message::SchemaReady(count) => format!("Schema ready ({} tables)", count),
            Message::SchemaCreateFailed(error) => format!("Failed to create database schema: {}", error),
            Message::ReadDegraded(table, error) => format!("Could not read table '{}', showing no records: {}", table, error),
            Message::UnknownTable(name) => format!("Unknown table '{}'", name),
            Message::ImportCompleted(tables, records) => format!("Imported {} records into {} tables", records, tables),
            Message::ImportAborted(error) => format!("Import aborted, no changes were applied: {}", error),

            // === SEED MESSAGES ===
            Message::SeedInserted(table, rows) => format!("Seeded {} default rows into '{}'", rows, table),
            Message::SeedSkipped(table, rows) => format!("Table '{}' already has {} rows, seeding skipped", table, rows),

            // === SETTINGS MESSAGES ===
            Message::SettingSaved(key) => format!("Setting '{}' saved", key),
            Message::SettingDeleted(key) => format!("Setting '{}' deleted", key),
            Message::SettingNotFound(key) => format!("Setting '{}' is not set", key),
            Message::SettingDecodedAsText(key) => format!("Setting '{}' is not JSON, using raw text", key),
            Message::SettingsHeader => "Settings:".to_string(),
            Message::SettingValue(key, value) => format!("{} = {}", key, value),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending data migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version, modified) => {
                format!("✓ Migration v{} completed ({} records updated)", version, modified)
            }
            Message::MigrationFailed(version, error) => {
                format!("✗ Migration v{} failed, it will be retried on next start: {}", version, error)
            }
            Message::MigrationsFinishedWithErrors(count) => format!("{} data migrations failed and remain pending", count),
            Message::AllMigrationsCompleted => "All data migrations completed successfully".to_string(),
            Message::MigrationLedgerUnreadable(error) => format!("Migration ledger is unreadable, rescanning data: {}", error),
            Message::MigrationHistory => "Migration history:".to_string(),
            Message::DatabaseUpToDate => "All data migrations are applied".to_string(),
            Message::DatabaseNeedsUpdate(count) => format!("{} data migrations are pending", count),
            Message::NothingToRollback => "Nothing to rollback".to_string(),
            Message::RollbackCompleted(version) => format!("Ledger rolled back before v{}", version),

            // === LEGACY STORAGE MESSAGES ===
            Message::LegacyDataFound => "Legacy data found. Run `kelasdb legacy migrate` to import it".to_string(),
            Message::LegacyNothingToMigrate => "No legacy data needs to be migrated".to_string(),
            Message::LegacyBlobMalformed(key, error) => format!("Legacy entry '{}' is not a valid JSON list, treating as empty: {}", key, error),
            Message::LegacyTableSkipped(table, rows) => format!("Table '{}' already has {} records, legacy data not imported", table, rows),
            Message::LegacyRecordDropped(table) => format!("Dropped a legacy '{}' entry that is not an object", table),
            Message::LegacyBackupCreated(timestamp) => format!("Legacy data backup created at {}", timestamp),
            Message::LegacyBackupMissing => "No legacy data backup exists".to_string(),
            Message::LegacyRestored(tables) => format!("Restored {} legacy tables from backup", tables),
            Message::LegacyMigrated(records) => format!("Migrated {} legacy records", records),
            Message::LegacyCleared(keys) => format!("Removed {} legacy storage entries", keys),
            Message::LegacyStorageUnreadable(path, error) => format!("Legacy storage '{}' is unreadable, treating as empty: {}", path, error),

            // === BACKUP MESSAGES ===
            Message::BackupWritten(path) => format!("Backup written to {}", path),
            Message::BackupRestored(records) => format!("Restored {} records from backup", records),
            Message::BackupVersionUnsupported(version) => format!("Unsupported backup version '{}'", version),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigDeleted => "Configuration removed, defaults will be used".to_string(),
            Message::ConfigModuleDatabase => "Database settings".to_string(),
            Message::ConfigModuleLegacy => "Legacy storage settings".to_string(),
            Message::ConfigModuleBackup => "Backup settings".to_string(),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select sections to configure".to_string(),
            Message::PromptDatabaseFileName => "Database file name".to_string(),
            Message::PromptBusyTimeout => "Busy timeout (milliseconds)".to_string(),
            Message::PromptLegacyFileName => "Legacy storage file name".to_string(),
            Message::PromptBackupDirectory => "Backup directory (empty for data directory)".to_string(),
            Message::PromptBackupCompress => "Compress backups with gzip?".to_string(),
            Message::PromptConfirmLegacyClear => "Remove all legacy storage entries? This cannot be undone".to_string(),

            // === GENERAL ===
            Message::StatusHeader(path) => format!("Database: {}", path),
            Message::OperationCancelled => "Operation cancelled".to_string(),
        };
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_failure_mentions_retry() {
        let text = Message::MigrationFailed(2, "boom".to_string()).to_string();
        assert!(text.contains("v2"));
        assert!(text.contains("retried"));
        assert!(text.ends_with("boom"));
    }
}
