/// Every user-facing message the application can emit.
///
/// Variants carry the dynamic parts of the text; the wording itself lives in
/// the `Display` implementation so it is defined in one place.
#[derive(Debug, Clone)]
pub enum Message {
    // === STORE MESSAGES ===
    SchemaReady(usize),             // table count
    SchemaCreateFailed(String),     // error
    ReadDegraded(String, String),   // table, error
    UnknownTable(String),
    ImportCompleted(usize, usize), // tables, records
    ImportAborted(String),         // error

    // === SEED MESSAGES ===
    SeedInserted(String, usize), // table, rows
    SeedSkipped(String, usize),  // table, existing rows

    // === SETTINGS MESSAGES ===
    SettingSaved(String),
    SettingDeleted(String),
    SettingNotFound(String),
    SettingDecodedAsText(String), // key
    SettingsHeader,
    SettingValue(String, String),

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String),    // version, name
    MigrationCompleted(u32, usize),   // version, records modified
    MigrationFailed(u32, String),     // version, error
    MigrationsFinishedWithErrors(usize),
    AllMigrationsCompleted,
    MigrationLedgerUnreadable(String), // error
    MigrationHistory,
    DatabaseUpToDate,
    DatabaseNeedsUpdate(usize), // pending count
    NothingToRollback,
    RollbackCompleted(u32),

    // === LEGACY STORAGE MESSAGES ===
    LegacyDataFound,
    LegacyNothingToMigrate,
    LegacyBlobMalformed(String, String), // key, error
    LegacyTableSkipped(String, usize),   // table, existing rows
    LegacyRecordDropped(String),         // table
    LegacyBackupCreated(String),         // timestamp
    LegacyBackupMissing,
    LegacyRestored(usize), // tables
    LegacyMigrated(usize), // records
    LegacyCleared(usize),  // keys
    LegacyStorageUnreadable(String, String), // path, error

    // === BACKUP MESSAGES ===
    BackupWritten(String), // path
    BackupRestored(usize), // records
    BackupVersionUnsupported(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigModuleDatabase,
    ConfigModuleLegacy,
    ConfigModuleBackup,

    // === PROMPTS ===
    PromptSelectModules,
    PromptDatabaseFileName,
    PromptBusyTimeout,
    PromptLegacyFileName,
    PromptBackupDirectory,
    PromptBackupCompress,
    PromptConfirmLegacyClear,

    // === GENERAL ===
    StatusHeader(String), // database path
    OperationCancelled,
}
