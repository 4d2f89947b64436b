//! Configuration management for kelasdb.
//!
//! Configuration is a JSON file (`config.json`) in the platform data
//! directory resolved by [`DataStorage`]. Every section is optional; a missing
//! file or section falls back to defaults so the store runs with zero setup.
//!
//! ## Sections
//!
//! - **database**: SQLite file name and busy timeout
//! - **legacy**: file backing the legacy key/value storage area
//! - **backup**: where backups are written and whether they are gzip-compressed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kelasdb::libs::config::Config;
//!
//! let config = Config::read()?;
//! let db = config.database();
//! println!("{} ({} ms)", db.file_name, db.busy_timeout_ms);
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A section offered by the interactive setup.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// SQLite connection settings. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// File name inside the data directory.
    pub file_name: String,

    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

/// Location of the pre-table key/value storage that the legacy importer reads.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LegacyConfig {
    pub file_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct BackupConfig {
    /// Target directory for `backup export`; the data directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,

    /// Write `.json.gz` instead of plain `.json`.
    #[serde(default)]
    pub compress: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy: Option<LegacyConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            file_name: "kelasdb.db".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for LegacyConfig {
    fn default() -> Self {
        LegacyConfig {
            file_name: "legacy_storage.json".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration file, or defaults when it does not exist yet.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(&config_file_path)?;
        let config: Config =
            serde_json::from_str(&config_str).with_context(|| format!("parse {}", config_file_path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    pub fn database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }

    pub fn legacy(&self) -> LegacyConfig {
        self.legacy.clone().unwrap_or_default()
    }

    pub fn backup(&self) -> BackupConfig {
        self.backup.clone().unwrap_or_default()
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        DataStorage::new().get_path(&self.database().file_name)
    }

    pub fn legacy_path(&self) -> Result<PathBuf> {
        DataStorage::new().get_path(&self.legacy().file_name)
    }

    /// Directory for new backups, created if missing.
    pub fn backup_dir(&self) -> Result<PathBuf> {
        match self.backup().directory {
            Some(dir) if !dir.trim().is_empty() => {
                let path = PathBuf::from(dir);
                fs::create_dir_all(&path)?;
                Ok(path)
            }
            _ => {
                let storage = DataStorage::new();
                storage.get_path("")?;
                Ok(storage.base_path().to_path_buf())
            }
        }
    }

    /// Interactive setup wizard; existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "database".to_string(),
                name: "Database".to_string(),
            },
            ConfigModule {
                key: "legacy".to_string(),
                name: "Legacy storage".to_string(),
            },
            ConfigModule {
                key: "backup".to_string(),
                name: "Backup".to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "database" => {
                    let default = config.database();
                    msg_print!(Message::ConfigModuleDatabase);
                    config.database = Some(DatabaseConfig {
                        file_name: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptDatabaseFileName.to_string())
                            .default(default.file_name)
                            .interact_text()?,
                        busy_timeout_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBusyTimeout.to_string())
                            .default(default.busy_timeout_ms)
                            .interact_text()?,
                    });
                }
                "legacy" => {
                    let default = config.legacy();
                    msg_print!(Message::ConfigModuleLegacy);
                    config.legacy = Some(LegacyConfig {
                        file_name: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptLegacyFileName.to_string())
                            .default(default.file_name)
                            .interact_text()?,
                    });
                }
                "backup" => {
                    let default = config.backup();
                    msg_print!(Message::ConfigModuleBackup);
                    let directory: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptBackupDirectory.to_string())
                        .default(default.directory.unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()?;
                    config.backup = Some(BackupConfig {
                        directory: Some(directory).filter(|dir| !dir.trim().is_empty()),
                        compress: Confirm::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptBackupCompress.to_string())
                            .default(default.compress)
                            .interact()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}
