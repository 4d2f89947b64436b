//! Support modules shared by the store and the command line.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kelasdb::db::db::Db;
//! use kelasdb::libs::backup::{default_path, export_document, write_document};
//! use kelasdb::libs::config::Config;
//!
//! let config = Config::read()?;
//! let db = Db::new()?;
//! let document = export_document(db.store())?;
//! write_document(&default_path(&config.backup_dir()?, config.backup().compress), &document)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod backup;
pub mod config;
pub mod data_storage;
pub mod messages;
pub mod view;
