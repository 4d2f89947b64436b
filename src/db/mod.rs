//! Persistence layer for the school administration data.
//!
//! Every table is a collection of schemaless [`record::Record`]s behind the
//! [`store::Store`] trait. Two backends implement it: [`sqlite::SqliteStore`]
//! for the application and [`memory::MemoryStore`] for tests and tools.
//! The layers above the store never know which one they are talking to.
//!
//! ## Usage
//!
//! ```rust
//! use kelasdb::db::{db::Db, settings::keys, store::Store, tables::Table};
//!
//! let db = Db::in_memory()?;
//! assert_eq!(db.store().count(Table::JenisKegiatan, None)?, 5);
//! db.settings().set(keys::ACTIVE_SEMESTER, &"ganjil", None)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Store bootstrap: schema, seed data, migrations and legacy check.
pub mod db;

/// Typed entity structs and the serde bridge to records.
pub mod entities;

/// One-time import from the legacy key/value storage area.
pub mod legacy;

pub mod memory;

/// Named data migrations tracked in a persisted ledger.
pub mod migrations;

pub mod record;

/// Default reference rows.
pub mod seed;

/// Key/value settings on top of the `app_settings` table.
pub mod settings;

/// SQLite backend.
pub mod sqlite;

/// The store contract shared by every backend.
pub mod store;

pub mod tables;
