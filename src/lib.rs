//! # kelasdb
//!
//! Local data store for a school administration application: students,
//! classes, teachers, grades, attendance and teaching journals.
//!
//! ## Features
//!
//! - **Table store**: schemaless records in SQLite behind one `Store` trait
//! - **Settings**: typed key/value configuration kept in the store
//! - **Data migrations**: one-shot backfills tracked in a ledger
//! - **Legacy import**: one-time transfer from the old key/value storage
//! - **Backup**: full export and atomic restore, optionally gzip-compressed
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kelasdb::commands::Cli;
//!
//! fn main() -> anyhow::Result<()> {
//!     Cli::menu()
//! }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
