//! Key/value settings stored as rows of the `app_settings` table.
//!
//! Values are kept as strings: plain strings are stored raw, anything else is
//! JSON-encoded. Reading decodes JSON and falls back to the raw text, so both
//! kinds share one storage shape.
//!
//! Reads have two tiers. The store is authoritative; every `get`, `set` and
//! `delete` also updates an in-process cache that `cached` reads without a
//! store round trip. The cache is per `Settings` instance and may be stale
//! after writes made through another instance.
//!
//! ## Usage
//!
//! ```rust
//! use kelasdb::db::{memory::MemoryStore, settings::{keys, Settings}, store::Store};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.ensure_schema()?;
//! let settings = Settings::new(store);
//! settings.set(keys::ACTIVE_ACADEMIC_YEAR, &"2025/2026", None)?;
//! settings.set(keys::WORKDAYS, &json!(["senin", "selasa"]), Some("Hari kerja"))?;
//! assert_eq!(settings.get(keys::ACTIVE_ACADEMIC_YEAR)?, Some(json!("2025/2026")));
//! # Ok::<(), kelasdb::db::store::StoreError>(())
//! ```

use super::entities::Setting;
use super::record::{Fields, Record};
use super::store::{Store, StoreResult};
use super::tables::Table;
use crate::libs::messages::Message;
use crate::{msg_debug, msg_warning};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const SETTINGS_TABLE: Table = Table::AppSettings;
const KEY_FIELD: &str = "setting_key";
const VALUE_FIELD: &str = "setting_value";

/// Well-known setting keys.
pub mod keys {
    pub const ACTIVE_ACADEMIC_YEAR: &str = "tahun_ajaran_aktif";
    pub const ACTIVE_SEMESTER: &str = "semester_aktif";
    pub const PDF_FORMAT: &str = "format_pdf";
    pub const WORKDAYS: &str = "hari_kerja";
    pub const BACKUP_SCHEDULE: &str = "jadwal_backup";
    pub const QUICK_MENU: &str = "menu_cepat";
    pub const MIGRATION_LEDGER: &str = "schema_migrations";
    pub const LEGACY_BACKUP: &str = "legacy_storage_backup";
}

pub struct Settings {
    store: Arc<dyn Store>,
    cache: RwLock<HashMap<String, Value>>,
}

/// Strings are stored verbatim, other values as JSON text.
pub fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON-decodes a stored value, falling back to the raw text.
pub fn decode(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl Settings {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn shared_store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    fn rows_for(&self, key: &str) -> StoreResult<Vec<Record>> {
        let wanted = Value::String(key.to_string());
        self.store
            .select(SETTINGS_TABLE, Some(&|record: &Record| record.get(KEY_FIELD) == Some(&wanted)))
    }

    /// Decoded value for `key`, or `None` when the key has never been set.
    pub fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let rows = self.rows_for(key)?;
        let Some(raw) = rows.first().and_then(|row| row.str_field(VALUE_FIELD)) else {
            self.cache.write().remove(key);
            return Ok(None);
        };
        if serde_json::from_str::<Value>(raw).is_err() {
            msg_debug!(Message::SettingDecodedAsText(key.to_string()));
        }
        let value = decode(raw);
        self.cache.write().insert(key.to_string(), value.clone());
        Ok(Some(value))
    }

    /// Like [`Settings::get`] but never fails: read errors are logged and `default` is returned.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        match self.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                msg_warning!(Message::ReadDegraded(SETTINGS_TABLE.to_string(), e.to_string()));
                default
            }
        }
    }

    /// Typed read; a value that does not fit `T` is an error.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key`, updating the existing row if there is one.
    ///
    /// The look-up and the write happen in one store operation, so repeated
    /// or concurrent calls never create a second row for the same key.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, description: Option<&str>) -> StoreResult<()> {
        let raw = encode(&serde_json::to_value(value)?);
        let mut patch = Fields::new();
        patch.insert(VALUE_FIELD.to_string(), Value::String(raw.clone()));
        if let Some(description) = description {
            patch.insert("description".to_string(), Value::String(description.to_string()));
        }
        self.store
            .upsert_by_field(SETTINGS_TABLE, KEY_FIELD, &Value::String(key.to_string()), patch)?;
        // cache what a later `get` decodes, not the caller's value
        self.cache.write().insert(key.to_string(), decode(&raw));
        Ok(())
    }

    /// Removes every row for `key`. Missing keys are not an error.
    pub fn delete(&self, key: &str) -> StoreResult<bool> {
        let rows = self.rows_for(key)?;
        for row in &rows {
            self.store.delete(SETTINGS_TABLE, &row.id)?;
        }
        self.cache.write().remove(key);
        Ok(!rows.is_empty())
    }

    /// Every setting, decoded. Rows without a key are skipped.
    pub fn get_all(&self) -> StoreResult<BTreeMap<String, Value>> {
        let mut all = BTreeMap::new();
        for row in self.store.select(SETTINGS_TABLE, None)? {
            let Some(key) = row.str_field(KEY_FIELD) else {
                continue;
            };
            let value = row.str_field(VALUE_FIELD).map(decode).unwrap_or(Value::Null);
            all.entry(key.to_string()).or_insert(value);
        }
        Ok(all)
    }

    /// Every setting as its typed row, including descriptions.
    pub fn rows(&self) -> StoreResult<Vec<Setting>> {
        use super::entities::{Stored, TypedStore};
        Ok(self
            .store
            .select_entities::<Setting>()?
            .into_iter()
            .map(|stored: Stored<Setting>| stored.data)
            .collect())
    }

    /// Loads every setting into the synchronous cache.
    pub fn warm(&self) -> StoreResult<usize> {
        let all = self.get_all()?;
        let mut cache = self.cache.write();
        cache.clear();
        cache.extend(all);
        Ok(cache.len())
    }

    /// Cached value for `key` without touching the store.
    pub fn cached(&self, key: &str) -> Option<Value> {
        self.cache.read().get(key).cloned()
    }
}
