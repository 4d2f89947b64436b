//! The record shape shared by every table.
//!
//! A record is the store-owned envelope (`id`, `created_at`, `updated_at`)
//! plus a free-form JSON object of table-specific fields. It serializes flat,
//! which is also the shape used by export documents and legacy storage.

use super::store::{StoreError, StoreResult};
use super::tables::Table;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

/// Table-specific fields of a record.
pub type Fields = Map<String, Value>;

/// Keys owned by the store; callers cannot set them through insert or update.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    /// A brand-new record with a fresh id and creation time.
    pub fn new(mut fields: Fields) -> Self {
        strip_reserved(&mut fields);
        Self {
            id: new_id(),
            created_at: now_timestamp(),
            updated_at: None,
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// A field counts as present unless it is absent, `null` or an empty string.
    pub fn has_field(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }

    /// Reads a cross-table reference, accepting numeric ids from older data.
    pub fn ref_id(&self, field: &str) -> Option<String> {
        self.fields.get(field).and_then(value_as_id)
    }

    /// Overlays `patch` onto the fields; keys not in the patch are kept.
    pub fn merge(&mut self, mut patch: Fields) {
        strip_reserved(&mut patch);
        for (key, value) in patch {
            self.fields.insert(key, value);
        }
    }

    /// Builds a record from an exported JSON object, keeping its id and timestamps.
    ///
    /// The `id` must be a non-empty string; `created_at` defaults to now.
    pub fn from_value(table: Table, value: Value) -> StoreResult<Self> {
        let Value::Object(mut object) = value else {
            return Err(StoreError::InvalidRecord {
                table,
                reason: "record is not a JSON object".to_string(),
            });
        };
        let id = match object.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => {
                return Err(StoreError::InvalidRecord {
                    table,
                    reason: "record has no string id".to_string(),
                })
            }
        };
        let created_at = match object.remove("created_at") {
            Some(Value::String(created_at)) => created_at,
            _ => now_timestamp(),
        };
        let updated_at = match object.remove("updated_at") {
            Some(Value::String(updated_at)) => Some(updated_at),
            _ => None,
        };
        Ok(Self {
            id,
            created_at,
            updated_at,
            fields: object,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 3);
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("created_at".to_string(), Value::String(self.created_at.clone()));
        if let Some(updated_at) = &self.updated_at {
            object.insert("updated_at".to_string(), Value::String(updated_at.clone()));
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

pub fn strip_reserved(fields: &mut Fields) {
    for key in RESERVED_FIELDS {
        fields.remove(key);
    }
}

/// Converts a `json!({...})` literal into [`Fields`]; non-objects become empty.
pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn new_id() -> String {
    Ulid::new().to_string()
}

/// Current time as RFC 3339 UTC with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
