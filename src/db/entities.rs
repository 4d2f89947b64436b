//! Typed views over tables.
//!
//! The store itself is schemaless. An [`Entity`] binds a Rust struct to the
//! table it lives in, and [`TypedStore`] converts through serde so callers get
//! type-checked rows instead of raw JSON. Fields a struct does not name are
//! ignored on read, so typed and untyped callers can share a table.

use super::record::{Fields, Record};
use super::store::{Store, StoreError, StoreResult};
use super::tables::Table;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub trait Entity: Serialize + DeserializeOwned {
    const TABLE: Table;
}

/// An entity together with its store-owned envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub data: T,
}

impl<T: Entity> Stored<T> {
    pub fn from_record(record: Record) -> StoreResult<Self> {
        let data = serde_json::from_value(Value::Object(record.fields))?;
        Ok(Self {
            id: record.id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            data,
        })
    }
}

pub fn to_fields<T: Entity>(entity: &T) -> StoreResult<Fields> {
    match serde_json::to_value(entity)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::InvalidRecord {
            table: T::TABLE,
            reason: "entity does not serialize to an object".to_string(),
        }),
    }
}

pub trait TypedStore {
    fn insert_entity<T: Entity>(&self, entity: &T) -> StoreResult<Stored<T>>;
    fn select_entities<T: Entity>(&self) -> StoreResult<Vec<Stored<T>>>;
    fn entity_by_id<T: Entity>(&self, id: &str) -> StoreResult<Option<Stored<T>>>;
    fn update_entity<T: Entity>(&self, id: &str, entity: &T) -> StoreResult<Stored<T>>;
}

impl<S: Store + ?Sized> TypedStore for S {
    fn insert_entity<T: Entity>(&self, entity: &T) -> StoreResult<Stored<T>> {
        let record = self.insert(T::TABLE, to_fields(entity)?)?;
        Stored::from_record(record)
    }

    fn select_entities<T: Entity>(&self) -> StoreResult<Vec<Stored<T>>> {
        self.select(T::TABLE, None)?.into_iter().map(Stored::from_record).collect()
    }

    fn entity_by_id<T: Entity>(&self, id: &str) -> StoreResult<Option<Stored<T>>> {
        self.select_by_id(T::TABLE, id)?.map(Stored::from_record).transpose()
    }

    fn update_entity<T: Entity>(&self, id: &str, entity: &T) -> StoreResult<Stored<T>> {
        let record = self.update(T::TABLE, id, to_fields(entity)?)?;
        Stored::from_record(record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Siswa {
    pub nis: String,
    pub nama: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kelas_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jenis_kelamin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tanggal_masuk: Option<String>,
}

impl Entity for Siswa {
    const TABLE: Table = Table::Siswa;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kelas {
    pub nama_kelas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tingkat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tahun_ajaran: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wali_kelas_id: Option<String>,
}

impl Entity for Kelas {
    const TABLE: Table = Table::Kelas;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JenisKegiatan {
    pub nama_kegiatan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
}

impl Entity for JenisKegiatan {
    const TABLE: Table = Table::JenisKegiatan;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JenisPenilaian {
    pub nama_penilaian: String,
    /// Weight in percent used when averaging grades.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bobot: Option<u32>,
}

impl Entity for JenisPenilaian {
    const TABLE: Table = Table::JenisPenilaian;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub setting_key: String,
    pub setting_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Setting {
    const TABLE: Table = Table::AppSettings;
}
