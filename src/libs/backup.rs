//! Full-store backup and restore through an export document.
//!
//! An export document is one JSON object:
//!
//! ```json
//! { "exportDate": "2025-01-15T08:00:00.000Z", "version": "2.0", "data": { "siswa": [ ... ] } }
//! ```
//!
//! `data` holds every table, empty ones included. Version `2.0` is written;
//! `1.0` documents have the same shape and are still accepted on restore.
//! Paths ending in `.gz` are gzip-compressed on write and decompressed on read.
//!
//! Restore is all or nothing: the document is fully decoded before anything
//! is written, and the write itself is one [`Store::import_all`] call.
//! Records already in the store are overwritten by id; other records are kept.

use crate::db::record::{now_timestamp, value_as_id, Record};
use crate::db::store::{ImportSummary, Snapshot, Store};
use crate::db::tables::Table;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_debug, msg_error, msg_warning};
use anyhow::{Context, Result};
use chrono::Local;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const EXPORT_VERSION: &str = "2.0";
pub const SUPPORTED_VERSIONS: [&str; 2] = ["1.0", "2.0"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: String,
    pub version: String,
    pub data: BTreeMap<String, Vec<Value>>,
}

/// Snapshot of every table as an export document.
pub fn export_document(store: &dyn Store) -> Result<ExportDocument> {
    let snapshot = store.export_all().context("read tables for export")?;
    let data = snapshot
        .into_iter()
        .map(|(table, records)| (table.to_string(), records.iter().map(Record::to_value).collect()))
        .collect();
    Ok(ExportDocument {
        export_date: now_timestamp(),
        version: EXPORT_VERSION.to_string(),
        data,
    })
}

/// Decodes `document` into a snapshot without touching any store.
///
/// Unknown table names are skipped with a warning. Numeric ids written by
/// older versions are accepted and stored as strings.
pub fn decode_document(document: &ExportDocument) -> Result<Snapshot> {
    if !SUPPORTED_VERSIONS.contains(&document.version.as_str()) {
        msg_bail_anyhow!(Message::BackupVersionUnsupported(document.version.clone()));
    }

    let mut snapshot = Snapshot::new();
    for (name, rows) in &document.data {
        let table: Table = match name.parse() {
            Ok(table) => table,
            Err(_) => {
                msg_warning!(Message::UnknownTable(name.clone()));
                continue;
            }
        };
        let records = rows
            .iter()
            .cloned()
            .map(|mut row| {
                let numeric_id = row.get("id").filter(|id| id.is_number()).and_then(value_as_id);
                if let Some(id) = numeric_id {
                    row["id"] = Value::String(id);
                }
                Record::from_value(table, row)
            })
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("decode table '{}'", table))?;
        snapshot.insert(table, records);
    }
    Ok(snapshot)
}

/// Restores `document` into `store` in one atomic import.
pub fn restore_document(store: &dyn Store, document: &ExportDocument) -> Result<ImportSummary> {
    let snapshot = decode_document(document)?;
    let summary = match store.import_all(&snapshot) {
        Ok(summary) => summary,
        Err(e) => {
            msg_error!(Message::ImportAborted(e.to_string()));
            return Err(e).context("restore backup");
        }
    };
    msg_debug!(Message::ImportCompleted(summary.tables(), summary.records()));
    Ok(summary)
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Sibling of `path` that a document is written to before being renamed into place.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_encoded(path: &Path, gzip: bool, document: &ExportDocument) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, document)?;
        encoder.finish()?.flush()?;
    } else {
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush()?;
    }
    Ok(())
}

/// Writes `document` to `path`. An existing file at `path` is only replaced
/// once the new document has been written completely.
pub fn write_document(path: &Path, document: &ExportDocument) -> Result<()> {
    let tmp = temp_path(path);
    if let Err(e) = write_encoded(&tmp, is_gzip(path), document) {
        if tmp.is_file() {
            let _ = fs::remove_file(&tmp);
        }
        return Err(e);
    }
    fs::rename(&tmp, path).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_document(path: &Path) -> Result<ExportDocument> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let mut raw = String::new();
    reader
        .read_to_string(&mut raw)
        .with_context(|| format!("read {}", path.display()))?;
    let document = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(document)
}

/// `kelasdb-backup-YYYYMMDD-HHMMSS.json`, with `.gz` appended when compressed.
pub fn default_file_name(compress: bool) -> String {
    let name = format!("kelasdb-backup-{}.json", Local::now().format("%Y%m%d-%H%M%S"));
    if compress {
        name + ".gz"
    } else {
        name
    }
}

pub fn default_path(directory: &Path, compress: bool) -> PathBuf {
    directory.join(default_file_name(compress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_uses_camel_case_keys() {
        let document = ExportDocument {
            export_date: "2025-01-15T08:00:00.000Z".to_string(),
            version: EXPORT_VERSION.to_string(),
            data: BTreeMap::new(),
        };
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["exportDate"], json!("2025-01-15T08:00:00.000Z"));
        assert_eq!(value["version"], json!("2.0"));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let document = ExportDocument {
            export_date: String::new(),
            version: "3.0".to_string(),
            data: BTreeMap::new(),
        };
        let error = decode_document(&document).unwrap_err();
        assert!(error.to_string().contains("3.0"));
    }

    #[test]
    fn numeric_ids_and_unknown_tables_are_tolerated() {
        let mut data = BTreeMap::new();
        data.insert("kelas".to_string(), vec![json!({"id": 7, "nama_kelas": "VII A"})]);
        data.insert("tabel_lama".to_string(), vec![json!({"id": "x"})]);
        let document = ExportDocument {
            export_date: String::new(),
            version: "1.0".to_string(),
            data,
        };
        let snapshot = decode_document(&document).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[&Table::Kelas][0].id, "7");
    }

    #[test]
    fn default_file_name_shape() {
        let name = default_file_name(false);
        assert!(name.starts_with("kelasdb-backup-"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "kelasdb-backup-20250115-080000.json".len());
        assert!(default_file_name(true).ends_with(".json.gz"));
    }
}
