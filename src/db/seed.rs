//! Default reference data inserted into empty tables on first start.

use super::entities::{to_fields, Entity, JenisKegiatan, JenisPenilaian};
use super::record::Fields;
use super::store::{Store, StoreResult};
use super::tables::Table;
use crate::libs::messages::Message;
use crate::msg_debug;

const DEFAULT_JENIS_KEGIATAN: [(&str, &str); 5] = [
    ("Mengajar", "Kegiatan belajar mengajar di kelas"),
    ("Rapat", "Rapat dinas atau koordinasi guru"),
    ("Upacara", "Upacara bendera dan peringatan hari besar"),
    ("Piket", "Tugas piket harian sekolah"),
    ("Pembinaan", "Pembinaan dan bimbingan siswa"),
];

const DEFAULT_JENIS_PENILAIAN: [(&str, u32); 4] = [
    ("Tugas", 20),
    ("Ulangan Harian", 30),
    ("PTS", 20),
    ("PAS", 30),
];

/// Inserts `rows` only when `table` has no records at all. Returns how many were inserted.
pub fn seed_if_empty(store: &dyn Store, table: Table, rows: Vec<Fields>) -> StoreResult<usize> {
    let existing = store.count(table, None)?;
    if existing > 0 {
        msg_debug!(Message::SeedSkipped(table.to_string(), existing));
        return Ok(0);
    }

    let inserted = rows.len();
    for row in rows {
        store.insert(table, row)?;
    }
    msg_debug!(Message::SeedInserted(table.to_string(), inserted));
    Ok(inserted)
}

pub fn default_jenis_kegiatan() -> StoreResult<Vec<Fields>> {
    DEFAULT_JENIS_KEGIATAN
        .iter()
        .map(|(nama, deskripsi)| {
            to_fields(&JenisKegiatan {
                nama_kegiatan: nama.to_string(),
                deskripsi: Some(deskripsi.to_string()),
            })
        })
        .collect()
}

pub fn default_jenis_penilaian() -> StoreResult<Vec<Fields>> {
    DEFAULT_JENIS_PENILAIAN
        .iter()
        .map(|(nama, bobot)| {
            to_fields(&JenisPenilaian {
                nama_penilaian: nama.to_string(),
                bobot: Some(*bobot),
            })
        })
        .collect()
}

/// Seeds every reference table. Returns the total number of rows inserted.
pub fn seed_defaults(store: &dyn Store) -> StoreResult<usize> {
    let mut inserted = seed_if_empty(store, JenisKegiatan::TABLE, default_jenis_kegiatan()?)?;
    inserted += seed_if_empty(store, JenisPenilaian::TABLE, default_jenis_penilaian()?)?;
    Ok(inserted)
}
