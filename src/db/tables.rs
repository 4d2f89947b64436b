//! The closed set of tables the store manages.
//!
//! Table names are part of the on-disk format (SQL table names, export
//! document keys, legacy storage keys), so the string forms below must never
//! change.

use super::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Guru,
    MataPelajaran,
    Kelas,
    Siswa,
    JenisKegiatan,
    Jurnal,
    Kehadiran,
    JenisPenilaian,
    NilaiSiswa,
    JamPelajaran,
    JadwalPelajaran,
    Pengaturan,
    ActivityLog,
    AgendaMengajar,
    CatatanKalender,
    HariLibur,
    PeriodeNonPembelajaran,
    Ekstrakurikuler,
    AnggotaEskul,
    KehadiranEskul,
    NilaiEskul,
    AppSettings,
}

impl Table {
    pub const ALL: [Table; 23] = [
        Table::Users,
        Table::Guru,
        Table::MataPelajaran,
        Table::Kelas,
        Table::Siswa,
        Table::JenisKegiatan,
        Table::Jurnal,
        Table::Kehadiran,
        Table::JenisPenilaian,
        Table::NilaiSiswa,
        Table::JamPelajaran,
        Table::JadwalPelajaran,
        Table::Pengaturan,
        Table::ActivityLog,
        Table::AgendaMengajar,
        Table::CatatanKalender,
        Table::HariLibur,
        Table::PeriodeNonPembelajaran,
        Table::Ekstrakurikuler,
        Table::AnggotaEskul,
        Table::KehadiranEskul,
        Table::NilaiEskul,
        Table::AppSettings,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Guru => "guru",
            Table::MataPelajaran => "mata_pelajaran",
            Table::Kelas => "kelas",
            Table::Siswa => "siswa",
            Table::JenisKegiatan => "jenis_kegiatan",
            Table::Jurnal => "jurnal",
            Table::Kehadiran => "kehadiran",
            Table::JenisPenilaian => "jenis_penilaian",
            Table::NilaiSiswa => "nilai_siswa",
            Table::JamPelajaran => "jam_pelajaran",
            Table::JadwalPelajaran => "jadwal_pelajaran",
            Table::Pengaturan => "pengaturan",
            Table::ActivityLog => "activity_log",
            Table::AgendaMengajar => "agenda_mengajar",
            Table::CatatanKalender => "catatan_kalender",
            Table::HariLibur => "hari_libur",
            Table::PeriodeNonPembelajaran => "periode_non_pembelajaran",
            Table::Ekstrakurikuler => "ekstrakurikuler",
            Table::AnggotaEskul => "anggota_eskul",
            Table::KehadiranEskul => "kehadiran_eskul",
            Table::NilaiEskul => "nilai_eskul",
            Table::AppSettings => "app_settings",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| StoreError::UnknownTable(s.to_string()))
    }
}
