#[cfg(test)]
mod tests {
    use kelasdb::db::{
        db::Db,
        entities::{JenisPenilaian, Kelas, Siswa, Stored, TypedStore},
        legacy::{legacy_key, LegacyImporter, LegacyStorage, MemoryLegacyStorage},
        memory::MemoryStore,
        settings::keys,
        sqlite::DEFAULT_BUSY_TIMEOUT,
        store::Store,
        tables::Table,
    };
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct StartupContext {
        _temp_dir: TempDir,
        path: PathBuf,
    }

    impl TestContext for StartupContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let path = temp_dir.path().join("kelasdb.db");
            StartupContext {
                _temp_dir: temp_dir,
                path,
            }
        }
    }

    #[test_context(StartupContext)]
    #[test]
    fn test_first_start_seeds_and_migrates(ctx: &mut StartupContext) {
        let db = Db::open(&ctx.path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let report = db.report();

        assert_eq!(report.seeded, 9);
        assert_eq!(report.migrations.applied.len(), 3);
        assert!(report.migrations.failed.is_empty());
        assert!(!report.legacy_pending);

        let penilaian: Vec<Stored<JenisPenilaian>> = db.store().select_entities().unwrap();
        let total: u32 = penilaian.iter().filter_map(|p| p.data.bobot).sum();
        assert_eq!(total, 100);
    }

    #[test_context(StartupContext)]
    #[test]
    fn test_restart_is_idempotent(ctx: &mut StartupContext) {
        {
            let db = Db::open(&ctx.path, DEFAULT_BUSY_TIMEOUT).unwrap();
            db.settings().set(keys::ACTIVE_SEMESTER, "genap", None).unwrap();
        }

        let db = Db::open(&ctx.path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let report = db.report();
        assert_eq!(report.seeded, 0);
        assert!(report.migrations.applied.is_empty());
        assert_eq!(report.settings_cached, 2);
        assert_eq!(db.settings().cached(keys::ACTIVE_SEMESTER), Some(json!("genap")));
        assert_eq!(db.store().count(Table::JenisKegiatan, None).unwrap(), 5);
    }

    #[test_context(StartupContext)]
    #[test]
    fn test_typed_entities_share_tables_with_raw_records(ctx: &mut StartupContext) {
        let db = Db::open(&ctx.path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let kelas = db
            .store()
            .insert_entity(&Kelas {
                nama_kelas: "VIII B".to_string(),
                tingkat: Some("8".to_string()),
                tahun_ajaran: Some("2024/2025".to_string()),
                wali_kelas_id: None,
            })
            .unwrap();
        let siswa = db
            .store()
            .insert_entity(&Siswa {
                nis: "2024002".to_string(),
                nama: "Budi".to_string(),
                kelas_id: Some(kelas.id.clone()),
                jenis_kelamin: Some("L".to_string()),
                tanggal_masuk: None,
            })
            .unwrap();

        let raw = db.store().select_by_id(Table::Siswa, &siswa.id).unwrap().unwrap();
        assert_eq!(raw.str_field("kelas_id"), Some(kelas.id.as_str()));

        let mut renamed = siswa.data.clone();
        renamed.nama = "Budi Santoso".to_string();
        let updated = db.store().update_entity(&siswa.id, &renamed).unwrap();
        assert_eq!(updated.data.nama, "Budi Santoso");
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn test_legacy_data_is_reported_not_imported() {
        let legacy = MemoryLegacyStorage::new();
        legacy
            .set(&legacy_key(Table::Guru), &json!([{"id": 1, "nama": "Bu Sari"}]).to_string())
            .unwrap();

        let db = Db::from_store(Arc::new(MemoryStore::new()), Some(&legacy)).unwrap();

        assert!(db.report().legacy_pending);
        assert_eq!(db.store().count(Table::Guru, None).unwrap(), 0);
    }

    #[test]
    fn test_legacy_tables_shadowed_by_seed_are_reported() {
        let legacy = MemoryLegacyStorage::new();
        legacy
            .set(&legacy_key(Table::Guru), &json!([{"id": 1, "nama": "Bu Sari"}]).to_string())
            .unwrap();
        legacy
            .set(&legacy_key(Table::JenisKegiatan), &json!([{"id": 9, "nama": "Kemah"}]).to_string())
            .unwrap();
        let store = Arc::new(MemoryStore::new());

        let db = Db::from_store(store.clone(), Some(&legacy)).unwrap();
        assert!(db.report().legacy_pending);
        assert_eq!(db.report().legacy_skipped, vec![Table::JenisKegiatan]);

        let report = LegacyImporter::new(db.settings(), &legacy).migrate_data().unwrap();
        assert_eq!(report.skipped, vec![Table::JenisKegiatan]);
        assert_eq!(db.store().count(Table::JenisKegiatan, None).unwrap(), 5);

        let restarted = Db::from_store(store, Some(&legacy)).unwrap();
        assert!(!restarted.report().legacy_pending);
        assert!(restarted.report().legacy_skipped.is_empty());
    }
}
