#[cfg(test)]
mod tests {
    use kelasdb::db::{
        memory::MemoryStore,
        record::{fields, Record},
        sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT},
        store::{Snapshot, Store, StoreError},
        tables::Table,
    };
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    /// Both backends over a fresh schema; the SQLite one lives in a temp dir.
    struct StoreContext {
        _temp_dir: TempDir,
        backends: Vec<(&'static str, Arc<dyn Store>)>,
    }

    impl TestContext for StoreContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let sqlite = SqliteStore::open(&temp_dir.path().join("store.db"), DEFAULT_BUSY_TIMEOUT).unwrap();
            let backends: Vec<(&'static str, Arc<dyn Store>)> =
                vec![("sqlite", Arc::new(sqlite)), ("memory", Arc::new(MemoryStore::new()))];
            for (_, store) in &backends {
                store.ensure_schema().unwrap();
            }
            StoreContext {
                _temp_dir: temp_dir,
                backends,
            }
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_insert_assigns_id_and_created_at(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let a = store.insert(Table::Siswa, fields(json!({"nama": "Ani", "id": "mine"}))).unwrap();
            let b = store.insert(Table::Siswa, fields(json!({"nama": "Budi"}))).unwrap();

            assert_ne!(a.id, "mine", "{name}");
            assert_ne!(a.id, b.id, "{name}");
            assert!(a.created_at.ends_with('Z'), "{name}");
            assert!(a.updated_at.is_none(), "{name}");
            assert_eq!(store.select_by_id(Table::Siswa, &a.id).unwrap(), Some(a), "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_update_merges_fields_and_keeps_identity(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let kelas = store
                .insert(Table::Kelas, fields(json!({"nama_kelas": "VII A", "tingkat": "7"})))
                .unwrap();
            let updated = store
                .update(
                    Table::Kelas,
                    &kelas.id,
                    fields(json!({"nama_kelas": "VII B", "id": "other", "created_at": "1999"})),
                )
                .unwrap();

            assert_eq!(updated.id, kelas.id, "{name}");
            assert_eq!(updated.created_at, kelas.created_at, "{name}");
            assert!(updated.updated_at.is_some(), "{name}");
            assert_eq!(updated.str_field("nama_kelas"), Some("VII B"), "{name}");
            assert_eq!(updated.str_field("tingkat"), Some("7"), "{name}");

            let stored = store.select_by_id(Table::Kelas, &kelas.id).unwrap().unwrap();
            assert_eq!(stored, updated, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_update_missing_record_is_not_found(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let result = store.update(Table::Guru, "tidak-ada", fields(json!({"nama": "X"})));
            assert!(matches!(result, Err(StoreError::NotFound { table: Table::Guru, .. })), "{name}");
            assert_eq!(store.count(Table::Guru, None).unwrap(), 0, "{name}");
        }
    }

    #[test]
    fn test_missing_schema_is_table_missing_on_both_backends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backends: Vec<(&str, Arc<dyn Store>)> = vec![
            (
                "sqlite",
                Arc::new(SqliteStore::open(&temp_dir.path().join("kosong.db"), DEFAULT_BUSY_TIMEOUT).unwrap()),
            ),
            ("memory", Arc::new(MemoryStore::new())),
        ];
        for (name, store) in &backends {
            assert!(
                matches!(store.select(Table::Guru, None), Err(StoreError::TableMissing(Table::Guru))),
                "{name}"
            );
            assert!(
                matches!(
                    store.insert(Table::Guru, fields(json!({"nama": "Bu Sari"}))),
                    Err(StoreError::TableMissing(Table::Guru))
                ),
                "{name}"
            );
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_delete_is_idempotent(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let guru = store.insert(Table::Guru, fields(json!({"nama": "Pak Budi"}))).unwrap();
            store.delete(Table::Guru, &guru.id).unwrap();
            store.delete(Table::Guru, &guru.id).unwrap();
            assert_eq!(store.select_by_id(Table::Guru, &guru.id).unwrap(), None, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_select_with_filter_and_count(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            for (nama, kelas_id) in [("Ani", "k1"), ("Budi", "k1"), ("Citra", "k2")] {
                store
                    .insert(Table::Siswa, fields(json!({"nama": nama, "kelas_id": kelas_id})))
                    .unwrap();
            }
            let in_k1 = |record: &Record| record.str_field("kelas_id") == Some("k1");

            assert_eq!(store.select(Table::Siswa, Some(&in_k1)).unwrap().len(), 2, "{name}");
            assert_eq!(store.count(Table::Siswa, Some(&in_k1)).unwrap(), 2, "{name}");
            assert_eq!(store.count(Table::Siswa, None).unwrap(), 3, "{name}");

            store.clear(Table::Siswa).unwrap();
            assert_eq!(store.count(Table::Siswa, None).unwrap(), 0, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_upsert_by_field_updates_existing_row(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let key = json!("semester_aktif");
            let first = store
                .upsert_by_field(Table::AppSettings, "setting_key", &key, fields(json!({"setting_value": "ganjil"})))
                .unwrap();
            let second = store
                .upsert_by_field(Table::AppSettings, "setting_key", &key, fields(json!({"setting_value": "genap"})))
                .unwrap();

            assert_eq!(first.id, second.id, "{name}");
            assert_eq!(second.str_field("setting_value"), Some("genap"), "{name}");
            assert_eq!(store.count(Table::AppSettings, None).unwrap(), 1, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_export_then_import_round_trip(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            store.insert(Table::Kelas, fields(json!({"nama_kelas": "VIII C"}))).unwrap();
            store.insert(Table::Jurnal, fields(json!({"materi": "Pecahan", "jam_ke": 3}))).unwrap();
            let exported = store.export_all().unwrap();
            assert_eq!(exported.len(), Table::ALL.len(), "{name}");

            let target = MemoryStore::new();
            target.ensure_schema().unwrap();
            let summary = target.import_all(&exported).unwrap();

            assert_eq!(summary.records(), 2, "{name}");
            assert_eq!(target.export_all().unwrap(), exported, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_failed_import_changes_nothing(ctx: &mut StoreContext) {
        for (name, store) in &ctx.backends {
            let existing = store.insert(Table::Kelas, fields(json!({"nama_kelas": "IX A"}))).unwrap();

            let mut replaced = existing.clone();
            replaced.fields.insert("nama_kelas".to_string(), json!("diganti"));
            let mut broken = Record::new(fields(json!({"nama": "tanpa id"})));
            broken.id.clear();

            let mut data = Snapshot::new();
            data.insert(Table::Kelas, vec![replaced]);
            data.insert(Table::Siswa, vec![broken]);

            assert!(matches!(store.import_all(&data), Err(StoreError::ImportFailed { .. })), "{name}");
            assert_eq!(store.select_by_id(Table::Kelas, &existing.id).unwrap(), Some(existing.clone()), "{name}");
            assert_eq!(store.count(Table::Siswa, None).unwrap(), 0, "{name}");
        }
    }

    #[test_context(StoreContext)]
    #[test]
    fn test_sqlite_data_survives_reopen(ctx: &mut StoreContext) {
        let path = ctx._temp_dir.path().join("reopen.db");
        let id = {
            let store = SqliteStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
            store.ensure_schema().unwrap();
            store.insert(Table::Users, fields(json!({"username": "admin"}))).unwrap().id
        };

        let store = SqliteStore::open(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        store.ensure_schema().unwrap();
        let user = store.select_by_id(Table::Users, &id).unwrap().unwrap();
        assert_eq!(user.str_field("username"), Some("admin"));
    }
}
