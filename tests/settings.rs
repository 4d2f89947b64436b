#[cfg(test)]
mod tests {
    use kelasdb::db::{
        entities::Setting,
        settings::{keys, Settings, SETTINGS_TABLE},
        sqlite::{SqliteStore, DEFAULT_BUSY_TIMEOUT},
        store::Store,
    };
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct SettingsContext {
        _temp_dir: TempDir,
        store: Arc<SqliteStore>,
        settings: Settings,
    }

    impl TestContext for SettingsContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let store = Arc::new(SqliteStore::open(&temp_dir.path().join("settings.db"), DEFAULT_BUSY_TIMEOUT).unwrap());
            store.ensure_schema().unwrap();
            let settings = Settings::new(store.clone());
            SettingsContext {
                _temp_dir: temp_dir,
                store,
                settings,
            }
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PdfFormat {
        paper: String,
        margin_mm: u32,
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_get_missing_key_is_none(ctx: &mut SettingsContext) {
        assert_eq!(ctx.settings.get("tidak_ada").unwrap(), None);
        assert_eq!(ctx.settings.get_or("tidak_ada", json!("bawaan")), json!("bawaan"));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_string_values_are_stored_raw(ctx: &mut SettingsContext) {
        ctx.settings.set(keys::ACTIVE_ACADEMIC_YEAR, "2025/2026", None).unwrap();

        let rows = ctx.settings.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].setting_value, "2025/2026");
        assert_eq!(ctx.settings.get(keys::ACTIVE_ACADEMIC_YEAR).unwrap(), Some(json!("2025/2026")));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_structured_values_round_trip(ctx: &mut SettingsContext) {
        let format = PdfFormat {
            paper: "A4".to_string(),
            margin_mm: 20,
        };
        ctx.settings.set(keys::PDF_FORMAT, &format, Some("Format cetak")).unwrap();
        ctx.settings.set(keys::WORKDAYS, &json!(["senin", "selasa", "rabu"]), None).unwrap();

        assert_eq!(ctx.settings.get_as::<PdfFormat>(keys::PDF_FORMAT).unwrap(), Some(format));
        assert_eq!(ctx.settings.get(keys::WORKDAYS).unwrap(), Some(json!(["senin", "selasa", "rabu"])));

        let rows: Vec<Setting> = ctx.settings.rows().unwrap();
        let pdf = rows.iter().find(|row| row.setting_key == keys::PDF_FORMAT).unwrap();
        assert_eq!(pdf.description.as_deref(), Some("Format cetak"));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_set_twice_keeps_one_row(ctx: &mut SettingsContext) {
        ctx.settings.set(keys::ACTIVE_SEMESTER, "ganjil", None).unwrap();
        ctx.settings.set(keys::ACTIVE_SEMESTER, "genap", None).unwrap();

        assert_eq!(ctx.store.count(SETTINGS_TABLE, None).unwrap(), 1);
        assert_eq!(ctx.settings.get(keys::ACTIVE_SEMESTER).unwrap(), Some(json!("genap")));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_concurrent_set_never_duplicates(ctx: &mut SettingsContext) {
        let settings = Arc::new(Settings::new(ctx.store.clone()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let settings = Arc::clone(&settings);
                thread::spawn(move || settings.set(keys::QUICK_MENU, &json!({"slot": i}), None).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ctx.store.count(SETTINGS_TABLE, None).unwrap(), 1);
        let value = ctx.settings.get(keys::QUICK_MENU).unwrap().unwrap();
        assert!(value["slot"].as_u64().unwrap() < 8);
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_delete_removes_key_and_cache(ctx: &mut SettingsContext) {
        ctx.settings.set(keys::BACKUP_SCHEDULE, "mingguan", None).unwrap();
        assert_eq!(ctx.settings.cached(keys::BACKUP_SCHEDULE), Some(json!("mingguan")));

        assert!(ctx.settings.delete(keys::BACKUP_SCHEDULE).unwrap());
        assert!(!ctx.settings.delete(keys::BACKUP_SCHEDULE).unwrap());
        assert_eq!(ctx.settings.get(keys::BACKUP_SCHEDULE).unwrap(), None);
        assert_eq!(ctx.settings.cached(keys::BACKUP_SCHEDULE), None);
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_get_all_and_warm_cache(ctx: &mut SettingsContext) {
        ctx.settings.set(keys::ACTIVE_SEMESTER, "ganjil", None).unwrap();
        ctx.settings.set(keys::WORKDAYS, &json!(5), None).unwrap();

        let fresh = Settings::new(ctx.store.clone());
        assert_eq!(fresh.cached(keys::ACTIVE_SEMESTER), None);
        assert_eq!(fresh.warm().unwrap(), 2);
        assert_eq!(fresh.cached(keys::WORKDAYS), Some(json!(5)));

        let all = fresh.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[keys::ACTIVE_SEMESTER], json!("ganjil"));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_numeric_looking_text_decodes_as_number(ctx: &mut SettingsContext) {
        ctx.settings.set("kode_sekolah", "123", None).unwrap();
        assert_eq!(ctx.settings.get("kode_sekolah").unwrap(), Some(json!(123)));
    }

    #[test_context(SettingsContext)]
    #[test]
    fn test_cache_after_set_matches_stored_value(ctx: &mut SettingsContext) {
        ctx.settings.set("kode_sekolah", "123", None).unwrap();
        ctx.settings.set(keys::QUICK_MENU, "[\"jurnal\"]", None).unwrap();
        ctx.settings.set(keys::ACTIVE_SEMESTER, "ganjil", None).unwrap();

        for key in ["kode_sekolah", keys::QUICK_MENU, keys::ACTIVE_SEMESTER] {
            let cached = ctx.settings.cached(key);
            assert_eq!(cached, ctx.settings.get(key).unwrap(), "{key}");
            assert_eq!(cached, ctx.settings.cached(key), "{key}");
        }
        assert_eq!(ctx.settings.cached("kode_sekolah"), Some(json!(123)));
        assert_eq!(ctx.settings.cached(keys::QUICK_MENU), Some(json!(["jurnal"])));

        let fresh = Settings::new(ctx.store.clone());
        fresh.warm().unwrap();
        assert_eq!(fresh.cached("kode_sekolah"), ctx.settings.cached("kode_sekolah"));
    }
}
