use crate::db::tables::Table as StoreTable;
use prettytable::{row, Table};
use serde_json::Value;
use std::collections::BTreeMap;

pub struct View {}

impl View {
    pub fn table_counts(counts: &[(StoreTable, usize)]) {
        let mut table = Table::new();

        table.add_row(row!["TABLE", "RECORDS"]);
        for (name, count) in counts {
            table.add_row(row![name, count]);
        }
        table.add_row(row!["TOTAL", counts.iter().map(|(_, count)| count).sum::<usize>()]);
        table.printstd();
    }

    pub fn settings(settings: &BTreeMap<String, Value>) {
        let mut table = Table::new();

        table.add_row(row!["KEY", "VALUE"]);
        for (key, value) in settings {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            table.add_row(row![key, value]);
        }
        table.printstd();
    }

    pub fn migrations(history: &[(u32, String, String)]) {
        let mut table = Table::new();

        table.add_row(row!["VERSION", "NAME", "APPLIED AT"]);
        for (version, name, applied_at) in history {
            table.add_row(row![format!("v{}", version), name, applied_at]);
        }
        table.printstd();
    }
}
