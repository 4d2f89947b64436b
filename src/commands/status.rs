use crate::{
    db::{db::Db, tables::Table},
    libs::{config::Config, messages::Message, view::View},
    msg_print,
};
use anyhow::Result;

pub fn cmd() -> Result<()> {
    let path = Config::read()?.database_path()?;
    let db = Db::new()?;

    msg_print!(Message::StatusHeader(path.display().to_string()), true);
    let counts: Vec<(Table, usize)> = Table::ALL
        .iter()
        .map(|&table| (table, db.store().select_lenient(table, None).len()))
        .collect();
    View::table_counts(&counts);

    Ok(())
}
