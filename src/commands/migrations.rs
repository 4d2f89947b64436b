use crate::{
    db::{db::Db, migrations::MigrationManager},
    libs::{messages::Message, view::View},
    msg_info, msg_print,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Show whether data migrations are pending
    Status,
    /// Show applied migrations in the order they ran
    History,
    /// Run pending migrations now
    Run,
    /// Mark migrations from VERSION on as pending again
    #[cfg(debug_assertions)]
    Rollback { version: u32 },
}

pub fn cmd(args: MigrationsArgs) -> Result<()> {
    let db = Db::new()?;
    let manager = MigrationManager::new();

    match args.command {
        MigrationsCommand::Status => {
            let pending = manager.pending(db.settings())?;
            if pending.is_empty() {
                msg_info!(Message::DatabaseUpToDate);
            } else {
                msg_info!(Message::DatabaseNeedsUpdate(pending.len()));
            }
        }
        MigrationsCommand::History => {
            msg_print!(Message::MigrationHistory, true);
            View::migrations(&manager.get_migration_history(db.settings())?);
        }
        MigrationsCommand::Run => {
            let report = manager.run_migrations(db.settings());
            if report.applied.is_empty() && report.failed.is_empty() {
                msg_info!(Message::DatabaseUpToDate);
            }
        }
        #[cfg(debug_assertions)]
        MigrationsCommand::Rollback { version } => manager.rollback_to(db.settings(), version)?,
    }

    Ok(())
}
