use crate::{
    db::db::Db,
    libs::{
        backup::{default_path, export_document, read_document, restore_document, write_document},
        config::Config,
        messages::Message,
    },
    msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    command: BackupCommand,
}

#[derive(Debug, Subcommand)]
enum BackupCommand {
    /// Write every table to a backup file
    Export {
        /// Target file; a `.gz` extension compresses the output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Restore every table from a backup file
    Import { path: PathBuf },
}

pub fn cmd(args: BackupArgs) -> Result<()> {
    let db = Db::new()?;

    match args.command {
        BackupCommand::Export { output } => {
            let path = match output {
                Some(path) => path,
                None => {
                    let config = Config::read()?;
                    default_path(&config.backup_dir()?, config.backup().compress)
                }
            };
            write_document(&path, &export_document(db.store())?)?;
            msg_success!(Message::BackupWritten(path.display().to_string()));
        }
        BackupCommand::Import { path } => {
            let summary = restore_document(db.store(), &read_document(&path)?)?;
            msg_success!(Message::BackupRestored(summary.records()));
        }
    }

    Ok(())
}
