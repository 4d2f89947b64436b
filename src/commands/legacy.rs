use crate::{
    db::{
        db::Db,
        legacy::{JsonFileStorage, LegacyImporter},
    },
    libs::{config::Config, messages::Message},
    msg_info,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct LegacyArgs {
    #[command(subcommand)]
    command: LegacyCommand,
}

#[derive(Debug, Subcommand)]
enum LegacyCommand {
    /// Check whether legacy data is waiting to be imported
    Status,
    /// Import legacy tables into empty store tables
    Migrate,
    /// Put the pre-import snapshot back into legacy storage
    Restore,
    /// Remove all legacy storage entries
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn cmd(args: LegacyArgs) -> Result<()> {
    let db = Db::new()?;
    let legacy = JsonFileStorage::open(&Config::read()?.legacy_path()?)?;
    let importer = LegacyImporter::new(db.settings(), &legacy);

    match args.command {
        LegacyCommand::Status => {
            if importer.is_migration_needed()? {
                msg_info!(Message::LegacyDataFound);
            } else {
                msg_info!(Message::LegacyNothingToMigrate);
            }
        }
        LegacyCommand::Migrate => {
            importer.migrate_data()?;
        }
        LegacyCommand::Restore => {
            importer.restore_from_backup()?;
        }
        LegacyCommand::Clear { yes } => {
            let confirmed = yes
                || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(Message::PromptConfirmLegacyClear.to_string())
                    .default(false)
                    .interact()?;
            if confirmed {
                importer.clear_legacy_data()?;
            } else {
                msg_info!(Message::OperationCancelled);
            }
        }
    }

    Ok(())
}
