use crate::{
    db::{
        db::Db,
        settings::{decode, encode},
    },
    libs::{messages::Message, view::View},
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    /// Print one setting
    Get { key: String },
    /// Store a setting; JSON values are kept as JSON, anything else as text
    Set {
        key: String,
        value: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Remove a setting
    Delete { key: String },
    /// Print every setting
    List,
}

pub fn cmd(args: SettingsArgs) -> Result<()> {
    let db = Db::new()?;
    let settings = db.settings();

    match args.command {
        SettingsCommand::Get { key } => match settings.get(&key)? {
            Some(value) => msg_print!(Message::SettingValue(key, encode(&value))),
            None => msg_info!(Message::SettingNotFound(key)),
        },
        SettingsCommand::Set { key, value, description } => {
            settings.set(&key, &decode(&value), description.as_deref())?;
            msg_success!(Message::SettingSaved(key));
        }
        SettingsCommand::Delete { key } => {
            if settings.delete(&key)? {
                msg_success!(Message::SettingDeleted(key));
            } else {
                msg_info!(Message::SettingNotFound(key));
            }
        }
        SettingsCommand::List => {
            msg_print!(Message::SettingsHeader, true);
            View::settings(&settings.get_all()?);
        }
    }

    Ok(())
}
