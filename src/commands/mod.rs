pub mod backup;
pub mod init;
pub mod legacy;
pub mod migrations;
pub mod settings;
pub mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Show record counts for every table")]
    Status,
    #[command(about = "Read and write application settings", arg_required_else_help = true)]
    Settings(settings::SettingsArgs),
    #[command(about = "Inspect and run data migrations", arg_required_else_help = true)]
    Migrations(migrations::MigrationsArgs),
    #[command(about = "Export or restore a full backup", arg_required_else_help = true)]
    Backup(backup::BackupArgs),
    #[command(about = "Import data from the legacy storage", arg_required_else_help = true)]
    Legacy(legacy::LegacyArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init(args) => init::cmd(args),
            Commands::Status => status::cmd(),
            Commands::Settings(args) => settings::cmd(args),
            Commands::Migrations(args) => migrations::cmd(args),
            Commands::Backup(args) => backup::cmd(args),
            Commands::Legacy(args) => legacy::cmd(args),
        }
    }
}
