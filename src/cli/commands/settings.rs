use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use odata_cli::config::Settings;
use odata_cli::naming::MatchResolver;
use std::path::PathBuf;

#[derive(Args)]
pub struct SettingsCommands {
    #[command(subcommand)]
    pub command: SettingsSubcommands,
}

#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Show current settings
    Show,
    /// Print the settings file location
    Path,
    /// Change the default name resolver
    SetResolver {
        /// strict, strict-case-insensitive, alphanumeric, alphanumeric-case-insensitive or not-strict
        resolver: MatchResolver,
    },
}

pub fn handle_settings_command(
    args: SettingsCommands,
    mut settings: Settings,
    path: Option<PathBuf>,
) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Settings::get_config_path()?,
    };

    match args.command {
        SettingsSubcommands::Show => {
            let rendered =
                toml::to_string_pretty(&settings).context("Failed to render settings")?;
            println!("{}", format!("# {}", path.display()).dimmed());
            println!("{}", rendered);
        }
        SettingsSubcommands::Path => {
            println!("{}", path.display());
        }
        SettingsSubcommands::SetResolver { resolver } => {
            settings.set_resolver(resolver);
            settings.save_to(&path)?;
            println!("{} {}", "Resolver set to".green(), resolver.to_string().bold());
        }
    }

    Ok(())
}
