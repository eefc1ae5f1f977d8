use super::commands::request::RequestArgs;
use super::commands::resolve::{MatchArgs, ResolveArgs};
use super::commands::settings::SettingsCommands;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odata-cli")]
#[command(about = "Send OData requests and check how schema names resolve")]
#[command(version)]
pub struct Cli {
    /// Write logs to this file instead of stderr (filter with RUST_LOG)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Use this settings file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a metadata name matches a requested name
    Match(MatchArgs),
    /// Pick the metadata name a requested name resolves to
    Resolve(ResolveArgs),
    /// Execute a single request against the service
    Request(RequestArgs),
    /// Application settings management
    Settings(SettingsCommands),
}
