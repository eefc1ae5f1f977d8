use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use odata_cli::config::Settings;
use std::path::Path;
use tokio_util::sync::CancellationToken;

mod cli;

use cli::{Cli, Commands};

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();

    if let Some(path) = log_file {
        // Truncate on each run
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;
    info!("Starting odata-cli");

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Match(args) => cli::commands::handle_match_command(args, &settings),
        Commands::Resolve(args) => cli::commands::handle_resolve_command(args, &settings),
        Commands::Request(args) => {
            cli::commands::handle_request_command(args, &settings, cancel).await
        }
        Commands::Settings(args) => {
            cli::commands::handle_settings_command(args, settings, cli.config)
        }
    }
}
