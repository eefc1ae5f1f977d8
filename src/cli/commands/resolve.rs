//! Name resolution commands

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use odata_cli::config::Settings;
use odata_cli::naming::{MatchResolver, SchemaNameMatcher};

#[derive(Args)]
pub struct MatchArgs {
    /// Name as it appears in the service metadata
    pub actual: String,
    /// Name used by the caller
    pub requested: String,
    /// Resolver to use (defaults to the configured one)
    #[arg(short, long)]
    pub resolver: Option<MatchResolver>,
    /// Show the outcome under every resolver
    #[arg(short, long, conflicts_with = "resolver")]
    pub all: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Name used by the caller
    pub requested: String,
    /// Metadata names to resolve against, in priority order
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub candidates: Vec<String>,
    /// Resolver to use (defaults to the configured one)
    #[arg(short, long)]
    pub resolver: Option<MatchResolver>,
}

fn matcher_for(settings: &Settings, resolver: Option<MatchResolver>) -> Result<SchemaNameMatcher> {
    let matcher = settings
        .name_matcher()
        .context("Failed to build name matcher from settings")?;
    Ok(match resolver {
        Some(resolver) => matcher.with_resolver(resolver),
        None => matcher,
    })
}

fn verdict(matched: bool) -> ColoredString {
    if matched {
        "match".green().bold()
    } else {
        "no match".red()
    }
}

pub fn handle_match_command(args: MatchArgs, settings: &Settings) -> Result<()> {
    let matcher = matcher_for(settings, args.resolver)?;

    if args.all {
        for resolver in MatchResolver::all() {
            let matched = matcher.with_resolver(resolver).is_match(&args.actual, &args.requested);
            println!("{:<32} {}", resolver.to_string().cyan(), verdict(matched));
        }
        return Ok(());
    }

    let matched = matcher.is_match(&args.actual, &args.requested);
    println!(
        "{} '{}' vs '{}': {}",
        matcher.resolver().to_string().cyan(),
        args.actual,
        args.requested,
        verdict(matched)
    );
    Ok(())
}

pub fn handle_resolve_command(args: ResolveArgs, settings: &Settings) -> Result<()> {
    let matcher = matcher_for(settings, args.resolver)?;

    match matcher.resolve(&args.candidates, &args.requested) {
        Ok(found) => {
            println!("{} -> {}", args.requested, found.green().bold());
            Ok(())
        }
        Err(err) => {
            if !err.suggestions.is_empty() {
                println!("{}", "Closest names:".dimmed());
                for suggestion in &err.suggestions {
                    println!("  {}", suggestion.yellow());
                }
            }
            Err(err.into())
        }
    }
}
